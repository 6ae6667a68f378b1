// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-field change tracking.
//!
//! Every property of a layer has exactly one bit in [`LayerDelta`]. Setters on
//! [`LayerGuard`](crate::layer::LayerGuard) mark the bit of the field they
//! changed; [`update_contents`](crate::layer::PlatformLayer::update_contents)
//! copies exactly the marked fields into the scene-graph node's pending state,
//! and [`flush_state`](crate::composition::CompositionLayer::flush_state)
//! forwards exactly those fields to the committed state.
//!
//! A few fields share a bit because they are only meaningful together:
//! tile size and phase ([`CONTENTS_TILING`](LayerDelta::CONTENTS_TILING)), the
//! boolean layer flags ([`FLAGS`](LayerDelta::FLAGS)), image store and its
//! visibility ([`IMAGE_BACKING`](LayerDelta::IMAGE_BACKING)), debug border
//! color and width ([`DEBUG_BORDER`](LayerDelta::DEBUG_BORDER)).

use bitflags::bitflags;

bitflags! {
    /// The set of layer fields changed since the last flush.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct LayerDelta: u32 {
        /// Position in the parent's coordinate space.
        const POSITION = 1 << 0;
        /// Anchor point (transform origin).
        const ANCHOR_POINT = 1 << 1;
        /// Layer size.
        const SIZE = 1 << 2;
        /// Bounds origin (scroll offset of the layer's own contents).
        const BOUNDS_ORIGIN = 1 << 3;
        /// Layer transform.
        const TRANSFORM = 1 << 4;
        /// Transform applied to children (perspective).
        const CHILDREN_TRANSFORM = 1 << 5;
        /// Contents rectangle.
        const CONTENTS_RECT = 1 << 6;
        /// Rounded clipping rectangle for contents.
        const CONTENTS_CLIPPING_RECT = 1 << 7;
        /// Contents tile size and phase.
        const CONTENTS_TILING = 1 << 8;
        /// Boolean layer flags.
        const FLAGS = 1 << 9;
        /// Opacity.
        const OPACITY = 1 << 10;
        /// Filter chain.
        const FILTERS = 1 << 11;
        /// Mask layer reference.
        const MASK = 1 << 12;
        /// Replica layer reference.
        const REPLICA = 1 << 13;
        /// Backdrop layer reference.
        const BACKDROP = 1 << 14;
        /// Backdrop filter rectangle.
        const BACKDROP_RECT = 1 << 15;
        /// Running animations.
        const ANIMATIONS = 1 << 16;
        /// Child list.
        const CHILDREN = 1 << 17;
        /// Tiled backing store (created, destroyed or repainted).
        const BACKING_STORE = 1 << 18;
        /// Animated backing store client.
        const ANIMATED_BACKING_STORE_CLIENT = 1 << 19;
        /// Image backing store and its visibility.
        const IMAGE_BACKING = 1 << 20;
        /// Solid contents color.
        const SOLID_COLOR = 1 << 21;
        /// External contents buffer.
        const CONTENT_LAYER = 1 << 22;
        /// Hit-test event region.
        const EVENT_REGION = 1 << 23;
        /// Associated scrolling node.
        const SCROLLING_NODE = 1 << 24;
        /// Debug border color and width.
        const DEBUG_BORDER = 1 << 25;
        /// Repaint counter visibility and count.
        const REPAINT_COUNTER = 1 << 26;
        /// Damage accumulated for the next composite.
        const DAMAGE = 1 << 27;
    }
}

impl LayerDelta {
    /// Fields whose change affects the geometry of the layer or its subtree.
    pub const GEOMETRY: Self = Self::POSITION
        .union(Self::ANCHOR_POINT)
        .union(Self::SIZE)
        .union(Self::BOUNDS_ORIGIN)
        .union(Self::TRANSFORM)
        .union(Self::CHILDREN_TRANSFORM);

    /// Fields whose change alters what the layer presents.
    pub const CONTENT: Self = Self::BACKING_STORE
        .union(Self::IMAGE_BACKING)
        .union(Self::SOLID_COLOR)
        .union(Self::CONTENT_LAYER)
        .union(Self::CONTENTS_RECT)
        .union(Self::CONTENTS_CLIPPING_RECT)
        .union(Self::CONTENTS_TILING);
}
