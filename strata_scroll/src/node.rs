// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scrolling node kinds and the state the main thread commits for them.

use std::sync::Arc;

use kurbo::{Point, Rect, Size, Vec2};
use strata_core::id::ScrollingNodeId;
use strata_core::layer::PlatformLayer;

use crate::constraints::{FixedPositionConstraints, StickyPositionConstraints};
use crate::snap::SnapOffsets;

/// The kind of a scrolling node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScrollingNodeType {
    /// The root document's scroller.
    MainFrame,
    /// A scrolling iframe.
    Subframe,
    /// The host of an iframe's scrolling tree; does not scroll itself.
    FrameHosting,
    /// A scrollable overflow area.
    Overflow,
    /// Stand-in for an overflow area in a different part of the layer tree.
    OverflowProxy,
    /// Fixed-position content.
    Fixed,
    /// Sticky-position content.
    Sticky,
    /// Content positioned against a scroller that is not its ancestor.
    Positioned,
    /// A plugin's scroller. Never created by this tree.
    PluginScrolling,
    /// A plugin's host. Never created by this tree.
    PluginHosting,
}

impl ScrollingNodeType {
    /// Returns `true` for kinds that own a scroll position.
    #[must_use]
    pub const fn is_scrolling(self) -> bool {
        matches!(self, Self::MainFrame | Self::Subframe | Self::Overflow)
    }

    /// Returns `true` for frame scrollers.
    #[must_use]
    pub const fn is_frame_scrolling(self) -> bool {
        matches!(self, Self::MainFrame | Self::Subframe)
    }
}

bitflags::bitflags! {
    /// Conditions that force scroll positions to be synchronized with the
    /// main thread.
    ///
    /// While any reason is set, position updates sent to the main thread use
    /// [`ScrollingLayerPositionAction::Set`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SynchronousScrollingReasons: u8 {
        /// The page is forced to scroll on the main thread.
        const FORCED_ON_MAIN_THREAD = 1 << 0;
        /// Slow-repaint objects (for example fixed backgrounds) need a
        /// main-thread repaint per scroll.
        const HAS_SLOW_REPAINT_OBJECTS = 1 << 1;
        /// Viewport-constrained content cannot be composited.
        const HAS_NON_LAYER_VIEWPORT_CONSTRAINED_OBJECTS = 1 << 2;
        /// The document is not ready for threaded scrolling.
        const IS_IMAGE_DOCUMENT = 1 << 3;
        /// A descendant scroller requires synchronous scrolling.
        const DESCENDANT_SCROLLERS_HAVE_SYNCHRONOUS_SCROLLING = 1 << 4;
    }
}

/// How the main thread should apply a scroll position it receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScrollingLayerPositionAction {
    /// Set layer positions exactly, with a scene-graph flush.
    Set,
    /// Set layer positions, allowing rounding.
    SetApproximate,
    /// Record the position without flushing (the scene graph already has it).
    Sync,
}

/// What initiated a scroll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScrollType {
    /// Wheel, gesture or snap animation.
    User,
    /// A script or layout request from the main thread.
    Programmatic,
}

/// Scroll extent of a scrolling node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollGeometry {
    /// Size of the visible scroll port.
    pub scrollable_area_size: Size,
    /// Size of everything that can be scrolled into view.
    pub total_contents_size: Size,
    /// Offset of the scroll origin; non-zero for right-to-left content.
    pub scroll_origin: Point,
}

impl ScrollGeometry {
    /// The smallest reachable scroll position.
    #[must_use]
    pub fn minimum_scroll_position(&self) -> Point {
        Point::ZERO - self.scroll_origin.to_vec2()
    }

    /// The largest reachable scroll position.
    ///
    /// Never smaller than [`minimum_scroll_position`](Self::minimum_scroll_position).
    #[must_use]
    pub fn maximum_scroll_position(&self) -> Point {
        let min = self.minimum_scroll_position();
        let extent = Vec2::new(
            self.total_contents_size.width - self.scrollable_area_size.width,
            self.total_contents_size.height - self.scrollable_area_size.height,
        );
        let max = Point::ZERO + extent - self.scroll_origin.to_vec2();
        Point::new(max.x.max(min.x), max.y.max(min.y))
    }

    /// Clamps `position` into the scrollable range.
    #[must_use]
    pub fn clamp(&self, position: Point) -> Point {
        let min = self.minimum_scroll_position();
        let max = self.maximum_scroll_position();
        Point::new(position.x.clamp(min.x, max.x), position.y.clamp(min.y, max.y))
    }

    /// Returns `true` if either axis can scroll.
    #[must_use]
    pub fn is_scrollable(&self) -> bool {
        self.maximum_scroll_position() != self.minimum_scroll_position()
    }
}

/// Layers of a frame scroller.
///
/// The scrolled contents layer moves with the scroll position; the others
/// are repositioned around it.
#[derive(Clone, Debug, Default)]
pub struct FrameScrollingLayers {
    /// Layer holding the document contents.
    pub root_contents: Option<Arc<PlatformLayer>>,
    /// Layer kept in place while the contents scroll (fixed content parent).
    pub counter_scrolling: Option<Arc<PlatformLayer>>,
    /// Clip below the top content inset.
    pub inset_clip: Option<Arc<PlatformLayer>>,
    /// Shadow drawn around the root contents.
    pub content_shadow: Option<Arc<PlatformLayer>>,
    /// Header banner.
    pub header: Option<Arc<PlatformLayer>>,
    /// Footer banner.
    pub footer: Option<Arc<PlatformLayer>>,
}

/// Frame scroller state beyond the scroll position.
#[derive(Clone, Debug, Default)]
pub struct FrameScrollingData {
    /// Repositioned layers.
    pub layers: FrameScrollingLayers,
    /// The rect fixed content is laid out against.
    pub layout_viewport: Rect,
    /// Obscured inset at the top of the view.
    pub top_content_inset: f64,
    /// Height of the header banner.
    pub header_height: f64,
    /// Height of the footer banner.
    pub footer_height: f64,
}

/// Kind-specific node data.
#[derive(Clone, Debug)]
pub enum NodeData {
    /// A main frame or subframe scroller.
    FrameScrolling(FrameScrollingData),
    /// An iframe host.
    FrameHosting,
    /// An overflow scroller.
    Overflow,
    /// Proxy for an overflow scroller elsewhere in the tree.
    OverflowProxy {
        /// The overflow node whose scroll offset this proxy mirrors.
        overflow: Option<ScrollingNodeId>,
    },
    /// Fixed-position content.
    Fixed(FixedPositionConstraints),
    /// Sticky-position content.
    Sticky(StickyPositionConstraints),
    /// Content positioned against non-ancestor scrollers.
    Positioned {
        /// Overflow nodes whose scroll deltas move this node's layer.
        related_overflow: Vec<ScrollingNodeId>,
        /// Layer position at the last main-thread layout.
        layer_position_at_last_layout: Point,
    },
}

impl NodeData {
    /// Default data for a freshly created node.
    ///
    /// # Panics
    ///
    /// Panics for plugin kinds, which this tree never hosts.
    pub(crate) fn for_type(node_type: ScrollingNodeType) -> Self {
        match node_type {
            ScrollingNodeType::MainFrame | ScrollingNodeType::Subframe => {
                Self::FrameScrolling(FrameScrollingData::default())
            }
            ScrollingNodeType::FrameHosting => Self::FrameHosting,
            ScrollingNodeType::Overflow => Self::Overflow,
            ScrollingNodeType::OverflowProxy => Self::OverflowProxy { overflow: None },
            ScrollingNodeType::Fixed => Self::Fixed(FixedPositionConstraints::default()),
            ScrollingNodeType::Sticky => Self::Sticky(StickyPositionConstraints::default()),
            ScrollingNodeType::Positioned => Self::Positioned {
                related_overflow: Vec::new(),
                layer_position_at_last_layout: Point::ZERO,
            },
            ScrollingNodeType::PluginScrolling | ScrollingNodeType::PluginHosting => {
                panic!("plugin scrolling nodes are not supported: {node_type:?}")
            }
        }
    }
}

/// A batch of main-thread changes to one node.
///
/// `None` fields are left untouched by [`ScrollingTree::commit`].
///
/// [`ScrollingTree::commit`]: crate::ScrollingTree::commit
#[derive(Clone, Debug, Default)]
pub struct NodeCommit {
    /// New scroll extent (scrolling kinds only).
    pub geometry: Option<ScrollGeometry>,
    /// The node's main layer: scrolled contents for frames, scroll container
    /// for overflow, the positioned layer otherwise.
    pub layer: Option<Option<Arc<PlatformLayer>>>,
    /// Frame scroller layers.
    pub frame_layers: Option<FrameScrollingLayers>,
    /// Frame layout viewport.
    pub layout_viewport: Option<Rect>,
    /// Frame top inset, header height and footer height.
    pub frame_insets: Option<(f64, f64, f64)>,
    /// Fixed-position constraints.
    pub fixed_constraints: Option<FixedPositionConstraints>,
    /// Sticky-position constraints.
    pub sticky_constraints: Option<StickyPositionConstraints>,
    /// Overflow node mirrored by a proxy.
    pub proxied_overflow: Option<ScrollingNodeId>,
    /// Overflow nodes related to a positioned node, with its layout position.
    pub related_overflow: Option<(Vec<ScrollingNodeId>, Point)>,
    /// Synchronous scrolling reasons.
    pub synchronous_scrolling_reasons: Option<SynchronousScrollingReasons>,
    /// Snap offsets.
    pub snap_offsets: Option<SnapOffsets>,
    /// A scroll requested by the main thread.
    pub requested_scroll_position: Option<(Point, ScrollType)>,
}
