// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: an ordered sequence of draw items for one frame.

use alloc::vec::Vec;
use std::sync::Arc;

use kurbo::Rect;
use strata_core::backing_store::TileId;
use strata_core::id::LayerId;
use strata_core::layer::{ContentsBufferProxy, NativeImage};
use strata_core::properties::Color;
use strata_core::tile_buffer::TileBuffer;
use strata_core::transform::Transform3d;

use crate::bsp::{ClipPath, ClipVertexBuffer};

/// Painted pixels covering part of one tile.
#[derive(Clone, Debug)]
pub struct TileQuad {
    /// The tile the pixels belong to.
    pub tile: TileId,
    /// Destination in layer coordinates.
    pub rect: Rect,
    /// The pixels.
    pub buffer: Arc<TileBuffer>,
}

/// What a render item draws.
#[derive(Clone, Debug)]
pub enum ItemContent {
    /// Backing store tiles, in upload order.
    Tiles(Vec<TileQuad>),
    /// A solid color filling the contents rectangle.
    SolidColor(Color),
    /// A decoded image stretched over the contents rectangle.
    Image(Arc<NativeImage>),
    /// Externally produced frames (video, canvas).
    External(Arc<dyn ContentsBufferProxy>),
    /// A border stroked inside the layer bounds.
    DebugBorder {
        /// Stroke color.
        color: Color,
        /// Stroke width in pixels.
        width: f32,
    },
}

/// A single draw command in the render plan.
///
/// Items are produced in back-to-front order.
#[derive(Clone, Debug)]
pub struct RenderItem {
    /// The layer this item originates from.
    pub layer_id: LayerId,
    /// What to draw.
    pub content: ItemContent,
    /// Where to draw it, in layer coordinates.
    pub rect: Rect,
    /// Layer coordinates to surface coordinates.
    pub to_surface: Transform3d,
    /// Effective opacity (accumulated from ancestors).
    pub opacity: f32,
    /// Clip outline in layer coordinates, for pieces of split 3D layers.
    pub clip: Option<ClipPath>,
}

/// An ordered list of draw commands for a single frame.
///
/// Backends translate this into native compositor operations or GPU draw
/// calls depending on their rendering strategy.
#[derive(Clone, Debug, Default)]
pub struct RenderPlan {
    /// Draw items in back-to-front order.
    pub items: Vec<RenderItem>,
    /// Clip vertices referenced by the items' clip paths.
    pub clip_vertices: ClipVertexBuffer,
}

impl RenderPlan {
    /// Creates an empty render plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.items.clear();
        self.clip_vertices.clear();
    }

    /// Layers of the items in paint order, repeats included.
    pub fn layer_order(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.items.iter().map(|item| item.layer_id)
    }
}
