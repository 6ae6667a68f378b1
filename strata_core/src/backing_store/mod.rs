// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tiled backing stores.
//!
//! A [`BackingStoreProxy`] covers a layer's visible area (plus look-ahead) with
//! fixed-size tiles in scaled pixel space, tracks which parts of each tile are
//! stale, and asks a [`TilePainter`] for fresh buffers. The resulting tile
//! creations, removals and buffer updates accumulate in a
//! [`BackingStoreUpdate`] that the render thread takes.

mod proxy;
mod tile;

use alloc::vec::Vec;
use std::sync::Arc;

use bitflags::bitflags;

use crate::geometry::IntRect;
use crate::tile_buffer::TileBuffer;

pub use proxy::BackingStoreProxy;
pub use tile::{TileId, TileIndex};

bitflags! {
    /// Outcome of [`BackingStoreProxy::update_if_needed`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct UpdateResult: u8 {
        /// Tiles were created, removed or repainted.
        const TILES_CHANGED = 1 << 0;
        /// At least one tile received a new buffer.
        const BUFFERS_CHANGED = 1 << 1;
        /// Dirty tiles remain unpainted; run another update next cycle.
        const TILES_PENDING = 1 << 2;
    }
}

/// Source of tile pixels.
pub trait TilePainter {
    /// Paints `dirty_rect` (scaled pixels) into a new buffer of its size.
    ///
    /// `None` means no buffer could be produced this cycle.
    fn paint(&self, dirty_rect: IntRect) -> Option<Arc<TileBuffer>>;
}

/// A tile that appeared since the last [`take_pending_update`].
///
/// [`take_pending_update`]: BackingStoreProxy::take_pending_update
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileCreation {
    /// The new tile.
    pub id: TileId,
    /// Its rectangle in scaled pixels.
    pub rect: IntRect,
}

/// New pixels for part of a tile.
#[derive(Clone, Debug)]
pub struct TileContentsUpdate {
    /// The tile receiving the pixels.
    pub id: TileId,
    /// The tile's rectangle in scaled pixels.
    pub tile_rect: IntRect,
    /// The painted rectangle in scaled pixels; the buffer has its size.
    pub dirty_rect: IntRect,
    /// The painted pixels. May still be painting.
    pub buffer: Arc<TileBuffer>,
}

/// Changes accumulated since the render thread last took them.
#[derive(Clone, Debug, Default)]
pub struct BackingStoreUpdate {
    /// Contents scale the tiles are painted at.
    pub contents_scale: f32,
    /// Tiles to create.
    pub tiles_to_create: Vec<TileCreation>,
    /// Tiles to drop.
    pub tiles_to_remove: Vec<TileId>,
    /// Buffers to upload, in paint order.
    pub tiles_to_update: Vec<TileContentsUpdate>,
}

impl BackingStoreUpdate {
    /// Returns `true` if there is nothing to apply.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles_to_create.is_empty()
            && self.tiles_to_remove.is_empty()
            && self.tiles_to_update.is_empty()
    }

    /// Forgets a tile. A tile created and removed between two takes never
    /// reaches the render thread.
    fn forget_tile(&mut self, id: TileId) {
        self.tiles_to_update.retain(|u| u.id != id);
        let before = self.tiles_to_create.len();
        self.tiles_to_create.retain(|c| c.id != id);
        if self.tiles_to_create.len() == before {
            self.tiles_to_remove.push(id);
        }
    }
}
