// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile identity and per-tile dirty tracking.

use alloc::vec::Vec;
use core::fmt;

use crate::geometry::IntRect;

/// Identity of a tile, unique within its backing store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub(crate) u32);

impl TileId {
    /// Returns the raw value (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TileId({})", self.0)
    }
}

/// Grid position of a tile.
///
/// Ordered row-major (`y` first) so iteration over a tile map walks rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileIndex {
    /// Row.
    pub y: i32,
    /// Column.
    pub x: i32,
}

impl TileIndex {
    /// Creates an index.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { y, x }
    }

    /// Full grid cell of this index for square tiles of `tile_size` pixels.
    #[inline]
    #[must_use]
    pub const fn grid_rect(self, tile_size: i32) -> IntRect {
        IntRect::new(self.x * tile_size, self.y * tile_size, tile_size, tile_size)
    }
}

/// One tile of a backing store.
#[derive(Debug)]
pub(crate) struct Tile {
    pub(crate) id: TileId,
    /// Grid cell clipped to the scaled contents rect.
    pub(crate) rect: IntRect,
    dirty: Vec<IntRect>,
}

impl Tile {
    /// A new tile starts fully dirty.
    pub(crate) fn new(id: TileId, rect: IntRect) -> Self {
        Self {
            id,
            rect,
            dirty: alloc::vec![rect],
        }
    }

    /// Records `rect` (clipped to the tile) as needing repaint.
    pub(crate) fn invalidate(&mut self, rect: IntRect) {
        let rect = rect.intersection(self.rect);
        if !rect.is_empty() {
            self.dirty.push(rect);
        }
    }

    pub(crate) fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Bounding box of the dirty area.
    pub(crate) fn dirty_bounds(&self) -> IntRect {
        self.dirty.iter().fold(IntRect::ZERO, |acc, r| acc.union(*r))
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tile_is_fully_dirty() {
        let tile = Tile::new(TileId(0), IntRect::new(0, 0, 16, 16));
        assert_eq!(tile.dirty_bounds(), tile.rect);
    }

    #[test]
    fn invalidation_is_clipped_to_tile() {
        let mut tile = Tile::new(TileId(0), IntRect::new(0, 0, 16, 16));
        tile.mark_clean();
        tile.invalidate(IntRect::new(10, 10, 20, 20));
        assert_eq!(tile.dirty_bounds(), IntRect::new(10, 10, 6, 6));
        tile.invalidate(IntRect::new(40, 40, 4, 4));
        assert_eq!(tile.dirty_bounds(), IntRect::new(10, 10, 6, 6));
    }

    #[test]
    fn index_orders_rows_first() {
        assert!(TileIndex::new(5, 0) < TileIndex::new(0, 1));
        assert_eq!(TileIndex::new(1, 2).grid_rect(8), IntRect::new(8, 16, 8, 8));
    }
}
