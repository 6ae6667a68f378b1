// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tile painting engines for strata.
//!
//! Implementations of [`PaintingEngine`](strata_core::paint::PaintingEngine)
//! that rasterize layer contents into
//! [`TileBuffer`](strata_core::tile_buffer::TileBuffer)s with `tiny-skia`:
//!
//! - [`DirectPaintingEngine`] paints synchronously on the caller.
//! - [`ThreadedPaintingEngine`] records a [`DisplayList`] on the caller and
//!   replays it on a `rayon` pool, returning the buffer while it is still
//!   being painted.
//!
//! Both go through [`PaintingContext`], which scopes a drawing surface to the
//! buffer it wraps.

mod context;
mod display_list;
mod engine;
mod pixmap;

pub use context::PaintingContext;
pub use display_list::{DisplayList, DisplayListRecorder, PaintOp};
pub use engine::{DirectPaintingEngine, RenderingMode, ThreadedPaintingEngine};
pub use pixmap::PixmapContext;
