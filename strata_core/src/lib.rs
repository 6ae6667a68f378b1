// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Platform layers, double-buffered scene graph and tiled backing stores.
//!
//! `strata_core` holds the main-thread half of a coordinated compositor: the
//! layer tree that a page's graphics layers drive, the scene graph the render
//! thread reads, and the tile grid that connects painting to both.
//!
//! # Architecture
//!
//! ```text
//!   graphics layer ──setters──► PlatformLayer (LayerDelta bits)
//!                                    │ update_contents()
//!                  ┌─────────────────┼──────────────────────┐
//!                  ▼                 ▼                      ▼
//!         BackingStoreProxy   CompositionLayer       backdrop layer
//!          update_if_needed    pending ──flush_state──► committed
//!                  │                                         │
//!                  ▼                                         ▼
//!          PaintingEngine ──► TileBuffer           render thread reads
//! ```
//!
//! **[`layer`]**: [`PlatformLayer`](layer::PlatformLayer) and its
//! collaborators. Setters are idempotent and record delta bits; a
//! composition cycle copies exactly the changed fields into the scene graph.
//!
//! **[`composition`]**: [`CompositionLayer`](composition::CompositionLayer),
//! the double-buffered scene-graph node shared with the render thread.
//!
//! **[`backing_store`]**: The per-layer tile grid: coverage, eviction,
//! invalidation and nearest-first painting.
//!
//! **[`paint`]**: The seams painting goes through:
//! [`GraphicsContext`](paint::GraphicsContext),
//! [`LayerOwner`](paint::LayerOwner) and
//! [`PaintingEngine`](paint::PaintingEngine).
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) and the zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! **[`config`]**: Tiling, painting and scrolling parameters with presets
//! and JSON loading.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-tile
//!   records after each backing store update.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backing_store;
pub mod composition;
pub mod config;
pub mod delta;
pub mod geometry;
pub mod id;
pub mod layer;
pub mod paint;
pub mod properties;
pub mod tile_buffer;
pub mod trace;
pub mod transform;
