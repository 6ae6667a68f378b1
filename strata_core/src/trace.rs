// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the composition cycle.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! layer flush, tile update, scrolling and compositing stages call. All method
//! bodies default to no-ops, so implementing only the events you care about is
//! fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) gates per-tile [`TileRecord`] events and
//!   the corresponding `TraceSink` method.

use std::time::Instant;

use kurbo::Point;

use crate::backing_store::UpdateResult;
use crate::delta::LayerDelta;
use crate::geometry::IntRect;
use crate::id::{LayerId, ScrollingNodeId};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which stage of the composition cycle is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Main thread: flushing layer state into the scene graph.
    UpdateContents,
    /// Scrolling thread: repositioning layers after scroll changes.
    ApplyLayerPositions,
    /// Render thread: walking committed state into a render plan.
    Composite,
}

impl PhaseKind {
    /// Short human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UpdateContents => "update-contents",
            Self::ApplyLayerPositions => "apply-layer-positions",
            Self::Composite => "composite",
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Marks the beginning of a stage.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Cycle counter of the stage's owner.
    pub cycle: u64,
    /// Which stage is starting.
    pub phase: PhaseKind,
    /// When the stage started.
    pub timestamp: Instant,
}

/// Marks the end of a stage.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Cycle counter of the stage's owner.
    pub cycle: u64,
    /// Which stage is ending.
    pub phase: PhaseKind,
    /// When the stage ended.
    pub timestamp: Instant,
}

/// Emitted when a layer publishes changed fields to its scene-graph node.
#[derive(Clone, Copy, Debug)]
pub struct LayerFlushEvent {
    /// The flushed layer.
    pub layer: LayerId,
    /// Fields copied into the pending state.
    pub delta: LayerDelta,
    /// Committed generation after the flush.
    pub generation: u64,
}

/// Emitted after a backing store update ran.
#[derive(Clone, Copy, Debug)]
pub struct TileUpdateEvent {
    /// Layer owning the backing store.
    pub layer: LayerId,
    /// Result bits of the update.
    pub result: UpdateResult,
    /// Tiles created.
    pub tiles_created: u32,
    /// Tiles evicted.
    pub tiles_removed: u32,
    /// Tiles painted (synchronously or dispatched).
    pub tiles_painted: u32,
    /// Dirty tiles left for a later cycle.
    pub tiles_pending: u32,
}

/// Emitted for each tile paint.
#[derive(Clone, Copy, Debug)]
pub struct PaintEvent {
    /// Layer being painted.
    pub layer: LayerId,
    /// Painted rectangle in scaled pixels.
    pub rect: IntRect,
    /// Contents scale used.
    pub contents_scale: f32,
    /// Whether painting continues on a worker thread.
    pub threaded: bool,
}

/// Emitted for every scroll position change on the scrolling thread.
#[derive(Clone, Copy, Debug)]
pub struct ScrollEvent {
    /// The scrolled node.
    pub node: ScrollingNodeId,
    /// The new scroll position.
    pub position: Point,
    /// Whether the position was forced to `Set` by synchronous scrolling
    /// reasons.
    pub synchronous: bool,
}

/// A single tile's state after an update.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct TileRecord {
    /// Tile rectangle in scaled pixels.
    pub rect: IntRect,
    /// Whether the tile still has unpainted dirty area.
    pub dirty: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the composition cycle.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called at the beginning of a stage.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a stage.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a layer flushes its delta.
    fn on_layer_flush(&mut self, e: &LayerFlushEvent) {
        _ = e;
    }

    /// Called after a backing store update.
    fn on_tile_update(&mut self, e: &TileUpdateEvent) {
        _ = e;
    }

    /// Called for each tile paint.
    fn on_paint(&mut self, e: &PaintEvent) {
        _ = e;
    }

    /// Called when a scroll position is applied.
    fn on_scroll(&mut self, e: &ScrollEvent) {
        _ = e;
    }

    /// Called with the tile map of a layer (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_tile_records(&mut self, layer: LayerId, tiles: &[TileRecord]) {
        _ = (layer, tiles);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Reborrows the tracer for a nested call.
    #[inline]
    #[must_use]
    pub fn reborrow(&mut self) -> Tracer<'_> {
        #[cfg(feature = "trace")]
        {
            Tracer {
                sink: self.sink.as_deref_mut().map(|s| s as &mut dyn TraceSink),
            }
        }
        #[cfg(not(feature = "trace"))]
        {
            Tracer {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PhaseBeginEvent`] stamped with the current time.
    #[inline]
    pub fn phase_begin(&mut self, cycle: u64, phase: PhaseKind) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(&PhaseBeginEvent {
                cycle,
                phase,
                timestamp: Instant::now(),
            });
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = (cycle, phase);
        }
    }

    /// Emits a [`PhaseEndEvent`] stamped with the current time.
    #[inline]
    pub fn phase_end(&mut self, cycle: u64, phase: PhaseKind) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(&PhaseEndEvent {
                cycle,
                phase,
                timestamp: Instant::now(),
            });
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = (cycle, phase);
        }
    }

    /// Emits a [`LayerFlushEvent`].
    #[inline]
    pub fn layer_flush(&mut self, e: &LayerFlushEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_layer_flush(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TileUpdateEvent`].
    #[inline]
    pub fn tile_update(&mut self, e: &TileUpdateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_tile_update(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PaintEvent`].
    #[inline]
    pub fn paint(&mut self, e: &PaintEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_paint(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ScrollEvent`].
    #[inline]
    pub fn scroll(&mut self, e: &ScrollEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_scroll(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a layer's tile map (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn tile_records(&mut self, layer: LayerId, tiles: &[TileRecord]) {
        if let Some(s) = &mut self.sink {
            s.on_tile_records(layer, tiles);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
