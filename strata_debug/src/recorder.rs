// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Phase timestamps are stored as nanoseconds since the recorder's origin.
//! Per-tile records store only the tile count and the dirty count.

use std::time::Instant;

use kurbo::Point;
use strata_core::backing_store::UpdateResult;
use strata_core::delta::LayerDelta;
use strata_core::geometry::IntRect;
use strata_core::id::{LayerId, ScrollingNodeId};
use strata_core::trace::{
    LayerFlushEvent, PaintEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, ScrollEvent,
    TileRecord, TileUpdateEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PHASE_BEGIN: u8 = 1;
const TAG_PHASE_END: u8 = 2;
const TAG_LAYER_FLUSH: u8 = 3;
const TAG_TILE_UPDATE: u8 = 4;
const TAG_PAINT: u8 = 5;
const TAG_SCROLL: u8 = 6;
const TAG_TILE_RECORDS_COUNT: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug)]
pub struct RecorderSink {
    buf: Vec<u8>,
    origin: Instant,
}

impl Default for RecorderSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderSink {
    /// Creates an empty recorder whose timestamps count from now.
    #[must_use]
    pub fn new() -> Self {
        Self::with_origin(Instant::now())
    }

    /// Creates an empty recorder whose timestamps count from `origin`.
    ///
    /// Events from before `origin` are recorded at zero.
    #[must_use]
    pub fn with_origin(origin: Instant) -> Self {
        Self {
            buf: Vec::new(),
            origin,
        }
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_rect(&mut self, r: IntRect) {
        self.write_i32(r.x);
        self.write_i32(r.y);
        self.write_i32(r.width);
        self.write_i32(r.height);
    }

    fn write_timestamp(&mut self, t: Instant) {
        let nanos = t.saturating_duration_since(self.origin).as_nanos();
        self.write_u64(u64::try_from(nanos).unwrap_or(u64::MAX));
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::UpdateContents => 0,
            PhaseKind::ApplyLayerPositions => 1,
            PhaseKind::Composite => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.cycle);
        self.write_phase(e.phase);
        self.write_timestamp(e.timestamp);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.cycle);
        self.write_phase(e.phase);
        self.write_timestamp(e.timestamp);
    }

    fn on_layer_flush(&mut self, e: &LayerFlushEvent) {
        self.write_u8(TAG_LAYER_FLUSH);
        self.write_u64(e.layer.to_u64());
        self.write_u32(e.delta.bits());
        self.write_u64(e.generation);
    }

    fn on_tile_update(&mut self, e: &TileUpdateEvent) {
        self.write_u8(TAG_TILE_UPDATE);
        self.write_u64(e.layer.to_u64());
        self.write_u8(e.result.bits());
        self.write_u32(e.tiles_created);
        self.write_u32(e.tiles_removed);
        self.write_u32(e.tiles_painted);
        self.write_u32(e.tiles_pending);
    }

    fn on_paint(&mut self, e: &PaintEvent) {
        self.write_u8(TAG_PAINT);
        self.write_u64(e.layer.to_u64());
        self.write_rect(e.rect);
        self.write_f32(e.contents_scale);
        self.write_u8(u8::from(e.threaded));
    }

    fn on_scroll(&mut self, e: &ScrollEvent) {
        self.write_u8(TAG_SCROLL);
        self.write_u64(e.node.0);
        self.write_f64(e.position.x);
        self.write_f64(e.position.y);
        self.write_u8(u8::from(e.synchronous));
    }

    fn on_tile_records(&mut self, layer: LayerId, tiles: &[TileRecord]) {
        self.write_u8(TAG_TILE_RECORDS_COUNT);
        self.write_u64(layer.to_u64());
        let count = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
        self.write_u32(count(tiles.len()));
        self.write_u32(count(tiles.iter().filter(|t| t.dirty).count()));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
///
/// Layer ids are raw values, since recordings outlive the layers they
/// describe.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`PhaseBeginEvent`].
    PhaseBegin {
        /// Cycle counter.
        cycle: u64,
        /// The stage.
        phase: PhaseKind,
        /// Nanoseconds since the recorder's origin.
        nanos: u64,
    },
    /// A [`PhaseEndEvent`].
    PhaseEnd {
        /// Cycle counter.
        cycle: u64,
        /// The stage.
        phase: PhaseKind,
        /// Nanoseconds since the recorder's origin.
        nanos: u64,
    },
    /// A [`LayerFlushEvent`].
    LayerFlush {
        /// Raw layer id.
        layer: u64,
        /// Flushed fields.
        delta: LayerDelta,
        /// Committed generation after the flush.
        generation: u64,
    },
    /// A [`TileUpdateEvent`].
    TileUpdate {
        /// Raw layer id.
        layer: u64,
        /// Result bits.
        result: UpdateResult,
        /// Tiles created.
        created: u32,
        /// Tiles evicted.
        removed: u32,
        /// Tiles painted.
        painted: u32,
        /// Dirty tiles left for later.
        pending: u32,
    },
    /// A [`PaintEvent`].
    Paint {
        /// Raw layer id.
        layer: u64,
        /// Painted rectangle in scaled pixels.
        rect: IntRect,
        /// Contents scale used.
        contents_scale: f32,
        /// Whether painting continued on a worker.
        threaded: bool,
    },
    /// A [`ScrollEvent`].
    Scroll {
        /// The scrolled node.
        node: ScrollingNodeId,
        /// The new scroll position.
        position: Point,
        /// Whether synchronous scrolling reasons forced the update.
        synchronous: bool,
    },
    /// Tile map summary of a layer.
    TileRecordsCount {
        /// Raw layer id.
        layer: u64,
        /// Number of tiles.
        count: u32,
        /// Number of tiles with unpainted dirty area.
        dirty: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_f32(&mut self) -> Option<f32> {
        self.take().map(f32::from_le_bytes)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.take().map(f64::from_le_bytes)
    }

    fn read_rect(&mut self) -> Option<IntRect> {
        Some(IntRect::new(
            self.read_i32()?,
            self.read_i32()?,
            self.read_i32()?,
            self.read_i32()?,
        ))
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        match self.read_u8()? {
            0 => Some(PhaseKind::UpdateContents),
            1 => Some(PhaseKind::ApplyLayerPositions),
            2 => Some(PhaseKind::Composite),
            _ => None,
        }
    }

    fn decode_phase(&mut self, begin: bool) -> Option<RecordedEvent> {
        let cycle = self.read_u64()?;
        let phase = self.read_phase()?;
        let nanos = self.read_u64()?;
        Some(if begin {
            RecordedEvent::PhaseBegin {
                cycle,
                phase,
                nanos,
            }
        } else {
            RecordedEvent::PhaseEnd {
                cycle,
                phase,
                nanos,
            }
        })
    }

    fn decode_layer_flush(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LayerFlush {
            layer: self.read_u64()?,
            delta: LayerDelta::from_bits_retain(self.read_u32()?),
            generation: self.read_u64()?,
        })
    }

    fn decode_tile_update(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TileUpdate {
            layer: self.read_u64()?,
            result: UpdateResult::from_bits_retain(self.read_u8()?),
            created: self.read_u32()?,
            removed: self.read_u32()?,
            painted: self.read_u32()?,
            pending: self.read_u32()?,
        })
    }

    fn decode_paint(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Paint {
            layer: self.read_u64()?,
            rect: self.read_rect()?,
            contents_scale: self.read_f32()?,
            threaded: self.read_u8()? != 0,
        })
    }

    fn decode_scroll(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Scroll {
            node: ScrollingNodeId(self.read_u64()?),
            position: Point::new(self.read_f64()?, self.read_f64()?),
            synchronous: self.read_u8()? != 0,
        })
    }

    fn decode_tile_records_count(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TileRecordsCount {
            layer: self.read_u64()?,
            count: self.read_u32()?,
            dirty: self.read_u32()?,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_PHASE_BEGIN => self.decode_phase(true),
            TAG_PHASE_END => self.decode_phase(false),
            TAG_LAYER_FLUSH => self.decode_layer_flush(),
            TAG_TILE_UPDATE => self.decode_tile_update(),
            TAG_PAINT => self.decode_paint(),
            TAG_SCROLL => self.decode_scroll(),
            TAG_TILE_RECORDS_COUNT => self.decode_tile_records_count(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use strata_core::trace::Tracer;

    use super::*;

    #[test]
    fn phase_timestamps_are_relative_to_origin() {
        let origin = Instant::now();
        let mut rec = RecorderSink::with_origin(origin);
        rec.on_phase_begin(&PhaseBeginEvent {
            cycle: 3,
            phase: PhaseKind::Composite,
            timestamp: origin + Duration::from_micros(5),
        });
        rec.on_phase_end(&PhaseEndEvent {
            cycle: 3,
            phase: PhaseKind::Composite,
            timestamp: origin + Duration::from_micros(12),
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events,
            [
                RecordedEvent::PhaseBegin {
                    cycle: 3,
                    phase: PhaseKind::Composite,
                    nanos: 5_000,
                },
                RecordedEvent::PhaseEnd {
                    cycle: 3,
                    phase: PhaseKind::Composite,
                    nanos: 12_000,
                },
            ]
        );
    }

    #[test]
    fn mixed_events_decode_in_order() {
        let layer = LayerId::generate();
        let mut rec = RecorderSink::new();
        rec.on_layer_flush(&LayerFlushEvent {
            layer,
            delta: LayerDelta::POSITION | LayerDelta::OPACITY,
            generation: 4,
        });
        rec.on_tile_update(&TileUpdateEvent {
            layer,
            result: UpdateResult::TILES_CHANGED | UpdateResult::TILES_PENDING,
            tiles_created: 2,
            tiles_removed: 0,
            tiles_painted: 1,
            tiles_pending: 1,
        });
        rec.on_paint(&PaintEvent {
            layer,
            rect: IntRect::new(0, 0, 256, 128),
            contents_scale: 2.0,
            threaded: true,
        });
        rec.on_scroll(&ScrollEvent {
            node: ScrollingNodeId(9),
            position: Point::new(0.0, 120.5),
            synchronous: false,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0],
            RecordedEvent::LayerFlush {
                layer: layer.to_u64(),
                delta: LayerDelta::POSITION | LayerDelta::OPACITY,
                generation: 4,
            }
        );
        assert!(
            matches!(events[1], RecordedEvent::TileUpdate { pending: 1, result, .. } if result.contains(UpdateResult::TILES_PENDING)),
            "got {:?}",
            events[1]
        );
        assert!(
            matches!(events[2], RecordedEvent::Paint { threaded: true, rect, .. } if rect.width == 256),
            "got {:?}",
            events[2]
        );
        assert_eq!(
            events[3],
            RecordedEvent::Scroll {
                node: ScrollingNodeId(9),
                position: Point::new(0.0, 120.5),
                synchronous: false,
            }
        );
    }

    #[test]
    fn tracer_feeds_the_recorder() {
        let mut rec = RecorderSink::new();
        {
            let mut tracer = Tracer::new(&mut rec);
            tracer.phase_begin(1, PhaseKind::UpdateContents);
            tracer.phase_end(1, PhaseKind::UpdateContents);
        }
        let phases: Vec<_> = decode(rec.as_bytes())
            .map(|e| match e {
                RecordedEvent::PhaseBegin { phase, .. } => ("begin", phase),
                RecordedEvent::PhaseEnd { phase, .. } => ("end", phase),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            phases,
            [
                ("begin", PhaseKind::UpdateContents),
                ("end", PhaseKind::UpdateContents),
            ]
        );
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = RecorderSink::new();
        rec.on_scroll(&ScrollEvent {
            node: ScrollingNodeId(1),
            position: Point::ZERO,
            synchronous: true,
        });
        rec.on_scroll(&ScrollEvent {
            node: ScrollingNodeId(2),
            position: Point::ZERO,
            synchronous: true,
        });
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1, "the second record is incomplete");
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty(), "no bytes, no events");
    }

    #[test]
    fn tile_records_store_counts() {
        let layer = LayerId::generate();
        let mut rec = RecorderSink::new();
        let tile = |dirty| TileRecord {
            rect: IntRect::new(0, 0, 256, 256),
            dirty,
        };
        rec.on_tile_records(layer, &[tile(true), tile(false), tile(true)]);
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events,
            [RecordedEvent::TileRecordsCount {
                layer: layer.to_u64(),
                count: 3,
                dirty: 2,
            }]
        );
    }
}
