// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Phase
//! timestamps are printed in microseconds since the sink's origin.

use std::io::Write;
use std::time::Instant;

use strata_core::id::LayerId;
use strata_core::trace::{
    LayerFlushEvent, PaintEvent, PhaseBeginEvent, PhaseEndEvent, ScrollEvent, TileRecord,
    TileUpdateEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    origin: Instant,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self::with_origin(writer, Instant::now())
    }

    /// Creates a sink whose timestamps count from `origin`.
    #[must_use]
    pub fn with_origin(writer: W, origin: Instant) -> Self {
        Self { writer, origin }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn us(&self, t: Instant) -> f64 {
        t.saturating_duration_since(self.origin).as_secs_f64() * 1e6
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] cycle={} {} at {:.1}µs",
            e.cycle,
            e.phase.name(),
            self.us(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] cycle={} {} at {:.1}µs",
            e.cycle,
            e.phase.name(),
            self.us(e.timestamp),
        );
    }

    fn on_layer_flush(&mut self, e: &LayerFlushEvent) {
        let _ = writeln!(
            self.writer,
            "[flush] layer={} delta={:?} generation={}",
            e.layer.to_u64(),
            e.delta,
            e.generation,
        );
    }

    fn on_tile_update(&mut self, e: &TileUpdateEvent) {
        let _ = writeln!(
            self.writer,
            "[tiles] layer={} created={} removed={} painted={} pending={}",
            e.layer.to_u64(),
            e.tiles_created,
            e.tiles_removed,
            e.tiles_painted,
            e.tiles_pending,
        );
    }

    fn on_paint(&mut self, e: &PaintEvent) {
        let mode = if e.threaded { "threaded" } else { "sync" };
        let _ = writeln!(
            self.writer,
            "[paint] layer={} rect=({}, {}, {}x{}) scale={} {mode}",
            e.layer.to_u64(),
            e.rect.x,
            e.rect.y,
            e.rect.width,
            e.rect.height,
            e.contents_scale,
        );
    }

    fn on_scroll(&mut self, e: &ScrollEvent) {
        let sync = if e.synchronous { " sync" } else { "" };
        let _ = writeln!(
            self.writer,
            "[scroll] node={} position=({:.1}, {:.1}){sync}",
            e.node.0, e.position.x, e.position.y,
        );
    }

    fn on_tile_records(&mut self, layer: LayerId, tiles: &[TileRecord]) {
        let dirty = tiles.iter().filter(|t| t.dirty).count();
        let _ = writeln!(
            self.writer,
            "[tilemap] layer={} tiles={} dirty={dirty}",
            layer.to_u64(),
            tiles.len(),
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use kurbo::Point;
    use strata_core::geometry::IntRect;
    use strata_core::id::ScrollingNodeId;
    use strata_core::trace::{PhaseKind, Tracer};

    use super::*;

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn phase_lines_name_the_stage() {
        let origin = Instant::now();
        let mut sink = PrettyPrintSink::with_origin(Vec::new(), origin);
        sink.on_phase_begin(&PhaseBeginEvent {
            cycle: 7,
            phase: PhaseKind::ApplyLayerPositions,
            timestamp: origin + Duration::from_micros(250),
        });
        let out = output(sink);
        assert_eq!(
            out, "[phase:begin] cycle=7 apply-layer-positions at 250.0µs\n",
            "got: {out}"
        );
    }

    #[test]
    fn paint_and_scroll_lines() {
        let layer = LayerId::generate();
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        {
            let mut tracer = Tracer::new(&mut sink);
            tracer.paint(&PaintEvent {
                layer,
                rect: IntRect::new(0, 256, 256, 256),
                contents_scale: 1.0,
                threaded: false,
            });
            tracer.scroll(&ScrollEvent {
                node: ScrollingNodeId(3),
                position: Point::new(0.0, 42.0),
                synchronous: true,
            });
        }
        let out = output(sink);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2, "got: {out}");
        assert!(lines[0].starts_with("[paint]"), "got: {out}");
        assert!(lines[0].contains("rect=(0, 256, 256x256)"), "got: {out}");
        assert!(lines[0].ends_with("sync"), "got: {out}");
        assert_eq!(lines[1], "[scroll] node=3 position=(0.0, 42.0) sync");
    }

    #[test]
    fn tile_map_counts_dirty_tiles() {
        let layer = LayerId::generate();
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        let tile = |dirty| TileRecord {
            rect: IntRect::new(0, 0, 512, 512),
            dirty,
        };
        sink.on_tile_records(layer, &[tile(false), tile(true)]);
        let out = output(sink);
        assert!(out.contains("tiles=2 dirty=1"), "got: {out}");
    }
}
