// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Each stage of the composition cycle gets its own track: the main thread
//! (`tid` 1), the scrolling thread (`tid` 2) and the render thread (`tid` 3).
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};
use strata_core::trace::PhaseKind;

use crate::recorder::{RecordedEvent, decode};

const TID_MAIN: u32 = 1;
const TID_SCROLLING: u32 = 2;
const TID_RENDER: u32 = 3;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Instant events carry no timestamp of their own and are placed at the most
/// recent phase boundary on their thread.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    // Last seen timestamp per track, in microseconds.
    let mut clock = [0.0_f64; 4];

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::PhaseBegin {
                cycle,
                phase,
                nanos,
            } => {
                let tid = phase_tid(phase);
                clock[tid as usize] = nanos_to_us(nanos);
                events.push(json!({
                    "ph": "B",
                    "name": phase.name(),
                    "cat": "Cycle",
                    "ts": nanos_to_us(nanos),
                    "pid": 0,
                    "tid": tid,
                    "args": { "cycle": cycle }
                }));
            }
            RecordedEvent::PhaseEnd {
                cycle,
                phase,
                nanos,
            } => {
                let tid = phase_tid(phase);
                clock[tid as usize] = nanos_to_us(nanos);
                events.push(json!({
                    "ph": "E",
                    "name": phase.name(),
                    "cat": "Cycle",
                    "ts": nanos_to_us(nanos),
                    "pid": 0,
                    "tid": tid,
                    "args": { "cycle": cycle }
                }));
            }
            RecordedEvent::LayerFlush {
                layer,
                delta,
                generation,
            } => {
                events.push(instant(
                    "LayerFlush",
                    "Layers",
                    TID_MAIN,
                    clock[TID_MAIN as usize],
                    json!({
                        "layer": layer,
                        "delta": format!("{delta:?}"),
                        "generation": generation,
                    }),
                ));
            }
            RecordedEvent::TileUpdate {
                layer,
                result,
                created,
                removed,
                painted,
                pending,
            } => {
                events.push(instant(
                    "TileUpdate",
                    "Tiles",
                    TID_MAIN,
                    clock[TID_MAIN as usize],
                    json!({
                        "layer": layer,
                        "result": format!("{result:?}"),
                        "created": created,
                        "removed": removed,
                        "painted": painted,
                        "pending": pending,
                    }),
                ));
            }
            RecordedEvent::Paint {
                layer,
                rect,
                contents_scale,
                threaded,
            } => {
                events.push(instant(
                    "Paint",
                    "Tiles",
                    TID_MAIN,
                    clock[TID_MAIN as usize],
                    json!({
                        "layer": layer,
                        "rect": [rect.x, rect.y, rect.width, rect.height],
                        "contents_scale": contents_scale,
                        "threaded": threaded,
                    }),
                ));
            }
            RecordedEvent::Scroll {
                node,
                position,
                synchronous,
            } => {
                events.push(instant(
                    "Scroll",
                    "Scrolling",
                    TID_SCROLLING,
                    clock[TID_SCROLLING as usize],
                    json!({
                        "node": node.0,
                        "x": position.x,
                        "y": position.y,
                        "synchronous": synchronous,
                    }),
                ));
            }
            RecordedEvent::TileRecordsCount {
                layer,
                count,
                dirty,
            } => {
                events.push(instant(
                    "TileMap",
                    "Rich",
                    TID_MAIN,
                    clock[TID_MAIN as usize],
                    json!({
                        "layer": layer,
                        "count": count,
                        "dirty": dirty,
                    }),
                ));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn instant(name: &str, cat: &str, tid: u32, ts: f64, args: Value) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": cat,
        "ts": ts,
        "pid": 0,
        "tid": tid,
        "s": "t",
        "args": args,
    })
}

fn phase_tid(phase: PhaseKind) -> u32 {
    match phase {
        PhaseKind::UpdateContents => TID_MAIN,
        PhaseKind::ApplyLayerPositions => TID_SCROLLING,
        PhaseKind::Composite => TID_RENDER,
    }
}

#[expect(clippy::cast_precision_loss, reason = "trace timestamps tolerate rounding")]
fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use kurbo::Point;
    use strata_core::id::ScrollingNodeId;
    use strata_core::trace::{PhaseBeginEvent, PhaseEndEvent, ScrollEvent, TraceSink};

    use super::*;
    use crate::recorder::RecorderSink;

    #[test]
    fn phases_land_on_their_thread_track() {
        let origin = Instant::now();
        let mut rec = RecorderSink::with_origin(origin);
        rec.on_phase_begin(&PhaseBeginEvent {
            cycle: 0,
            phase: PhaseKind::ApplyLayerPositions,
            timestamp: origin + Duration::from_micros(10),
        });
        rec.on_scroll(&ScrollEvent {
            node: ScrollingNodeId(1),
            position: Point::new(0.0, 30.0),
            synchronous: false,
        });
        rec.on_phase_end(&PhaseEndEvent {
            cycle: 0,
            phase: PhaseKind::ApplyLayerPositions,
            timestamp: origin + Duration::from_micros(25),
        });
        rec.on_phase_begin(&PhaseBeginEvent {
            cycle: 0,
            phase: PhaseKind::Composite,
            timestamp: origin + Duration::from_micros(30),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "apply-layer-positions");
        assert_eq!(parsed[0]["tid"], TID_SCROLLING);
        assert_eq!(parsed[0]["ts"], 10.0);

        assert_eq!(parsed[1]["ph"], "i");
        assert_eq!(parsed[1]["name"], "Scroll");
        assert_eq!(parsed[1]["tid"], TID_SCROLLING);
        assert_eq!(parsed[1]["ts"], 10.0, "instants sit at the phase boundary");
        assert_eq!(parsed[1]["args"]["y"], 30.0);

        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[3]["tid"], TID_RENDER);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty(), "no events recorded");
    }
}
