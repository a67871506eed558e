// Copyright 2026 the Uplift Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! The layout engine has no clock, so `ts` is the event's position in the
//! recording. Phases still nest correctly around the rebuilds they contain.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for (ts, recorded) in decode(bytes).enumerate() {
        match recorded {
            RecordedEvent::Mark(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Mark",
                    "cat": "Dirty",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "node": format!("{:?}", e.node),
                        "outcome": format!("{:?}", e.outcome),
                    }
                }));
            }
            RecordedEvent::PhaseBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": e.phase.as_str(),
                    "cat": "Frame",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": e.phase.as_str(),
                    "cat": "Frame",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::Rebuild(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Rebuild",
                    "cat": "Layout",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "root": format!("{:?}", e.root),
                        "depth": e.depth,
                        "calculated": e.stats.calculated,
                        "controlled": e.stats.controlled,
                        "calculators_run": e.stats.calculators_run,
                        "controllers_run": e.stats.controllers_run,
                    }
                }));
            }
            RecordedEvent::Stale(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Stale",
                    "cat": "Layout",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "key": format!("{:?}", e.key),
                    }
                }));
            }
            RecordedEvent::LayoutSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "LayoutSummary",
                    "cat": "Summary",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "frame_index": s.frame_index,
                        "rebuilt": s.rebuilt,
                        "stale": s.stale,
                        "calculators_run": s.stats.calculators_run,
                        "controllers_run": s.stats.controllers_run,
                        "pool_free": s.pool_free,
                        "pool_in_use": s.pool_in_use,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use uplift_core::node::NodeTree;
    use uplift_core::phase::UpdatePhase;
    use uplift_core::rebuild::{MarkOutcome, RebuildStats};
    use uplift_core::trace::{MarkEvent, PhaseBeginEvent, PhaseEndEvent, RebuildEvent, TraceSink};

    #[test]
    fn export_produces_valid_json() {
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        let mut rec = RecorderSink::new();
        rec.on_mark(&MarkEvent {
            frame_index: 1,
            node: root,
            outcome: MarkOutcome::Submitted(root),
        });
        rec.on_phase_begin(&PhaseBeginEvent {
            frame_index: 1,
            phase: UpdatePhase::Layout,
        });
        rec.on_rebuild(&RebuildEvent {
            frame_index: 1,
            root,
            depth: 0,
            stats: RebuildStats::default(),
        });
        rec.on_phase_end(&PhaseEndEvent {
            frame_index: 1,
            phase: UpdatePhase::Layout,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "Mark");

        // The rebuild sits strictly inside its phase.
        assert_eq!(parsed[1]["ph"], "B");
        assert_eq!(parsed[1]["name"], "layout");
        assert_eq!(parsed[2]["name"], "Rebuild");
        assert_eq!(parsed[3]["ph"], "E");
        assert!(parsed[1]["ts"].as_u64() < parsed[2]["ts"].as_u64());
        assert!(parsed[2]["ts"].as_u64() < parsed[3]["ts"].as_u64());
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
