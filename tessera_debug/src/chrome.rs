// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] takes events from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//! Each output becomes a process; each frame callback becomes a duration
//! slice from its begin to its commit or skip.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::collections::HashMap;
use std::io::{self, Write};

use serde_json::{Value, json};

use tessera_core::output::OutputId;
use tessera_core::time::HostTime;

use crate::recorder::RecordedEvent;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Skip and chain events carry no timestamp of their own; they are placed at
/// the begin time of their frame.
///
/// # Errors
///
/// Any error from `writer`.
pub fn export(events: &[RecordedEvent], writer: &mut dyn Write) -> io::Result<()> {
    let mut out: Vec<Value> = Vec::new();
    let mut began: HashMap<OutputId, HostTime> = HashMap::new();

    for recorded in events {
        match recorded {
            RecordedEvent::Begin(e) => {
                began.insert(e.output, e.now);
                out.push(json!({
                    "ph": "B",
                    "name": "frame",
                    "cat": "Frame",
                    "ts": to_us(e.now),
                    "pid": e.output.get(),
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::ChainBuilt(e) => {
                out.push(json!({
                    "ph": "i",
                    "name": "chain",
                    "cat": "Compose",
                    "ts": began.get(&e.output).copied().map_or(0.0, to_us),
                    "pid": e.output.get(),
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": e.frame_index,
                        "bands": e.bands,
                        "items": e.items,
                    }
                }));
            }
            RecordedEvent::Skipped(e) => {
                out.push(json!({
                    "ph": "E",
                    "name": "frame",
                    "cat": "Frame",
                    "ts": began.get(&e.output).copied().map_or(0.0, to_us),
                    "pid": e.output.get(),
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                        "skipped": e.reason.name(),
                    }
                }));
            }
            RecordedEvent::Committed(e) => {
                out.push(json!({
                    "ph": "E",
                    "name": "frame",
                    "cat": "Frame",
                    "ts": to_us(e.committed_at),
                    "pid": e.output.get(),
                    "tid": 0,
                    "args": {
                        "frame_index": e.frame_index,
                        "damage_rects": e.damage_rects,
                        "ok": e.ok,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &out)?;
    Ok(())
}

fn to_us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}
