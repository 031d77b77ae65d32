// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and appends every event it
//! receives to a list of [`RecordedEvent`], preserving arrival order across
//! outputs.

use tessera_core::output::OutputId;
use tessera_core::trace::{
    ChainBuiltEvent, FrameBeginEvent, FrameCommittedEvent, FrameSkippedEvent, TraceSink,
};

/// One event as it reached the sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`FrameBeginEvent`].
    Begin(FrameBeginEvent),
    /// A [`FrameSkippedEvent`].
    Skipped(FrameSkippedEvent),
    /// A [`ChainBuiltEvent`].
    ChainBuilt(ChainBuiltEvent),
    /// A [`FrameCommittedEvent`].
    Committed(FrameCommittedEvent),
}

impl RecordedEvent {
    /// The output the event belongs to.
    #[must_use]
    pub const fn output(&self) -> OutputId {
        match self {
            Self::Begin(e) => e.output,
            Self::Skipped(e) => e.output,
            Self::ChainBuilt(e) => e.output,
            Self::Committed(e) => e.output,
        }
    }

    /// The per-output frame counter of the event.
    #[must_use]
    pub const fn frame_index(&self) -> u64 {
        match self {
            Self::Begin(e) => e.frame_index,
            Self::Skipped(e) => e.frame_index,
            Self::ChainBuilt(e) => e.frame_index,
            Self::Committed(e) => e.frame_index,
        }
    }
}

/// Per-output frame counts over a recording.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameCounts {
    /// Frame callbacks started.
    pub begun: usize,
    /// Callbacks that ended without a commit.
    pub skipped: usize,
    /// Commits the backend accepted.
    pub committed: usize,
    /// Commits the backend rejected.
    pub failed: usize,
}

/// A [`TraceSink`] that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecorderSink {
    events: Vec<RecordedEvent>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Consumes the recorder and returns its events.
    #[must_use]
    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }

    /// Drops everything recorded so far.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Tallies the recording for one output.
    #[must_use]
    pub fn counts(&self, output: OutputId) -> FrameCounts {
        let mut counts = FrameCounts::default();
        for event in self.events.iter().filter(|e| e.output() == output) {
            match event {
                RecordedEvent::Begin(_) => counts.begun += 1,
                RecordedEvent::Skipped(_) => counts.skipped += 1,
                RecordedEvent::Committed(e) if e.ok => counts.committed += 1,
                RecordedEvent::Committed(_) => counts.failed += 1,
                RecordedEvent::ChainBuilt(_) => {}
            }
        }
        counts
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.events.push(RecordedEvent::Begin(*e));
    }

    fn on_frame_skipped(&mut self, e: &FrameSkippedEvent) {
        self.events.push(RecordedEvent::Skipped(*e));
    }

    fn on_chain_built(&mut self, e: &ChainBuiltEvent) {
        self.events.push(RecordedEvent::ChainBuilt(*e));
    }

    fn on_frame_committed(&mut self, e: &FrameCommittedEvent) {
        self.events.push(RecordedEvent::Committed(*e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::Compositor;
    use tessera_core::config::CompositorConfig;
    use tessera_core::output::OutputDescriptor;
    use tessera_core::time::HostTime;
    use tessera_core::trace::SkipReason;

    fn two_outputs() -> (OutputId, OutputId) {
        let mut comp = Compositor::new(CompositorConfig::default());
        (
            comp.add_output(OutputDescriptor::new("A")),
            comp.add_output(OutputDescriptor::new("B")),
        )
    }

    #[test]
    fn events_keep_arrival_order() {
        let (a, b) = two_outputs();
        let mut rec = RecorderSink::new();
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 0,
            output: a,
            now: HostTime::from_millis(1),
        });
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 4,
            output: b,
            now: HostTime::from_millis(2),
        });
        rec.on_frame_skipped(&FrameSkippedEvent {
            frame_index: 0,
            output: a,
            reason: SkipReason::NoDamage,
        });

        let outputs: Vec<_> = rec.events().iter().map(RecordedEvent::output).collect();
        assert_eq!(outputs, vec![a, b, a]);
        assert_eq!(rec.events()[1].frame_index(), 4);
    }

    #[test]
    fn counts_split_by_output_and_outcome() {
        let (a, b) = two_outputs();
        let mut rec = RecorderSink::new();
        for (frame_index, ok) in [(0, true), (1, false), (2, true)] {
            rec.on_frame_begin(&FrameBeginEvent {
                frame_index,
                output: a,
                now: HostTime::from_millis(frame_index * 16),
            });
            rec.on_frame_committed(&FrameCommittedEvent {
                frame_index,
                output: a,
                damage_rects: 1,
                ok,
                committed_at: HostTime::from_millis(frame_index * 16 + 2),
            });
        }
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 0,
            output: b,
            now: HostTime::from_millis(5),
        });
        rec.on_frame_skipped(&FrameSkippedEvent {
            frame_index: 0,
            output: b,
            reason: SkipReason::Disabled,
        });

        assert_eq!(
            rec.counts(a),
            FrameCounts {
                begun: 3,
                skipped: 0,
                committed: 2,
                failed: 1,
            }
        );
        assert_eq!(rec.counts(b).skipped, 1);

        rec.clear();
        assert!(rec.events().is_empty());
    }
}
