// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing hooks for the frame loop.
//!
//! Frame production calls a [`TraceSink`] at each stage. All sink methods
//! default to no-ops, so implementing only the events you care about is fine.
//! This is separate from the `tracing` log output: it is a structured,
//! per-frame event stream meant for recorders and timeline exporters.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. Without the `trace`
//! feature every `Tracer` method compiles to nothing; with it, each method is
//! a single `Option` branch before dispatching.

use crate::output::OutputId;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Why a frame callback produced nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The output is disabled.
    Disabled,
    /// Nothing was damaged and the backend did not ask for a frame.
    NoDamage,
    /// The backend could not hand out a buffer.
    NoBuffer,
}

impl SkipReason {
    /// Short lowercase name for exports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::NoDamage => "no_damage",
            Self::NoBuffer => "no_buffer",
        }
    }
}

/// A frame callback started on an output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameBeginEvent {
    /// Per-output frame counter.
    pub frame_index: u64,
    /// Target output.
    pub output: OutputId,
    /// Host time of the callback.
    pub now: HostTime,
}

/// A frame callback ended without a commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSkippedEvent {
    /// Per-output frame counter.
    pub frame_index: u64,
    /// Target output.
    pub output: OutputId,
    /// Why nothing was drawn.
    pub reason: SkipReason,
}

/// The compose chain for a frame was built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainBuiltEvent {
    /// Per-output frame counter.
    pub frame_index: u64,
    /// Target output.
    pub output: OutputId,
    /// Number of bands, one more than the number of effects.
    pub bands: usize,
    /// Number of contents drawn across all bands.
    pub items: usize,
}

/// A frame was handed to the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameCommittedEvent {
    /// Per-output frame counter.
    pub frame_index: u64,
    /// Target output.
    pub output: OutputId,
    /// Number of rectangles in the committed damage.
    pub damage_rects: usize,
    /// Whether the backend accepted the commit.
    pub ok: bool,
    /// Host time when the commit returned.
    pub committed_at: HostTime,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from frame production.
pub trait TraceSink {
    /// A frame callback started.
    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        _ = e;
    }

    /// A frame callback ended without drawing.
    fn on_frame_skipped(&mut self, e: &FrameSkippedEvent) {
        _ = e;
    }

    /// The compose chain was built.
    fn on_chain_built(&mut self, e: &ChainBuiltEvent) {
        _ = e;
    }

    /// The frame was committed.
    fn on_frame_committed(&mut self, e: &FrameCommittedEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
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

    /// Emits a [`FrameBeginEvent`].
    #[inline]
    pub fn frame_begin(&mut self, e: &FrameBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSkippedEvent`].
    #[inline]
    pub fn frame_skipped(&mut self, e: &FrameSkippedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_skipped(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ChainBuiltEvent`].
    #[inline]
    pub fn chain_built(&mut self, e: &ChainBuiltEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_chain_built(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameCommittedEvent`].
    #[inline]
    pub fn frame_committed(&mut self, e: &FrameCommittedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_committed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}
