// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-loop recording and Chrome trace export for tessera diagnostics.
//!
//! This crate provides a [`TraceSink`](tessera_core::trace::TraceSink) for
//! development and post-mortem analysis of frame production:
//!
//! - [`recorder::RecorderSink`]: keeps every event in memory, in order.
//! - [`chrome::export`]: writes recorded events as Chrome Trace Event Format
//!   JSON, one process per output.

pub mod chrome;
pub mod recorder;
