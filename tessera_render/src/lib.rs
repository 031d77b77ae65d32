// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layered frame composition and per-output frame production for tessera.
//!
//! This crate sits between [`tessera_core`]'s scene and a drawing backend.
//! It decides what to draw and in which order; the backend implements
//! [`Renderer`] and does the drawing:
//!
//! - [`ComposeChain`]: the frame's z-bands, split at composite-effect layers
//! - [`RenderPlan`]: the draw calls for one frame, grouped by band
//! - [`Renderer`]: the backend contract
//! - [`FrameProducer`]: the frame callback driving all of the above
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Forwards to `tessera_core/trace`, so
//!   frame production reports to a [`TraceSink`](tessera_core::trace::TraceSink).

#![cfg_attr(docsrs, feature(doc_cfg))]

mod chain;
mod frame;
mod plan;
mod renderer;

pub use chain::{Band, ComposeChain};
pub use frame::{FrameOutcome, FrameProducer};
pub use plan::{BandPlan, CLEAR_COLOR, EffectPass, RenderItem, RenderPlan};
pub use renderer::{Renderer, Target};
