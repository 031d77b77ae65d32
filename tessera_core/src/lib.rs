// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene, damage, output layout and input core for a compositing display
//! server.
//!
//! Everything hangs off one [`Compositor`], which lives on the main loop and
//! is handed by reference to every entry point:
//!
//! ```text
//!   Backend events ──► add_output / output_state_changed / notify_*
//!                                 │
//!                                 ▼
//!   Control layer ◄──── Compositor ────► ClientSink
//!   (policy, may                  │       (enter/leave, input)
//!    intercept input)             ▼
//!                         Output::damage ──► frame production
//! ```
//!
//! **[`content`]**: the registry of renderable contents (client views,
//! widgets, composite effects, the drag icon) behind generational
//! [`ContentId`](content::ContentId) handles. Every property change damages
//! the affected outputs.
//!
//! **[`damage`]**: integer rectangles, regions, and the per-output damage
//! ring that answers "what changed since the buffer of age N was drawn".
//!
//! **[`output`]** and **[`layout`]**: output modes, transforms, scale, the
//! arrangement of outputs in the global layout space, and the refresh
//! master that paces control-layer updates.
//!
//! **[`seat`]**: the cursor, keyboard focus, pointer focus with
//! enter/leave, pointer interactions and gesture pairing.
//!
//! **[`control`]** and **[`client`]**: the two outward contracts. The
//! control layer is offered every input event first; the client sink
//! receives what clients observe.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) events for frame-loop
//! instrumentation, behind a [`Tracer`](trace::Tracer) that compiles away
//! without the `trace` feature.
//!
//! Rendering itself lives in `tessera_render`.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies.
//! - `testing` (disabled by default): Exposes recording doubles for the
//!   control layer and the client sink in [`testing`].

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod client;
mod compositor;
pub mod config;
pub mod content;
pub mod control;
pub mod damage;
pub mod error;
pub mod input;
pub mod layout;
pub mod output;
pub mod seat;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod time;
pub mod trace;

pub use compositor::{Compositor, RequestHandle};
