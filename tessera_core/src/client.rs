// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The client-facing side of the core.
//!
//! The wire protocol lives outside the core. Whatever implements it receives
//! the server-side effects that clients observe through a [`ClientSink`]:
//! which outputs a surface is on, and which input events reach it.
//! Surface-local coordinates are in the surface's own units.

use crate::content::SurfaceId;
use crate::input::{AxisEvent, ButtonState, GestureEvent, KeyEvent, Modifiers};
use crate::output::OutputId;

/// Receives everything the core forwards to clients.
///
/// All methods default to no-ops.
pub trait ClientSink {
    /// The surface became visible on an output.
    fn surface_enter(&mut self, surface: SurfaceId, output: OutputId) {
        _ = (surface, output);
    }

    /// The surface is no longer visible on an output.
    fn surface_leave(&mut self, surface: SurfaceId, output: OutputId) {
        _ = (surface, output);
    }

    /// The pointer entered a surface at the given surface-local position.
    fn pointer_enter(&mut self, surface: SurfaceId, sx: f64, sy: f64) {
        _ = (surface, sx, sy);
    }

    /// The pointer left a surface.
    fn pointer_leave(&mut self, surface: SurfaceId) {
        _ = surface;
    }

    /// The pointer moved within the focused surface.
    fn pointer_motion(&mut self, surface: SurfaceId, time_msec: u32, sx: f64, sy: f64) {
        _ = (surface, time_msec, sx, sy);
    }

    /// A button changed state over the focused surface.
    fn pointer_button(&mut self, surface: SurfaceId, time_msec: u32, button: u32, state: ButtonState) {
        _ = (surface, time_msec, button, state);
    }

    /// A scroll event for the focused surface.
    fn pointer_axis(&mut self, surface: SurfaceId, event: &AxisEvent) {
        _ = (surface, event);
    }

    /// Groups the preceding pointer events into one logical frame.
    fn pointer_frame(&mut self) {}

    /// A gesture event for the pointer-focused surface.
    fn gesture(&mut self, surface: SurfaceId, event: &GestureEvent) {
        _ = (surface, event);
    }

    /// The surface gained keyboard focus.
    fn keyboard_enter(&mut self, surface: SurfaceId) {
        _ = surface;
    }

    /// The surface lost keyboard focus.
    fn keyboard_leave(&mut self, surface: SurfaceId) {
        _ = surface;
    }

    /// A key event for the keyboard-focused surface.
    fn key(&mut self, surface: SurfaceId, event: &KeyEvent) {
        _ = (surface, event);
    }

    /// New modifier state for the keyboard-focused surface.
    fn modifiers(&mut self, surface: SurfaceId, modifiers: &Modifiers) {
        _ = (surface, modifiers);
    }
}

/// A [`ClientSink`] that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullClients;

impl ClientSink for NullClients {}
