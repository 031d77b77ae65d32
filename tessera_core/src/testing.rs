// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording test doubles for the control layer and the client sink.
//!
//! Both doubles are cheap handles over a shared log: keep a clone, install
//! the other one into the [`Compositor`], then inspect the clone.

use std::cell::RefCell;
use std::rc::Rc;

use crate::Compositor;
use crate::client::ClientSink;
use crate::content::{ContentId, SurfaceId};
use crate::control::{ControlLayer, OutputInfo};
use crate::error::ControlError;
use crate::input::{AxisEvent, ButtonEvent, ButtonState, GestureEvent, KeyEvent, Modifiers, MotionEvent};
use crate::output::OutputId;

// ---------------------------------------------------------------------------
// Control layer
// ---------------------------------------------------------------------------

/// One control-layer callback as recorded by [`RecordingControl`].
#[derive(Clone, Debug, PartialEq)]
pub enum ControlCall {
    /// `layout_changed`.
    LayoutChanged(Vec<OutputInfo>),
    /// `key`, with the joined keysym names.
    Key(String),
    /// `modifiers`.
    Modifiers(Modifiers),
    /// `motion`, with the resulting cursor position.
    Motion(f64, f64),
    /// `button`.
    Button(u32, ButtonState),
    /// `axis`.
    Axis(f64),
    /// `gesture`, with its kind/phase tag.
    Gesture(&'static str),
    /// `view_created`.
    ViewCreated(ContentId),
    /// `view_destroyed`.
    ViewDestroyed(ContentId),
    /// `view_event`.
    ViewEvent(ContentId, String),
    /// `update`.
    Update,
    /// `ready`.
    Ready,
}

#[derive(Debug, Default)]
struct ControlState {
    calls: Vec<ControlCall>,
    intercept: Vec<&'static str>,
}

/// A [`ControlLayer`] that records every callback and intercepts the input
/// callbacks it is told to.
#[derive(Clone, Debug, Default)]
pub struct RecordingControl {
    state: Rc<RefCell<ControlState>>,
}

impl RecordingControl {
    /// Creates a recorder that intercepts nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the named input callback (`"key"`, `"motion"`, `"button"`,
    /// `"axis"`, `"gesture"`, `"modifiers"`) intercept, or stop intercepting.
    pub fn set_intercept(&self, callback: &'static str, intercept: bool) {
        let mut state = self.state.borrow_mut();
        state.intercept.retain(|c| *c != callback);
        if intercept {
            state.intercept.push(callback);
        }
    }

    /// Every call so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ControlCall> {
        self.state.borrow().calls.clone()
    }

    /// Returns and clears the recorded calls.
    pub fn take(&self) -> Vec<ControlCall> {
        core::mem::take(&mut self.state.borrow_mut().calls)
    }

    fn record(&self, call: ControlCall) {
        self.state.borrow_mut().calls.push(call);
    }

    fn decide(&self, callback: &'static str, call: ControlCall) -> Result<bool, ControlError> {
        self.record(call);
        Ok(self.state.borrow().intercept.contains(&callback))
    }
}

impl ControlLayer for RecordingControl {
    fn layout_changed(&mut self, _: &mut Compositor, outputs: &[OutputInfo]) -> Result<(), ControlError> {
        self.record(ControlCall::LayoutChanged(outputs.to_vec()));
        Ok(())
    }

    fn key(&mut self, _: &mut Compositor, event: &KeyEvent) -> Result<bool, ControlError> {
        self.decide("key", ControlCall::Key(event.keysym_names()))
    }

    fn modifiers(&mut self, _: &mut Compositor, modifiers: &Modifiers) -> Result<bool, ControlError> {
        self.decide("modifiers", ControlCall::Modifiers(*modifiers))
    }

    fn motion(&mut self, _: &mut Compositor, event: &MotionEvent) -> Result<bool, ControlError> {
        self.decide("motion", ControlCall::Motion(event.abs_x, event.abs_y))
    }

    fn button(&mut self, _: &mut Compositor, event: &ButtonEvent) -> Result<bool, ControlError> {
        self.decide("button", ControlCall::Button(event.button, event.state))
    }

    fn axis(&mut self, _: &mut Compositor, event: &AxisEvent) -> Result<bool, ControlError> {
        self.decide("axis", ControlCall::Axis(event.delta))
    }

    fn gesture(&mut self, _: &mut Compositor, event: &GestureEvent) -> Result<bool, ControlError> {
        self.decide("gesture", ControlCall::Gesture(event.tag()))
    }

    fn view_created(&mut self, _: &mut Compositor, view: ContentId) -> Result<(), ControlError> {
        self.record(ControlCall::ViewCreated(view));
        Ok(())
    }

    fn view_destroyed(&mut self, _: &mut Compositor, view: ContentId) -> Result<(), ControlError> {
        self.record(ControlCall::ViewDestroyed(view));
        Ok(())
    }

    fn view_event(&mut self, _: &mut Compositor, view: ContentId, event: &str) -> Result<(), ControlError> {
        self.record(ControlCall::ViewEvent(view, event.to_owned()));
        Ok(())
    }

    fn update(&mut self, _: &mut Compositor) -> Result<(), ControlError> {
        self.record(ControlCall::Update);
        Ok(())
    }

    fn ready(&mut self, _: &mut Compositor) -> Result<(), ControlError> {
        self.record(ControlCall::Ready);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Client sink
// ---------------------------------------------------------------------------

/// One client-facing effect as recorded by [`RecordingClients`].
#[derive(Clone, Debug, PartialEq)]
pub enum ClientCall {
    /// `surface_enter`.
    SurfaceEnter(SurfaceId, OutputId),
    /// `surface_leave`.
    SurfaceLeave(SurfaceId, OutputId),
    /// `pointer_enter`.
    PointerEnter(SurfaceId),
    /// `pointer_leave`.
    PointerLeave(SurfaceId),
    /// `pointer_motion`, with surface-local coordinates.
    PointerMotion(SurfaceId, f64, f64),
    /// `pointer_button`.
    PointerButton(SurfaceId, ButtonState),
    /// `pointer_axis`.
    PointerAxis(SurfaceId),
    /// `pointer_frame`.
    PointerFrame,
    /// `gesture`, with its kind/phase tag.
    Gesture(&'static str),
    /// `keyboard_enter`.
    KeyboardEnter(SurfaceId),
    /// `keyboard_leave`.
    KeyboardLeave(SurfaceId),
    /// `key`, with the keycode.
    Key(SurfaceId, u32),
    /// `modifiers`.
    Modifiers(SurfaceId),
}

/// A [`ClientSink`] that records everything sent to clients.
#[derive(Clone, Debug, Default)]
pub struct RecordingClients {
    calls: Rc<RefCell<Vec<ClientCall>>>,
}

impl RecordingClients {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ClientCall> {
        self.calls.borrow().clone()
    }

    /// Returns and clears the recorded calls.
    pub fn take(&self) -> Vec<ClientCall> {
        core::mem::take(&mut self.calls.borrow_mut())
    }

    fn record(&self, call: ClientCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl ClientSink for RecordingClients {
    fn surface_enter(&mut self, surface: SurfaceId, output: OutputId) {
        self.record(ClientCall::SurfaceEnter(surface, output));
    }

    fn surface_leave(&mut self, surface: SurfaceId, output: OutputId) {
        self.record(ClientCall::SurfaceLeave(surface, output));
    }

    fn pointer_enter(&mut self, surface: SurfaceId, _: f64, _: f64) {
        self.record(ClientCall::PointerEnter(surface));
    }

    fn pointer_leave(&mut self, surface: SurfaceId) {
        self.record(ClientCall::PointerLeave(surface));
    }

    fn pointer_motion(&mut self, surface: SurfaceId, _: u32, sx: f64, sy: f64) {
        self.record(ClientCall::PointerMotion(surface, sx, sy));
    }

    fn pointer_button(&mut self, surface: SurfaceId, _: u32, _: u32, state: ButtonState) {
        self.record(ClientCall::PointerButton(surface, state));
    }

    fn pointer_axis(&mut self, surface: SurfaceId, _: &AxisEvent) {
        self.record(ClientCall::PointerAxis(surface));
    }

    fn pointer_frame(&mut self) {
        self.record(ClientCall::PointerFrame);
    }

    fn gesture(&mut self, _: SurfaceId, event: &GestureEvent) {
        self.record(ClientCall::Gesture(event.tag()));
    }

    fn keyboard_enter(&mut self, surface: SurfaceId) {
        self.record(ClientCall::KeyboardEnter(surface));
    }

    fn keyboard_leave(&mut self, surface: SurfaceId) {
        self.record(ClientCall::KeyboardLeave(surface));
    }

    fn key(&mut self, surface: SurfaceId, event: &KeyEvent) {
        self.record(ClientCall::Key(surface, event.keycode));
    }

    fn modifiers(&mut self, surface: SurfaceId, _: &Modifiers) {
        self.record(ClientCall::Modifiers(surface));
    }
}
