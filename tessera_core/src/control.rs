// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The control-layer contract.
//!
//! The control layer is the external policy engine (typically a scripting
//! runtime) that arranges contents and gets first refusal on every input
//! event. It is injected into the [`Compositor`] and called synchronously on
//! the main loop; a slow callback stalls frame production.
//!
//! Every callback receives the compositor mutably, so it can react by
//! mutating contents directly. While a callback runs the control layer is
//! detached from the compositor. Nested input callbacks triggered by those
//! mutations return their defaults; notifications (layout changes, view
//! creation, destruction and events) are queued and delivered in order once
//! the outer callback returns.
//!
//! Input callbacks return `Ok(true)` to intercept the event, which keeps it
//! from reaching clients. An `Err` is logged and treated as "not
//! intercepted".

use std::collections::VecDeque;

use crate::Compositor;
use crate::content::ContentId;
use crate::error::ControlError;
use crate::input::{AxisEvent, ButtonEvent, GestureEvent, KeyEvent, Modifiers, MotionEvent};

/// One output as reported to the control layer after a layout change.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputInfo {
    /// Output name.
    pub name: String,
    /// Key valid until the next layout change.
    pub key: i32,
    /// Device scale factor.
    pub scale: f64,
    /// Effective width in layout units.
    pub width: i32,
    /// Effective height in layout units.
    pub height: i32,
    /// Horizontal layout position.
    pub x: i32,
    /// Vertical layout position.
    pub y: i32,
}

/// Callbacks into the external control layer.
///
/// All methods default to doing nothing and not intercepting.
pub trait ControlLayer {
    /// The output set or its geometry changed.
    fn layout_changed(
        &mut self,
        comp: &mut Compositor,
        outputs: &[OutputInfo],
    ) -> Result<(), ControlError> {
        _ = (comp, outputs);
        Ok(())
    }

    /// A key was pressed or released.
    fn key(&mut self, comp: &mut Compositor, event: &KeyEvent) -> Result<bool, ControlError> {
        _ = (comp, event);
        Ok(false)
    }

    /// The modifier state changed.
    fn modifiers(
        &mut self,
        comp: &mut Compositor,
        modifiers: &Modifiers,
    ) -> Result<bool, ControlError> {
        _ = (comp, modifiers);
        Ok(false)
    }

    /// The pointer moved.
    fn motion(&mut self, comp: &mut Compositor, event: &MotionEvent) -> Result<bool, ControlError> {
        _ = (comp, event);
        Ok(false)
    }

    /// A pointer button changed state.
    fn button(&mut self, comp: &mut Compositor, event: &ButtonEvent) -> Result<bool, ControlError> {
        _ = (comp, event);
        Ok(false)
    }

    /// A scroll event arrived.
    fn axis(&mut self, comp: &mut Compositor, event: &AxisEvent) -> Result<bool, ControlError> {
        _ = (comp, event);
        Ok(false)
    }

    /// A touchpad gesture event arrived.
    fn gesture(
        &mut self,
        comp: &mut Compositor,
        event: &GestureEvent,
    ) -> Result<bool, ControlError> {
        _ = (comp, event);
        Ok(false)
    }

    /// A client view was created.
    fn view_created(&mut self, comp: &mut Compositor, view: ContentId) -> Result<(), ControlError> {
        _ = (comp, view);
        Ok(())
    }

    /// A client view is about to be destroyed.
    ///
    /// When the view is destroyed from inside another callback this arrives
    /// after that callback returns, and the view is already gone.
    fn view_destroyed(
        &mut self,
        comp: &mut Compositor,
        view: ContentId,
    ) -> Result<(), ControlError> {
        _ = (comp, view);
        Ok(())
    }

    /// A client view reported an event (e.g. `"request_fullscreen"`).
    fn view_event(
        &mut self,
        comp: &mut Compositor,
        view: ContentId,
        event: &str,
    ) -> Result<(), ControlError> {
        _ = (comp, view, event);
        Ok(())
    }

    /// Synchronous per-frame update, throttled to the refresh output.
    fn update(&mut self, comp: &mut Compositor) -> Result<(), ControlError> {
        _ = comp;
        Ok(())
    }

    /// The backend started and clients can connect.
    fn ready(&mut self, comp: &mut Compositor) -> Result<(), ControlError> {
        _ = comp;
        Ok(())
    }
}

/// A control layer that never intercepts anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughControl;

impl ControlLayer for PassthroughControl {}

/// A notification raised while the control layer was busy.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Notice {
    LayoutChanged(Vec<OutputInfo>),
    ViewCreated(ContentId),
    ViewDestroyed(ContentId),
    ViewEvent(ContentId, String),
}

/// Notifications waiting for the running callback to return.
#[derive(Debug, Default)]
pub(crate) struct Deferred {
    busy: bool,
    queue: VecDeque<Notice>,
}

impl Compositor {
    /// Runs a control-layer callback with the layer detached.
    ///
    /// Returns `default` if no layer is installed, if the layer is already
    /// running a callback, or if the callback fails. Notices raised during
    /// the callback are delivered before this returns.
    pub(crate) fn call_control<T>(
        &mut self,
        name: &'static str,
        default: T,
        f: impl FnOnce(&mut dyn ControlLayer, &mut Self) -> Result<T, ControlError>,
    ) -> T {
        let Some(mut layer) = self.control.take() else {
            tracing::trace!(callback = name, "no control layer attached");
            return default;
        };
        let outer = core::mem::replace(&mut self.deferred.busy, true);
        let result = f(layer.as_mut(), self);
        self.deferred.busy = outer;
        // A callback may have installed a replacement; the newest wins.
        if self.control.is_none() {
            self.control = Some(layer);
        }
        let value = match result {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(callback = name, %err, "control callback failed");
                default
            }
        };
        if !outer {
            while let Some(notice) = self.deferred.queue.pop_front() {
                self.deliver(notice);
            }
        }
        value
    }

    /// Sends a notification now, or after the running callback returns.
    pub(crate) fn notify_control(&mut self, notice: Notice) {
        if self.deferred.busy {
            tracing::trace!(?notice, "notification deferred");
            self.deferred.queue.push_back(notice);
        } else {
            self.deliver(notice);
        }
    }

    fn deliver(&mut self, notice: Notice) {
        match notice {
            Notice::LayoutChanged(infos) => {
                self.call_control("layout_changed", (), |layer, comp| {
                    layer.layout_changed(comp, &infos)
                });
            }
            Notice::ViewCreated(id) => {
                self.call_control("view_created", (), |layer, comp| layer.view_created(comp, id));
            }
            Notice::ViewDestroyed(id) => {
                self.call_control("view_destroyed", (), |layer, comp| {
                    layer.view_destroyed(comp, id)
                });
            }
            Notice::ViewEvent(id, event) => {
                self.call_control("view_event", (), |layer, comp| {
                    layer.view_event(comp, id, &event)
                });
            }
        }
    }
}
