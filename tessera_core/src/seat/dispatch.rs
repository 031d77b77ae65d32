// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input dispatch.
//!
//! Every event is offered to the control layer first. An intercepted event
//! never reaches a client; otherwise it goes to the surface under the
//! pointer (or to the grabbed surface while a [`Seatop`] is active) or to the
//! keyboard-focused surface. Each `notify_*` method returns `true` if a
//! client surface received the event.

use kurbo::Rect;

use super::{DeviceId, Seatop};
use crate::Compositor;
use crate::content::{ContentId, FINE_EPSILON, SurfaceId};
use crate::error::SceneError;
use crate::input::{
    AxisEvent, ButtonEvent, ButtonState, GestureEvent, GesturePhase, KeyEvent, KeyState,
    Modifiers, MotionEvent,
};

/// A hit-test result: the view and surface under a point, and the point in
/// surface-local units.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Hit {
    view: ContentId,
    surface: SurfaceId,
    sx: f64,
    sy: f64,
    xm: f64,
    ym: f64,
}

impl Compositor {
    // -- Devices --

    /// Attaches a keyboard to the seat.
    pub fn add_keyboard(&mut self, device: DeviceId, name: &str) {
        tracing::info!(?device, name, "keyboard attached");
        self.seat.add_keyboard(device, name);
    }

    /// Attaches a pointer to the cursor.
    pub fn add_pointer(&mut self, device: DeviceId, name: &str) {
        tracing::info!(?device, name, "pointer attached");
        self.seat.add_pointer(device, name);
    }

    /// Detaches a device. Returns `false` if it was not attached.
    pub fn remove_device(&mut self, device: DeviceId) -> bool {
        let removed = self.seat.remove_device(device);
        if removed {
            tracing::info!(?device, "input device removed");
        }
        removed
    }

    // -- Keyboard --

    /// A key changed state.
    pub fn notify_key(&mut self, event: &KeyEvent) -> bool {
        if self.seat.debug() && event.state == KeyState::Pressed && event.keysym_names() == "F1" {
            let mut out = String::new();
            if self.dump(&mut out).is_ok() {
                tracing::info!("debug dump\n{out}");
            }
        }
        if self.call_control("key", false, |layer, comp| layer.key(comp, event)) {
            return false;
        }
        let Some((_, surface)) = self.seat.keyboard_focus else {
            return false;
        };
        self.clients.key(surface, event);
        true
    }

    /// The modifier state changed.
    pub fn notify_modifiers(&mut self, modifiers: &Modifiers) -> bool {
        if self.call_control("modifiers", false, |layer, comp| {
            layer.modifiers(comp, modifiers)
        }) {
            return false;
        }
        let Some((_, surface)) = self.seat.keyboard_focus else {
            return false;
        };
        self.clients.modifiers(surface, modifiers);
        true
    }

    /// Gives keyboard focus to a view's root surface.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content,
    /// [`SceneError::WrongKind`] if it is not a view.
    pub fn focus_view(&mut self, id: ContentId) -> Result<(), SceneError> {
        let content = self.contents.get(id).ok_or(SceneError::StaleContent(id))?;
        let view = content.kind().as_view().ok_or(SceneError::WrongKind {
            id,
            expected: "view",
        })?;
        let target = (id, view.surface);
        if self.seat.keyboard_focus == Some(target) {
            return Ok(());
        }
        if let Some((_, old)) = self.seat.keyboard_focus.take() {
            self.clients.keyboard_leave(old);
        }
        self.clients.keyboard_enter(target.1);
        self.seat.keyboard_focus = Some(target);
        Ok(())
    }

    /// Removes keyboard focus from whatever holds it.
    pub fn clear_focus(&mut self) {
        if let Some((_, old)) = self.seat.keyboard_focus.take() {
            self.clients.keyboard_leave(old);
        }
    }

    // -- Pointer --

    /// Relative pointer motion.
    ///
    /// The cursor is clamped to the output area. If the control layer
    /// intercepts, the cursor goes back to where it was.
    pub fn notify_motion(&mut self, dx: f64, dy: f64, time_msec: u32) -> bool {
        self.seat.cursor.set_last_time_msec(time_msec);
        let (ox, oy) = self.seat.cursor.position();
        let (x, y) = self.layout.closest_point(ox + dx, oy + dy);
        self.seat.cursor.move_to(x, y);
        let event = MotionEvent {
            dx,
            dy,
            abs_x: x,
            abs_y: y,
            time_msec,
        };
        if self.call_control("motion", false, |layer, comp| layer.motion(comp, &event)) {
            self.seat.cursor.move_to(ox, oy);
            return false;
        }
        self.cursor_update(time_msec)
    }

    /// Absolute pointer motion in normalized device coordinates `[0, 1]`,
    /// mapped onto the layout extents.
    ///
    /// If the control layer intercepts, the cursor does not move.
    pub fn notify_motion_absolute(&mut self, nx: f64, ny: f64, time_msec: u32) -> bool {
        self.seat.cursor.set_last_time_msec(time_msec);
        let extents = self.layout.extents().unwrap_or(Rect::ZERO);
        let x = extents.x0 + nx * extents.width();
        let y = extents.y0 + ny * extents.height();
        let (ox, oy) = self.seat.cursor.position();
        let event = MotionEvent {
            dx: x - ox,
            dy: y - oy,
            abs_x: x,
            abs_y: y,
            time_msec,
        };
        if self.call_control("motion", false, |layer, comp| layer.motion(comp, &event)) {
            return false;
        }
        self.seat.cursor.move_to(x, y);
        self.cursor_update(time_msec)
    }

    /// A pointer button changed state.
    ///
    /// An intercepted button ends any active interaction.
    pub fn notify_button(&mut self, event: &ButtonEvent) -> bool {
        if self.call_control("button", false, |layer, comp| layer.button(comp, event)) {
            self.kill_seatop();
            return false;
        }

        let target = match (event.state, self.seat.seatop) {
            (_, Some(op)) => Some(op.surface),
            (ButtonState::Pressed, None) => {
                let (x, y) = self.seat.cursor.position();
                let hit = self.hit_test(x, y);
                if let Some(hit) = hit {
                    tracing::debug!(content = ?hit.view, "pointer interaction started");
                    self.seat.seatop = Some(Seatop {
                        view: hit.view,
                        surface: hit.surface,
                        x0: x,
                        y0: y,
                        xm: hit.xm,
                        ym: hit.ym,
                    });
                }
                hit.map(|h| h.surface)
            }
            (ButtonState::Released, None) => self.seat.pointer_focus(),
        };
        if event.state == ButtonState::Released {
            self.seat.seatop = None;
        }
        let Some(surface) = target else {
            return false;
        };
        self.clients
            .pointer_button(surface, event.time_msec, event.button, event.state);
        true
    }

    /// A scroll event.
    pub fn notify_axis(&mut self, event: &AxisEvent) -> bool {
        if self.call_control("axis", false, |layer, comp| layer.axis(comp, event)) {
            return false;
        }
        let target = self
            .seat
            .seatop
            .map(|op| op.surface)
            .or_else(|| self.seat.pointer_focus());
        let Some(surface) = target else {
            return false;
        };
        self.clients.pointer_axis(surface, event);
        true
    }

    /// Ends a group of pointer events.
    pub fn notify_pointer_frame(&mut self) {
        self.clients.pointer_frame();
    }

    /// A touchpad gesture event.
    ///
    /// Gestures go to the pointer-focused surface and are dropped when the
    /// pointer is over nothing. A begin that reaches a client is always
    /// followed by an end, even if the control layer intercepts the end.
    pub fn notify_gesture(&mut self, event: &GestureEvent) -> bool {
        let intercepted = self.call_control("gesture", false, |layer, comp| {
            layer.gesture(comp, event)
        });
        let focus = self.seat.pointer_focus();
        match event.phase {
            GesturePhase::Begin => {
                if intercepted || focus.is_none() {
                    return false;
                }
                self.seat.cursor.set_gesture_started(event.kind, true);
            }
            GesturePhase::Update => {
                if intercepted {
                    return false;
                }
            }
            GesturePhase::End => {
                let started = self.seat.cursor.gesture_started(event.kind);
                self.seat.cursor.set_gesture_started(event.kind, false);
                if intercepted && !started {
                    return false;
                }
            }
        }
        let Some(surface) = focus else {
            return false;
        };
        self.clients.gesture(surface, event);
        true
    }

    /// Ends the active pointer interaction, if any.
    pub fn kill_seatop(&mut self) {
        if let Some(op) = self.seat.seatop.take() {
            tracing::debug!(content = ?op.view, "pointer interaction cancelled");
        }
    }

    // -- Focus --

    /// Delivers the current cursor position to the grabbed surface, or to
    /// whatever surface is under the cursor with enter/leave as needed.
    pub(crate) fn dispatch_motion(&mut self, time_msec: u32) -> bool {
        let (x, y) = self.seat.cursor.position();
        if let Some(op) = self.seat.seatop {
            if let Some(content) = self.contents.get(op.view) {
                let b = content.display_box();
                let (sx, sy) = op.to_surface((b.x, b.y), x, y);
                self.clients.pointer_motion(op.surface, time_msec, sx, sy);
                return true;
            }
            self.seat.seatop = None;
        }

        let hit = self.hit_test(x, y);
        let focus = hit.map(|h| (h.view, h.surface));
        if self.seat.pointer_focus != focus {
            if let Some((_, old)) = self.seat.pointer_focus.take() {
                self.clients.pointer_leave(old);
            }
            if let Some(hit) = hit {
                self.clients.pointer_enter(hit.surface, hit.sx, hit.sy);
            }
            self.seat.pointer_focus = focus;
        }
        let Some(hit) = hit else {
            return false;
        };
        self.clients
            .pointer_motion(hit.surface, time_msec, hit.sx, hit.sy);
        true
    }

    /// The topmost view whose visible area contains `(x, y)`.
    fn hit_test(&mut self, x: f64, y: f64) -> Option<Hit> {
        self.contents.update_z_order();
        let locked = self.is_locked();
        self.contents.z_ordered().rev().find_map(|(id, content)| {
            let view = content.kind().as_view()?;
            if content.opacity() < FINE_EPSILON || (locked && !content.lock_enabled()) {
                return None;
            }
            let b = content.display_box();
            let inside = |r: Rect| x >= r.x0 && x < r.x1 && y >= r.y0 && y < r.y1;
            if !inside(b.to_rect()) {
                return None;
            }
            if let Some(ws) = content.workspace()
                && !inside(ws.to_rect())
            {
                return None;
            }
            let (sw, sh) = view.surface_size;
            let xm = if sw > 0 { f64::from(sw) / b.width } else { 1.0 };
            let ym = if sh > 0 { f64::from(sh) / b.height } else { 1.0 };
            Some(Hit {
                view: id,
                surface: view.surface,
                sx: (x - b.x) * xm,
                sy: (y - b.y) * ym,
                xm,
                ym,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompositorConfig;
    use crate::content::{ContentBox, View};
    use crate::input::GestureKind;
    use crate::output::{Mode, OutputDescriptor};
    use crate::testing::{ClientCall, RecordingClients, RecordingControl};

    fn scene() -> (Compositor, RecordingClients, RecordingControl, ContentId) {
        let mut comp = Compositor::new(CompositorConfig::default());
        let clients = RecordingClients::new();
        let control = RecordingControl::new();
        comp.set_clients(Box::new(clients.clone()));
        comp.set_control(Box::new(control.clone()));
        comp.add_output(
            OutputDescriptor::new("DP-1").with_mode(Mode::new(800, 600, 60000).preferred()),
        );
        let view = comp.create_view(View::new(SurfaceId(1)).with_surface_size(200, 200));
        comp.set_box(view, ContentBox::new(100.0, 100.0, 100.0, 100.0))
            .unwrap();
        clients.take();
        (comp, clients, control, view)
    }

    fn press(state: ButtonState) -> ButtonEvent {
        ButtonEvent {
            time_msec: 0,
            button: 272,
            state,
        }
    }

    #[test]
    fn motion_enters_and_leaves_views() {
        let (mut comp, clients, _, _) = scene();
        assert!(comp.notify_motion(150.0, 150.0, 1));
        assert_eq!(
            clients.take(),
            vec![
                ClientCall::PointerEnter(SurfaceId(1)),
                ClientCall::PointerMotion(SurfaceId(1), 100.0, 100.0)
            ],
            "surface coordinates follow the multiplier"
        );
        assert!(!comp.notify_motion(200.0, 0.0, 2));
        assert_eq!(clients.take(), vec![ClientCall::PointerLeave(SurfaceId(1))]);
    }

    #[test]
    fn intercepted_relative_motion_rolls_back() {
        let (mut comp, clients, control, _) = scene();
        comp.notify_motion(10.0, 10.0, 1);
        control.set_intercept("motion", true);
        assert!(!comp.notify_motion(140.0, 140.0, 2));
        assert_eq!(comp.seat().cursor().position(), (10.0, 10.0));
        assert!(clients.take().is_empty());
    }

    #[test]
    fn relative_motion_is_clamped_to_outputs() {
        let (mut comp, _, _, _) = scene();
        comp.notify_motion(-50.0, -50.0, 1);
        assert_eq!(comp.seat().cursor().position(), (0.0, 0.0));
    }

    #[test]
    fn intercepted_absolute_motion_does_not_move() {
        let (mut comp, _, control, _) = scene();
        control.set_intercept("motion", true);
        comp.notify_motion_absolute(0.5, 0.5, 1);
        assert_eq!(comp.seat().cursor().position(), (0.0, 0.0));
        control.set_intercept("motion", false);
        comp.notify_motion_absolute(0.5, 0.5, 2);
        assert_eq!(comp.seat().cursor().position(), (400.0, 300.0));
    }

    #[test]
    fn press_grabs_until_release() {
        let (mut comp, clients, _, view) = scene();
        comp.notify_motion(150.0, 150.0, 1);
        assert!(comp.notify_button(&press(ButtonState::Pressed)));
        assert_eq!(comp.seat().seatop().map(|op| op.view), Some(view));

        // Outside the view the grabbed surface keeps receiving motion.
        clients.take();
        assert!(comp.notify_motion(200.0, 0.0, 2));
        assert_eq!(
            clients.take(),
            vec![ClientCall::PointerMotion(SurfaceId(1), 500.0, 100.0)]
        );

        assert!(comp.notify_button(&press(ButtonState::Released)));
        assert!(comp.seat().seatop().is_none());
    }

    #[test]
    fn intercepted_button_kills_seatop() {
        let (mut comp, clients, control, _) = scene();
        comp.notify_motion(150.0, 150.0, 1);
        comp.notify_button(&press(ButtonState::Pressed));
        clients.take();
        control.set_intercept("button", true);
        assert!(!comp.notify_button(&press(ButtonState::Released)));
        assert!(comp.seat().seatop().is_none());
        assert!(clients.take().is_empty());
    }

    #[test]
    fn press_over_nothing_starts_nothing() {
        let (mut comp, clients, _, _) = scene();
        comp.notify_motion(10.0, 10.0, 1);
        assert!(!comp.notify_button(&press(ButtonState::Pressed)));
        assert!(comp.seat().seatop().is_none());
        assert!(clients.take().is_empty());
    }

    #[test]
    fn gesture_begin_and_end_pair_up() {
        let (mut comp, clients, control, _) = scene();
        let kind = GestureKind::Swipe;
        let count = |clients: &RecordingClients| {
            let sent = clients.take();
            let tagged = |suffix: &str| {
                sent.iter()
                    .filter(|s| matches!(s, ClientCall::Gesture(tag) if tag.ends_with(suffix)))
                    .count()
            };
            (tagged("_begin"), tagged("_end"))
        };
        comp.notify_motion(150.0, 150.0, 1);
        clients.take();

        // Begin forwarded, end intercepted: the end still reaches the client.
        comp.notify_gesture(&GestureEvent::begin(kind, 0, 3));
        control.set_intercept("gesture", true);
        assert!(!comp.notify_gesture(&GestureEvent::update(kind, 1, 1.0, 0.0)));
        assert!(comp.notify_gesture(&GestureEvent::end(kind, 2, false)));
        assert_eq!(count(&clients), (1, 1));
        assert!(!comp.seat().cursor().gesture_started(kind));

        // Begin intercepted, end intercepted: the client sees neither.
        comp.notify_gesture(&GestureEvent::begin(kind, 3, 3));
        comp.notify_gesture(&GestureEvent::end(kind, 4, true));
        assert_eq!(count(&clients), (0, 0));

        // Pinch state is independent of swipe state.
        control.set_intercept("gesture", false);
        comp.notify_gesture(&GestureEvent::begin(GestureKind::Pinch, 5, 2));
        assert!(comp.seat().cursor().gesture_started(GestureKind::Pinch));
        assert!(!comp.seat().cursor().gesture_started(kind));
        comp.notify_gesture(&GestureEvent::end(GestureKind::Pinch, 6, false));
        assert_eq!(count(&clients), (1, 1));
    }

    #[test]
    fn gestures_over_nothing_reach_no_client() {
        let (mut comp, clients, _, _) = scene();
        let kind = GestureKind::Swipe;
        comp.notify_motion(10.0, 10.0, 1);
        clients.take();
        assert_eq!(comp.seat().pointer_focus(), None, "pointer is over the background");

        assert!(!comp.notify_gesture(&GestureEvent::begin(kind, 0, 3)));
        assert!(!comp.seat().cursor().gesture_started(kind), "nobody to pair an end with");
        assert!(!comp.notify_gesture(&GestureEvent::update(kind, 1, 1.0, 0.0)));
        assert!(!comp.notify_gesture(&GestureEvent::end(kind, 2, false)));
        assert!(clients.take().is_empty(), "no gesture without a focused surface");
    }

    #[test]
    fn keys_go_to_the_focused_view() {
        let (mut comp, clients, control, view) = scene();
        let key = KeyEvent {
            time_msec: 0,
            keycode: 30,
            state: KeyState::Pressed,
            keysyms: vec!["a".into()],
        };
        assert!(!comp.notify_key(&key), "no focus yet");
        comp.focus_view(view).unwrap();
        assert!(comp.notify_key(&key));
        comp.clear_focus();
        assert_eq!(
            clients.take(),
            vec![
                ClientCall::KeyboardEnter(SurfaceId(1)),
                ClientCall::Key(SurfaceId(1), 30),
                ClientCall::KeyboardLeave(SurfaceId(1))
            ]
        );

        control.set_intercept("key", true);
        comp.focus_view(view).unwrap();
        clients.take();
        assert!(!comp.notify_key(&key));
        assert!(clients.take().is_empty());
    }

    #[test]
    fn destroying_a_view_drops_its_focus() {
        let (mut comp, clients, _, view) = scene();
        comp.focus_view(view).unwrap();
        comp.notify_motion(150.0, 150.0, 1);
        comp.notify_button(&press(ButtonState::Pressed));
        comp.destroy(view).unwrap();
        assert!(comp.seat().seatop().is_none());
        assert!(comp.seat().focused_view().is_none());
        assert!(comp.seat().pointer_focus().is_none());
        assert!(clients.take().contains(&ClientCall::KeyboardLeave(SurfaceId(1))));
    }
}
