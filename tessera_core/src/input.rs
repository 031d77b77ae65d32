// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input event payloads shared by the control layer and the client sink.
//!
//! Timestamps are the device's millisecond clock, wrapped to 32 bits.

/// Whether a key went down or up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyState {
    /// Key released.
    Released,
    /// Key pressed.
    Pressed,
}

/// Whether a pointer button went down or up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ButtonState {
    /// Button released.
    Released,
    /// Button pressed.
    Pressed,
}

/// A key press or release.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    /// Device timestamp in milliseconds.
    pub time_msec: u32,
    /// Evdev keycode.
    pub keycode: u32,
    /// Press or release.
    pub state: KeyState,
    /// Keysym names resolved by the keymap, unmodified level first.
    pub keysyms: Vec<String>,
}

impl KeyEvent {
    /// Keysym names concatenated, as handed to the control layer.
    #[must_use]
    pub fn keysym_names(&self) -> String {
        self.keysyms.concat()
    }
}

/// Keyboard modifier state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Modifiers currently held.
    pub depressed: u32,
    /// Latched modifiers (sticky keys).
    pub latched: u32,
    /// Locked modifiers (caps lock, num lock).
    pub locked: u32,
    /// Active layout group.
    pub group: u32,
}

/// Pointer motion, after the cursor applied it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionEvent {
    /// Horizontal delta in layout units.
    pub dx: f64,
    /// Vertical delta in layout units.
    pub dy: f64,
    /// Resulting cursor x.
    pub abs_x: f64,
    /// Resulting cursor y.
    pub abs_y: f64,
    /// Device timestamp in milliseconds.
    pub time_msec: u32,
}

/// A pointer button press or release.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonEvent {
    /// Device timestamp in milliseconds.
    pub time_msec: u32,
    /// Evdev button code.
    pub button: u32,
    /// Press or release.
    pub state: ButtonState,
}

/// What produced a scroll event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisSource {
    /// A discrete mouse wheel.
    Wheel,
    /// A touchpad finger.
    Finger,
    /// A continuous source such as a trackpoint.
    Continuous,
    /// A tilting wheel.
    WheelTilt,
}

/// Scroll direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisOrientation {
    /// Vertical scroll.
    Vertical,
    /// Horizontal scroll.
    Horizontal,
}

/// A scroll event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisEvent {
    /// Device timestamp in milliseconds.
    pub time_msec: u32,
    /// Source device kind.
    pub source: AxisSource,
    /// Direction.
    pub orientation: AxisOrientation,
    /// Continuous delta.
    pub delta: f64,
    /// Discrete steps (wheel clicks), zero for continuous sources.
    pub delta_discrete: i32,
}

/// Touchpad gesture family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureKind {
    /// Multi-finger swipe.
    Swipe,
    /// Pinch or rotate.
    Pinch,
    /// Fingers resting on the pad.
    Hold,
}

/// Stage within a gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GesturePhase {
    /// The gesture started.
    Begin,
    /// The gesture moved.
    Update,
    /// The gesture finished or was cancelled.
    End,
}

/// One touchpad gesture event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureEvent {
    /// Gesture family.
    pub kind: GestureKind,
    /// Stage.
    pub phase: GesturePhase,
    /// Device timestamp in milliseconds.
    pub time_msec: u32,
    /// Finger count (begin only).
    pub fingers: u32,
    /// Whether the gesture was cancelled (end only).
    pub cancelled: bool,
    /// Horizontal delta (update only).
    pub dx: f64,
    /// Vertical delta (update only).
    pub dy: f64,
    /// Rotation in degrees (pinch update only).
    pub rotation: f64,
    /// Absolute scale (pinch update only).
    pub scale: f64,
}

impl GestureEvent {
    /// A begin event.
    #[must_use]
    pub const fn begin(kind: GestureKind, time_msec: u32, fingers: u32) -> Self {
        Self {
            kind,
            phase: GesturePhase::Begin,
            time_msec,
            fingers,
            cancelled: false,
            dx: 0.0,
            dy: 0.0,
            rotation: 0.0,
            scale: 1.0,
        }
    }

    /// An update event.
    #[must_use]
    pub const fn update(kind: GestureKind, time_msec: u32, dx: f64, dy: f64) -> Self {
        Self {
            phase: GesturePhase::Update,
            dx,
            dy,
            ..Self::begin(kind, time_msec, 0)
        }
    }

    /// An end event.
    #[must_use]
    pub const fn end(kind: GestureKind, time_msec: u32, cancelled: bool) -> Self {
        Self {
            phase: GesturePhase::End,
            cancelled,
            ..Self::begin(kind, time_msec, 0)
        }
    }

    /// Tag naming kind and phase, e.g. `"swipe_begin"`.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match (self.kind, self.phase) {
            (GestureKind::Swipe, GesturePhase::Begin) => "swipe_begin",
            (GestureKind::Swipe, GesturePhase::Update) => "swipe_update",
            (GestureKind::Swipe, GesturePhase::End) => "swipe_end",
            (GestureKind::Pinch, GesturePhase::Begin) => "pinch_begin",
            (GestureKind::Pinch, GesturePhase::Update) => "pinch_update",
            (GestureKind::Pinch, GesturePhase::End) => "pinch_end",
            (GestureKind::Hold, GesturePhase::Begin) => "hold_begin",
            (GestureKind::Hold, GesturePhase::Update) => "hold_update",
            (GestureKind::Hold, GesturePhase::End) => "hold_end",
        }
    }
}
