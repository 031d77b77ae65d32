// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The input seat.
//!
//! A [`Seat`] owns the logical [`Cursor`], the attached keyboards and
//! pointers, keyboard and pointer focus, and at most one in-progress pointer
//! interaction (a [`Seatop`]). Input events enter through the
//! `notify_*` methods on [`Compositor`](crate::Compositor) in
//! [`dispatch`](self) and are offered to the control layer before any client
//! sees them.

mod cursor;
mod dispatch;
mod drag;

pub use cursor::{CURSOR_POSITION_MIN, Cursor, CursorImage, DEFAULT_CURSOR_IMAGE};

use core::fmt;

use crate::config::{CompositorConfig, KeyboardConfig};
use crate::content::{ContentId, SurfaceId};

/// Identifies one input device as reported by the backend.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u32);

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

/// An attached keyboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keyboard {
    /// Backend device.
    pub device: DeviceId,
    /// Device name.
    pub name: String,
    /// Keymap and repeat settings the keyboard was configured with.
    pub settings: KeyboardConfig,
}

/// An attached pointer device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pointer {
    /// Backend device.
    pub device: DeviceId,
    /// Device name.
    pub name: String,
}

/// The single in-progress pointer interaction.
///
/// Started by a button press over a view; while it is active, motion is
/// delivered to the grabbed surface even when the pointer leaves it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Seatop {
    /// The view the interaction started on.
    pub view: ContentId,
    /// The surface that receives the events.
    pub surface: SurfaceId,
    /// Cursor x when the interaction started.
    pub x0: f64,
    /// Cursor y when the interaction started.
    pub y0: f64,
    /// Horizontal factor from layout units to surface units.
    pub xm: f64,
    /// Vertical factor from layout units to surface units.
    pub ym: f64,
}

impl Seatop {
    /// Maps a cursor position into the grabbed surface's coordinates.
    ///
    /// `origin` is the view's box origin at the time of the call.
    #[must_use]
    pub fn to_surface(&self, origin: (f64, f64), x: f64, y: f64) -> (f64, f64) {
        ((x - origin.0) * self.xm, (y - origin.1) * self.ym)
    }
}

/// One input seat.
#[derive(Debug)]
pub struct Seat {
    pub(crate) cursor: Cursor,
    keyboards: Vec<Keyboard>,
    pointers: Vec<Pointer>,
    pub(crate) seatop: Option<Seatop>,
    pub(crate) keyboard_focus: Option<(ContentId, SurfaceId)>,
    pub(crate) pointer_focus: Option<(ContentId, SurfaceId)>,
    pub(crate) drag: Option<ContentId>,
    keyboard_config: KeyboardConfig,
    debug: bool,
}

impl Seat {
    /// Creates a seat with no devices and a hidden cursor at the origin.
    #[must_use]
    pub fn new(config: &CompositorConfig) -> Self {
        Self {
            cursor: Cursor::new(&config.cursor),
            keyboards: Vec::new(),
            pointers: Vec::new(),
            seatop: None,
            keyboard_focus: None,
            pointer_focus: None,
            drag: None,
            keyboard_config: config.keyboard.clone(),
            debug: config.debug,
        }
    }

    /// Reapplies keyboard and cursor settings.
    pub fn reconfigure(&mut self, config: &CompositorConfig) {
        self.keyboard_config = config.keyboard.clone();
        self.debug = config.debug;
        for keyboard in &mut self.keyboards {
            keyboard.settings = config.keyboard.clone();
        }
        self.cursor.reconfigure(&config.cursor);
    }

    /// The logical cursor.
    #[must_use]
    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Attached keyboards.
    #[must_use]
    pub fn keyboards(&self) -> &[Keyboard] {
        &self.keyboards
    }

    /// Attached pointers.
    #[must_use]
    pub fn pointers(&self) -> &[Pointer] {
        &self.pointers
    }

    /// The active interaction, if any.
    #[must_use]
    pub fn seatop(&self) -> Option<&Seatop> {
        self.seatop.as_ref()
    }

    /// The view holding keyboard focus.
    #[must_use]
    pub fn focused_view(&self) -> Option<ContentId> {
        self.keyboard_focus.map(|(view, _)| view)
    }

    /// The surface under the pointer, if any.
    #[must_use]
    pub fn pointer_focus(&self) -> Option<SurfaceId> {
        self.pointer_focus.map(|(_, surface)| surface)
    }

    /// The drag icon of an in-progress drag-and-drop session.
    #[must_use]
    pub fn drag(&self) -> Option<ContentId> {
        self.drag
    }

    pub(crate) fn add_keyboard(&mut self, device: DeviceId, name: &str) {
        self.keyboards.push(Keyboard {
            device,
            name: name.to_owned(),
            settings: self.keyboard_config.clone(),
        });
    }

    pub(crate) fn add_pointer(&mut self, device: DeviceId, name: &str) {
        self.pointers.push(Pointer {
            device,
            name: name.to_owned(),
        });
    }

    /// Detaches a device. Returns `false` if it was not attached.
    pub(crate) fn remove_device(&mut self, device: DeviceId) -> bool {
        let before = self.keyboards.len() + self.pointers.len();
        self.keyboards.retain(|k| k.device != device);
        self.pointers.retain(|p| p.device != device);
        self.keyboards.len() + self.pointers.len() != before
    }

    /// Drops every reference to a view that is being destroyed.
    pub(crate) fn forget_view(&mut self, view: ContentId) {
        if self.seatop.is_some_and(|op| op.view == view) {
            self.seatop = None;
        }
        if self.pointer_focus.is_some_and(|(v, _)| v == view) {
            self.pointer_focus = None;
        }
        if self.keyboard_focus.is_some_and(|(v, _)| v == view) {
            self.keyboard_focus = None;
        }
        if self.drag == Some(view) {
            self.drag = None;
        }
    }

    pub(crate) fn debug(&self) -> bool {
        self.debug
    }
}
