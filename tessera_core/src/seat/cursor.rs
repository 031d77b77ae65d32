// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The logical cursor: position, image and gesture pairing state.

use crate::Compositor;
use crate::config::CursorConfig;
use crate::content::SurfaceId;
use crate::input::GestureKind;

/// Theme image shown over empty space and after a client cursor goes away.
pub const DEFAULT_CURSOR_IMAGE: &str = "left_ptr";

/// Positions at or below this value mean "leave the cursor where it is".
pub const CURSOR_POSITION_MIN: f64 = -1_000_000.0;

/// What the cursor shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CursorImage {
    /// A named image from the cursor theme.
    Named(String),
    /// A client-provided surface.
    Surface {
        /// The cursor surface.
        surface: SurfaceId,
        /// Hotspot in surface-local units.
        hotspot: (i32, i32),
    },
}

/// The single logical pointer.
#[derive(Clone, Debug)]
pub struct Cursor {
    x: f64,
    y: f64,
    visible: bool,
    image: CursorImage,
    theme: Option<String>,
    size: u32,
    last_time_msec: u32,

    // Whether the matching begin reached clients.
    swipe_started: bool,
    pinch_started: bool,
    hold_started: bool,
}

impl Cursor {
    /// A hidden cursor at the origin showing the default image.
    #[must_use]
    pub fn new(config: &CursorConfig) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            visible: false,
            image: CursorImage::Named(DEFAULT_CURSOR_IMAGE.to_owned()),
            theme: config.theme.clone(),
            size: config.size,
            last_time_msec: 0,
            swipe_started: false,
            pinch_started: false,
            hold_started: false,
        }
    }

    pub(crate) fn reconfigure(&mut self, config: &CursorConfig) {
        tracing::debug!(theme = ?config.theme, size = config.size, "loading cursor theme");
        self.theme.clone_from(&config.theme);
        self.size = config.size;
    }

    /// Position in global layout units.
    #[must_use]
    pub const fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub(crate) fn move_to(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    /// Timestamp of the last device motion, reused for synthetic motion.
    pub(crate) const fn last_time_msec(&self) -> u32 {
        self.last_time_msec
    }

    pub(crate) fn set_last_time_msec(&mut self, time_msec: u32) {
        self.last_time_msec = time_msec;
    }

    /// Whether the cursor is drawn at all.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// The image last set, whether or not it is shown.
    #[must_use]
    pub fn image(&self) -> &CursorImage {
        &self.image
    }

    /// The image actually shown: `None` while the cursor is hidden.
    #[must_use]
    pub fn displayed_image(&self) -> Option<&CursorImage> {
        self.visible.then_some(&self.image)
    }

    /// Cursor theme name.
    #[must_use]
    pub fn theme(&self) -> Option<&str> {
        self.theme.as_deref()
    }

    /// Nominal cursor size.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Whether a begin of this gesture kind was forwarded to clients and
    /// still awaits its end.
    #[must_use]
    pub const fn gesture_started(&self, kind: GestureKind) -> bool {
        match kind {
            GestureKind::Swipe => self.swipe_started,
            GestureKind::Pinch => self.pinch_started,
            GestureKind::Hold => self.hold_started,
        }
    }

    pub(crate) fn set_gesture_started(&mut self, kind: GestureKind, started: bool) {
        match kind {
            GestureKind::Swipe => self.swipe_started = started,
            GestureKind::Pinch => self.pinch_started = started,
            GestureKind::Hold => self.hold_started = started,
        }
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub(crate) fn set_image(&mut self, name: &str) {
        if !matches!(&self.image, CursorImage::Named(current) if current == name) {
            self.image = CursorImage::Named(name.to_owned());
        }
    }

    pub(crate) fn set_image_surface(&mut self, surface: SurfaceId, hotspot: (i32, i32)) {
        self.image = CursorImage::Surface { surface, hotspot };
    }
}

// ---------------------------------------------------------------------------
// Compositor entry points
// ---------------------------------------------------------------------------

impl Compositor {
    /// Shows or hides the cursor.
    pub fn set_cursor_visible(&mut self, visible: bool) {
        self.seat.cursor.set_visible(visible);
    }

    /// Moves the cursor to a global position and re-runs pointer focus.
    ///
    /// Coordinates at or below [`CURSOR_POSITION_MIN`] leave the cursor in
    /// place.
    pub fn set_cursor_position(&mut self, x: f64, y: f64) {
        if x <= CURSOR_POSITION_MIN || y <= CURSOR_POSITION_MIN {
            return;
        }
        self.seat.cursor.move_to(x, y);
        self.cursor_update(self.seat.cursor.last_time_msec());
    }

    /// Control-layer entry point: sets visibility, optionally moves, then
    /// re-runs pointer focus.
    pub fn update_cursor(&mut self, visible: bool, x: f64, y: f64) {
        self.set_cursor_visible(visible);
        if x > CURSOR_POSITION_MIN && y > CURSOR_POSITION_MIN {
            self.seat.cursor.move_to(x, y);
        }
        self.cursor_update(self.seat.cursor.last_time_msec());
    }

    /// Shows a named theme image.
    pub fn set_cursor_image(&mut self, name: &str) {
        self.seat.cursor.set_image(name);
    }

    /// Client request: show a surface as the cursor. `None` reverts to the
    /// default image.
    pub fn set_cursor_image_surface(&mut self, surface: Option<SurfaceId>, hotspot: (i32, i32)) {
        match surface {
            Some(surface) => self.seat.cursor.set_image_surface(surface, hotspot),
            None => self.seat.cursor.set_image(DEFAULT_CURSOR_IMAGE),
        }
    }

    /// A client surface was destroyed; a cursor showing it reverts to the
    /// default image.
    pub fn cursor_surface_destroyed(&mut self, surface: SurfaceId) {
        if matches!(self.seat.cursor.image(), CursorImage::Surface { surface: s, .. } if *s == surface)
        {
            self.seat.cursor.set_image(DEFAULT_CURSOR_IMAGE);
        }
    }

    /// Re-evaluates everything that follows the cursor: the drag icon and
    /// pointer focus.
    ///
    /// Returns `true` if a client surface received the motion. Over empty
    /// space the image resets to the default.
    pub(crate) fn cursor_update(&mut self, time_msec: u32) -> bool {
        self.update_drag_position();
        let delivered = self.dispatch_motion(time_msec);
        if !delivered {
            self.seat.cursor.set_image(DEFAULT_CURSOR_IMAGE);
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompositorConfig;

    #[test]
    fn hidden_cursor_shows_nothing() {
        let mut cursor = Cursor::new(&CursorConfig::default());
        assert!(cursor.displayed_image().is_none());
        cursor.set_visible(true);
        assert_eq!(
            cursor.displayed_image(),
            Some(&CursorImage::Named(DEFAULT_CURSOR_IMAGE.into()))
        );
    }

    #[test]
    fn sentinel_position_is_ignored() {
        let mut comp = Compositor::new(CompositorConfig::default());
        comp.set_cursor_position(10.0, 20.0);
        assert_eq!(comp.seat().cursor().position(), (10.0, 20.0));
        comp.set_cursor_position(CURSOR_POSITION_MIN, 5.0);
        assert_eq!(comp.seat().cursor().position(), (10.0, 20.0));
        comp.update_cursor(true, CURSOR_POSITION_MIN, CURSOR_POSITION_MIN);
        assert!(comp.seat().cursor().is_visible());
        assert_eq!(comp.seat().cursor().position(), (10.0, 20.0));
    }

    #[test]
    fn destroyed_cursor_surface_reverts_to_default() {
        let mut comp = Compositor::new(CompositorConfig::default());
        comp.set_cursor_image_surface(Some(SurfaceId(4)), (1, 1));
        comp.cursor_surface_destroyed(SurfaceId(5));
        assert!(matches!(comp.seat().cursor().image(), CursorImage::Surface { .. }));
        comp.cursor_surface_destroyed(SurfaceId(4));
        assert_eq!(
            comp.seat().cursor().image(),
            &CursorImage::Named(DEFAULT_CURSOR_IMAGE.into())
        );
    }

    #[test]
    fn empty_space_resets_the_image() {
        let mut comp = Compositor::new(CompositorConfig::default());
        comp.set_cursor_image("text");
        assert!(!comp.cursor_update(0));
        assert_eq!(
            comp.seat().cursor().image(),
            &CursorImage::Named(DEFAULT_CURSOR_IMAGE.into())
        );
    }
}
