// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display outputs.
//!
//! An [`Output`] is one display sink. It carries the mode, transform and scale
//! chosen for it, its position in the global layout, a [`DamageRing`] and its
//! frame-production state. Outputs are owned by the
//! [`Layout`](crate::layout::Layout).

use core::fmt;

use kurbo::Rect;
use serde::Deserialize;

use crate::config::{
    FALLBACK_MODE_HEIGHT, FALLBACK_MODE_WIDTH, HIDPI_THRESHOLD, MIN_CONFIGURED_SCALE,
    OutputConfig,
};
use crate::damage::{DamageRing, IRect};

/// Identifies an output for its whole lifetime.
///
/// Unlike the [`key`](Output::key) handed to the control layer, an `OutputId`
/// never changes while the output exists and is never reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutputId(pub(crate) u32);

impl OutputId {
    /// Returns the raw value (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

/// One of the eight output transforms (rotation by quarter turns, optionally
/// flipped around the vertical axis first).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum Transform {
    /// No transform.
    #[default]
    #[serde(rename = "normal")]
    Normal,
    /// Rotated 90° counter-clockwise.
    #[serde(rename = "90")]
    Rotated90,
    /// Rotated 180°.
    #[serde(rename = "180")]
    Rotated180,
    /// Rotated 270° counter-clockwise.
    #[serde(rename = "270")]
    Rotated270,
    /// Flipped.
    #[serde(rename = "flipped")]
    Flipped,
    /// Flipped, then rotated 90°.
    #[serde(rename = "flipped-90")]
    Flipped90,
    /// Flipped, then rotated 180°.
    #[serde(rename = "flipped-180")]
    Flipped180,
    /// Flipped, then rotated 270°.
    #[serde(rename = "flipped-270")]
    Flipped270,
}

impl Transform {
    /// Returns the transform that undoes this one.
    #[must_use]
    pub const fn invert(self) -> Self {
        match self {
            Self::Rotated90 => Self::Rotated270,
            Self::Rotated270 => Self::Rotated90,
            other => other,
        }
    }

    /// Returns `true` if the transform swaps width and height.
    #[must_use]
    pub const fn swaps_axes(self) -> bool {
        matches!(
            self,
            Self::Rotated90 | Self::Rotated270 | Self::Flipped90 | Self::Flipped270
        )
    }

    /// Maps a rectangle inside a `width` × `height` space through the
    /// transform.
    #[must_use]
    pub fn apply_to_rect(self, r: &IRect, width: i32, height: i32) -> IRect {
        let (x1, y1, x2, y2) = (r.x, r.y, r.right(), r.bottom());
        let (nx1, ny1, nx2, ny2) = match self {
            Self::Normal => (x1, y1, x2, y2),
            Self::Rotated90 => (height - y2, x1, height - y1, x2),
            Self::Rotated180 => (width - x2, height - y2, width - x1, height - y1),
            Self::Rotated270 => (y1, width - x2, y2, width - x1),
            Self::Flipped => (width - x2, y1, width - x1, y2),
            Self::Flipped90 => (y1, x1, y2, x2),
            Self::Flipped180 => (x1, height - y2, x2, height - y1),
            Self::Flipped270 => (height - y2, width - x2, height - y1, width - x1),
        };
        IRect::from_edges(nx1, ny1, nx2, ny2)
    }
}

// ---------------------------------------------------------------------------
// Modes and descriptors
// ---------------------------------------------------------------------------

/// A display mode advertised by (or forced onto) an output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Mode {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Refresh rate in millihertz; zero if unknown.
    pub refresh_mhz: i32,
    /// Whether the device marks this mode as preferred.
    pub preferred: bool,
}

impl Mode {
    /// Creates a non-preferred mode.
    #[must_use]
    pub const fn new(width: i32, height: i32, refresh_mhz: i32) -> Self {
        Self {
            width,
            height,
            refresh_mhz,
            preferred: false,
        }
    }

    /// Marks the mode as preferred.
    #[must_use]
    pub const fn preferred(mut self) -> Self {
        self.preferred = true;
        self
    }
}

/// What a backend reports when a new output appears.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OutputDescriptor {
    /// Output name (used to look up its configuration).
    pub name: String,
    /// Advertised modes; empty for outputs that accept custom modes only.
    pub modes: Vec<Mode>,
    /// Physical width in millimeters; zero if unknown.
    pub physical_width_mm: i32,
}

impl OutputDescriptor {
    /// Creates a descriptor with no advertised modes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds an advertised mode.
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.modes.push(mode);
        self
    }

    /// Sets the physical width.
    #[must_use]
    pub fn with_physical_width_mm(mut self, mm: i32) -> Self {
        self.physical_width_mm = mm;
        self
    }
}

/// Frame-production state of an output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FrameState {
    /// Nothing to draw.
    #[default]
    Idle,
    /// Damage or a backend request is pending; a frame callback is expected.
    Requested,
    /// A frame is being drawn.
    Rendering,
    /// The last frame was committed and awaits presentation.
    Committed,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One display sink.
#[derive(Debug)]
pub struct Output {
    pub(crate) id: OutputId,
    pub(crate) key: i32,
    name: String,
    modes: Vec<Mode>,
    mode: Mode,
    physical_width_mm: i32,
    transform: Transform,
    scale: f64,
    pub(crate) configured_position: Option<(i32, i32)>,
    pub(crate) layout_x: i32,
    pub(crate) layout_y: i32,
    enabled: bool,
    needs_frame: bool,
    frame_state: FrameState,
    damage: DamageRing,
}

impl Output {
    pub(crate) fn new(id: OutputId, descriptor: OutputDescriptor) -> Self {
        Self {
            id,
            key: -1,
            name: descriptor.name,
            modes: descriptor.modes,
            mode: Mode::default(),
            physical_width_mm: descriptor.physical_width_mm,
            transform: Transform::Normal,
            scale: 1.0,
            configured_position: None,
            layout_x: 0,
            layout_y: 0,
            enabled: false,
            needs_frame: false,
            frame_state: FrameState::Idle,
            damage: DamageRing::new(),
        }
    }

    /// Applies mode, transform and scale selection, then enables the output.
    ///
    /// Returns the chosen scale.
    pub fn configure(&mut self, config: Option<&OutputConfig>) -> f64 {
        let requested = config.and_then(|c| c.mode).unwrap_or_default();
        let mode = if self.modes.is_empty() {
            let mut width = requested.width;
            let mut height = requested.height;
            if width <= 0 {
                tracing::info!(output = %self.name, "no width configured for custom mode, defaulting to {FALLBACK_MODE_WIDTH}");
                width = FALLBACK_MODE_WIDTH;
            }
            if height <= 0 {
                tracing::info!(output = %self.name, "no height configured for custom mode, defaulting to {FALLBACK_MODE_HEIGHT}");
                height = FALLBACK_MODE_HEIGHT;
            }
            Mode::new(width, height, requested.refresh_mhz.max(0))
        } else {
            select_mode(&self.modes, config.and_then(|c| c.mode))
        };
        tracing::info!(
            output = %self.name,
            width = mode.width,
            height = mode.height,
            refresh_mhz = mode.refresh_mhz,
            "setting mode"
        );
        self.mode = mode;

        let dpi = if self.physical_width_mm > 0 {
            f64::from(mode.width) * 25.4 / f64::from(self.physical_width_mm)
        } else {
            0.0
        };

        self.transform = config.map(|c| c.transform).unwrap_or_default();
        self.configured_position = config.and_then(|c| c.position).map(|p| (p.x, p.y));
        self.enabled = true;

        let scale = match config.and_then(|c| c.scale) {
            Some(s) if s >= MIN_CONFIGURED_SCALE => s,
            _ if dpi > HIDPI_THRESHOLD => {
                tracing::info!(output = %self.name, dpi, "assuming HiDPI scale");
                2.0
            }
            _ => 1.0,
        };
        tracing::info!(output = %self.name, scale, "setting scale");
        self.scale = scale;

        self.reset_damage_bounds();
        scale
    }

    /// Handles a backend commit that changed mode, transform or scale.
    pub fn apply_state(&mut self, mode: Option<Mode>, transform: Option<Transform>, scale: Option<f64>) {
        if let Some(mode) = mode {
            self.mode = mode;
        }
        if let Some(transform) = transform {
            self.transform = transform;
        }
        if let Some(scale) = scale.filter(|s| *s >= MIN_CONFIGURED_SCALE) {
            self.scale = scale;
        }
        self.reset_damage_bounds();
    }

    fn reset_damage_bounds(&mut self) {
        let (w, h) = self.transformed_resolution();
        self.damage.set_bounds(w, h);
        self.damage.add_whole();
        self.schedule_frame();
    }

    // -- Accessors --

    /// Stable handle.
    #[must_use]
    pub const fn id(&self) -> OutputId {
        self.id
    }

    /// Key handed to the control layer; reassigned on every layout change.
    #[must_use]
    pub const fn key(&self) -> i32 {
        self.key
    }

    /// Output name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Advertised modes.
    #[must_use]
    pub fn modes(&self) -> &[Mode] {
        &self.modes
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Current refresh rate in millihertz.
    #[must_use]
    pub const fn refresh_mhz(&self) -> i32 {
        self.mode.refresh_mhz
    }

    /// Device scale factor.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Output transform.
    #[must_use]
    pub const fn transform(&self) -> Transform {
        self.transform
    }

    /// Position in the global layout.
    #[must_use]
    pub const fn position(&self) -> (i32, i32) {
        (self.layout_x, self.layout_y)
    }

    /// Whether the output is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disables or re-enables the output.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if enabled {
            self.damage.add_whole();
            self.schedule_frame();
        }
    }

    /// Mode size after applying the transform.
    #[must_use]
    pub const fn transformed_resolution(&self) -> (i32, i32) {
        if self.transform.swaps_axes() {
            (self.mode.height, self.mode.width)
        } else {
            (self.mode.width, self.mode.height)
        }
    }

    /// Transformed resolution divided by the scale, in layout units.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "effective resolution is a pixel count"
    )]
    pub fn effective_resolution(&self) -> (i32, i32) {
        let (w, h) = self.transformed_resolution();
        (
            (f64::from(w) / self.scale) as i32,
            (f64::from(h) / self.scale) as i32,
        )
    }

    /// The area this output covers in the global layout.
    #[must_use]
    pub fn layout_rect(&self) -> Rect {
        let (w, h) = self.effective_resolution();
        Rect::from_origin_size(
            (f64::from(self.layout_x), f64::from(self.layout_y)),
            (f64::from(w), f64::from(h)),
        )
    }

    /// Maps a rectangle from global layout space to this output's local,
    /// scaled pixel space.
    #[must_use]
    pub fn to_local(&self, global: Rect) -> Rect {
        let offset = (f64::from(self.layout_x), f64::from(self.layout_y));
        Rect::new(
            (global.x0 - offset.0) * self.scale,
            (global.y0 - offset.1) * self.scale,
            (global.x1 - offset.0) * self.scale,
            (global.y1 - offset.1) * self.scale,
        )
    }

    // -- Damage and frames --

    /// The damage accumulator.
    #[must_use]
    pub fn damage(&self) -> &DamageRing {
        &self.damage
    }

    pub(crate) fn damage_mut(&mut self) -> &mut DamageRing {
        &mut self.damage
    }

    /// Whether the backend asked for a frame regardless of damage.
    #[must_use]
    pub const fn needs_frame(&self) -> bool {
        self.needs_frame
    }

    /// Backend signal: a frame is required even without damage (e.g. a
    /// hardware cursor moved or the buffer was lost).
    pub fn set_needs_frame(&mut self) {
        self.needs_frame = true;
        self.schedule_frame();
    }

    /// Backend signal: the backend itself damaged part of the output.
    pub fn add_backend_damage(&mut self, rect: IRect) {
        if self.damage.add(&crate::damage::Region::from_rect(rect)) {
            self.schedule_frame();
        }
    }

    /// Carries an area a committed frame failed to draw into the next frame.
    ///
    /// Call after [`Output::finish_frame`], which has already rotated the
    /// drawn damage out.
    pub fn redamage(&mut self, region: &crate::damage::Region) {
        if self.damage.add(region) {
            self.schedule_frame();
        }
    }

    /// Current frame-production state.
    #[must_use]
    pub const fn frame_state(&self) -> FrameState {
        self.frame_state
    }

    /// Requests a frame callback.
    pub fn schedule_frame(&mut self) {
        if matches!(self.frame_state, FrameState::Idle | FrameState::Committed) {
            self.frame_state = FrameState::Requested;
        }
    }

    /// Enters the rendering state.
    pub fn begin_frame(&mut self) {
        self.frame_state = FrameState::Rendering;
    }

    /// Abandons an in-progress frame without presenting anything.
    pub fn rollback_frame(&mut self) {
        self.frame_state = FrameState::Idle;
    }

    /// Records a commit and moves this frame's damage into the history.
    pub fn finish_frame(&mut self) {
        self.needs_frame = false;
        self.damage.rotate();
        self.frame_state = FrameState::Committed;
    }

    /// Backend signal: the committed frame reached the screen.
    pub fn frame_presented(&mut self) {
        if self.frame_state == FrameState::Committed {
            self.frame_state = FrameState::Idle;
        }
    }
}

/// Chooses a mode from a non-empty list.
///
/// An exact size and refresh match wins, then the highest refresh among modes
/// of the requested size, then the preferred mode, then the first.
fn select_mode(modes: &[Mode], requested: Option<crate::config::ModeConfig>) -> Mode {
    let mut best: Option<Mode> = None;
    if let Some(req) = requested {
        for mode in modes {
            if mode.width != req.width || mode.height != req.height {
                continue;
            }
            if mode.refresh_mhz == req.refresh_mhz {
                best = Some(*mode);
                break;
            }
            if best.is_none_or(|b| mode.refresh_mhz > b.refresh_mhz) {
                best = Some(*mode);
            }
        }
    }
    best.or_else(|| modes.iter().find(|m| m.preferred).copied())
        .or_else(|| modes.first().copied())
        .unwrap_or_default()
}
