// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The closed set of content variants.

use super::id::SurfaceId;
use crate::output::OutputId;

/// What a content draws.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentKind {
    /// A client surface tree.
    View(View),
    /// Server-drawn content.
    Widget(Widget),
    /// The icon of an in-progress drag-and-drop session.
    Drag(DragIcon),
    /// A full-screen post-process applied to everything below it.
    Composite(Composite),
}

impl ContentKind {
    /// Short variant name for logs and dumps.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::View(_) => "view",
            Self::Widget(_) => "widget",
            Self::Drag(_) => "drag",
            Self::Composite(_) => "composite",
        }
    }

    /// Returns the view payload, if this is a view.
    #[must_use]
    pub fn as_view(&self) -> Option<&View> {
        match self {
            Self::View(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the effect, if this is a composite.
    #[must_use]
    pub fn effect(&self) -> Option<&Effect> {
        match self {
            Self::Composite(c) => Some(&c.effect),
            _ => None,
        }
    }

    /// Returns `true` for composite-effect contents.
    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// A client surface tree: a root surface plus popups and subsurfaces.
#[derive(Clone, Debug, PartialEq)]
pub struct View {
    /// The toplevel surface.
    pub surface: SurfaceId,
    /// Child surfaces, bottom to top.
    pub children: Vec<SurfaceId>,
    /// Size the client last committed for the root surface, in surface-local
    /// units. Used to map pointer coordinates into the surface.
    pub surface_size: (i32, i32),
    /// Window title.
    pub title: String,
    /// Application id.
    pub app_id: String,
    pub(crate) entered: Vec<OutputId>,
}

impl View {
    /// Creates a view for a root surface.
    #[must_use]
    pub fn new(surface: SurfaceId) -> Self {
        Self {
            surface,
            children: Vec::new(),
            surface_size: (0, 0),
            title: String::new(),
            app_id: String::new(),
            entered: Vec::new(),
        }
    }

    /// Sets the committed surface size.
    #[must_use]
    pub fn with_surface_size(mut self, width: i32, height: i32) -> Self {
        self.surface_size = (width, height);
        self
    }

    /// Root surface followed by every child.
    pub fn surfaces(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        core::iter::once(self.surface).chain(self.children.iter().copied())
    }

    /// Outputs the client has been told this view is on.
    #[must_use]
    pub fn entered_outputs(&self) -> &[OutputId] {
        &self.entered
    }
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

/// Pixel layout of a widget buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 32-bit ARGB, premultiplied.
    #[default]
    Argb8888,
    /// 32-bit RGB with an ignored alpha byte.
    Xrgb8888,
    /// 32-bit ABGR, premultiplied.
    Abgr8888,
}

/// A server-supplied pixel buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Pixel layout.
    pub format: PixelFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bytes per row.
    pub stride: u32,
    /// Raw pixel bytes, `stride * height` long.
    pub data: Vec<u8>,
}

/// A named parametric shape drawn by the renderer (e.g. a rounded rectangle
/// or a background gradient).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Primitive {
    /// Renderer-defined primitive name.
    pub name: String,
    /// Integer parameters.
    pub ints: Vec<i32>,
    /// Float parameters.
    pub floats: Vec<f32>,
}

/// What a widget currently draws. Pixels and a primitive are mutually
/// exclusive.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum WidgetContent {
    /// Nothing set yet.
    #[default]
    Empty,
    /// A pixel buffer.
    Pixels(PixelBuffer),
    /// A named primitive.
    Primitive(Primitive),
}

/// Server-drawn content.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Widget {
    /// Current drawing payload.
    pub content: WidgetContent,
}

// ---------------------------------------------------------------------------
// Drag icon
// ---------------------------------------------------------------------------

/// The icon following the cursor during drag-and-drop.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DragIcon {
    /// The client-provided icon surface, if any and still alive.
    pub surface: Option<SurfaceId>,
    /// Buffer size of the icon surface.
    pub size: (i32, i32),
}

// ---------------------------------------------------------------------------
// Composite
// ---------------------------------------------------------------------------

/// A post-process applied to the composed image below an effect layer.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Gaussian-style blur.
    Blur {
        /// Kernel radius in logical pixels.
        radius: f64,
        /// Number of passes.
        passes: u32,
    },
    /// Multiplies the image by a premultiplied RGBA color.
    Tint {
        /// RGBA color.
        color: [f32; 4],
    },
    /// A renderer-defined effect.
    Named {
        /// Effect name.
        name: String,
        /// Effect parameters.
        params: Vec<f32>,
    },
}

impl Effect {
    /// How far, in logical pixels, a change below the effect spreads in the
    /// effect's output.
    #[must_use]
    pub fn damage_spread(&self) -> f64 {
        match self {
            Self::Blur { radius, .. } => radius.max(0.0),
            Self::Tint { .. } | Self::Named { .. } => 0.0,
        }
    }
}

/// A composite-effect content.
#[derive(Clone, Debug, PartialEq)]
pub struct Composite {
    /// The effect applied to everything below.
    pub effect: Effect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_blur_spreads_damage() {
        let blur = Effect::Blur {
            radius: 4.0,
            passes: 3,
        };
        assert_eq!(blur.damage_spread(), 4.0);
        let degenerate = Effect::Blur {
            radius: -1.0,
            passes: 0,
        };
        assert_eq!(degenerate.damage_spread(), 0.0);
        let tint = Effect::Tint { color: [0.0; 4] };
        assert_eq!(tint.damage_spread(), 0.0);
    }

    #[test]
    fn view_surfaces_start_with_root() {
        let mut view = View::new(SurfaceId(1));
        view.children.push(SurfaceId(7));
        let all: Vec<_> = view.surfaces().collect();
        assert_eq!(all, vec![SurfaceId(1), SurfaceId(7)]);
    }
}
