// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawable, damage-tracked entities.
//!
//! A [`Content`] is anything that ends up on screen: a client view, a
//! server-drawn widget, a drag icon, or a composite effect layer. Every
//! content carries the same geometry and visibility state; the variant
//! payload lives in [`ContentKind`].
//!
//! Contents live in a [`ContentStore`] and are addressed by [`ContentId`]
//! handles. Mutation goes through the property setters on
//! [`Compositor`](crate::Compositor), which bracket each change with damage.

mod id;
mod kind;
mod props;
mod store;

pub use id::{ContentId, SurfaceId};
pub use kind::{
    Composite, ContentKind, DragIcon, Effect, PixelBuffer, PixelFormat, Primitive, View, Widget,
    WidgetContent,
};
pub use store::ContentStore;

use kurbo::Rect;

use crate::output::OutputId;

/// Debounce threshold for box, workspace and corner radius changes.
pub const GEOMETRY_EPSILON: f64 = 0.01;

/// Debounce threshold for z-index, opacity and mask changes.
pub const FINE_EPSILON: f64 = 0.0001;

/// Z-index given to drag icons so they sit above everything else.
pub const DRAG_Z_INDEX: f64 = 1_000_000.0;

/// Opacity of drag icons.
pub const DRAG_OPACITY: f64 = 0.5;

/// A rectangle given as origin and size, in global layout units.
///
/// Unlike [`kurbo::Rect`], the size may be negative; fields with a "negative
/// means unset" meaning (workspace, mask) rely on that.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ContentBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl ContentBox {
    /// Creates a box.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Sum of the absolute component differences.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).abs()
            + (self.y - other.y).abs()
            + (self.width - other.width).abs()
            + (self.height - other.height).abs()
    }

    /// The box as a [`Rect`].
    #[must_use]
    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// One drawable entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Content {
    pub(crate) display: ContentBox,
    pub(crate) workspace: ContentBox,
    pub(crate) z_index: f64,
    pub(crate) opacity: f64,
    pub(crate) mask: ContentBox,
    pub(crate) corner_radius: f64,
    pub(crate) lock_enabled: bool,
    pub(crate) fixed_output: Option<OutputId>,
    pub(crate) kind: ContentKind,
}

impl Content {
    /// Creates a content with default geometry: an empty box at the origin,
    /// no workspace clip, z-index 0, full opacity, an unbounded mask.
    #[must_use]
    pub fn new(kind: ContentKind) -> Self {
        Self {
            display: ContentBox::default(),
            workspace: ContentBox::new(0.0, 0.0, -1.0, -1.0),
            z_index: 0.0,
            opacity: 1.0,
            mask: ContentBox::new(0.0, 0.0, -1.0, -1.0),
            corner_radius: 0.0,
            lock_enabled: false,
            fixed_output: None,
            kind,
        }
    }

    /// Display box in global layout units.
    #[must_use]
    pub const fn display_box(&self) -> ContentBox {
        self.display
    }

    /// The display box as a rectangle.
    #[must_use]
    pub fn footprint(&self) -> Rect {
        self.display.to_rect()
    }

    /// Raw workspace clip as last set; negative sizes mean "no clip".
    #[must_use]
    pub const fn raw_workspace(&self) -> ContentBox {
        self.workspace
    }

    /// Workspace clip, if one is set.
    #[must_use]
    pub fn workspace(&self) -> Option<ContentBox> {
        (self.workspace.width >= 0.0 && self.workspace.height >= 0.0).then_some(self.workspace)
    }

    /// Rendering priority.
    #[must_use]
    pub const fn z_index(&self) -> f64 {
        self.z_index
    }

    /// Opacity in `[0, 1]`.
    #[must_use]
    pub const fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Mask relative to the box, with negative sizes resolved to the content
    /// edge.
    #[must_use]
    pub fn mask(&self) -> ContentBox {
        let mut mask = self.mask;
        if mask.width < 0.0 {
            mask.width = self.display.width - mask.x + 1.0;
        }
        if mask.height < 0.0 {
            mask.height = self.display.height - mask.y + 1.0;
        }
        mask
    }

    /// Mask as last set.
    #[must_use]
    pub const fn raw_mask(&self) -> ContentBox {
        self.mask
    }

    /// Corner radius in layout units.
    #[must_use]
    pub const fn corner_radius(&self) -> f64 {
        self.corner_radius
    }

    /// Whether the content stays visible on the lock screen.
    #[must_use]
    pub const fn lock_enabled(&self) -> bool {
        self.lock_enabled
    }

    /// The output this content is pinned to, if any.
    #[must_use]
    pub const fn fixed_output(&self) -> Option<OutputId> {
        self.fixed_output
    }

    /// Variant payload.
    #[must_use]
    pub const fn kind(&self) -> &ContentKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut ContentKind {
        &mut self.kind
    }

    /// Whether this content is on an output with the given id and area.
    ///
    /// A pin overrides geometry: pinned contents are on their output only,
    /// unpinned contents are on every output their box overlaps.
    #[must_use]
    pub fn is_on(&self, output: OutputId, output_rect: Rect) -> bool {
        match self.fixed_output {
            Some(pinned) => pinned == output,
            None => {
                let overlap = self.footprint().intersect(output_rect);
                overlap.width() > 0.0 && overlap.height() > 0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> Content {
        Content::new(ContentKind::Widget(Widget::default()))
    }

    #[test]
    fn defaults_match_a_fresh_content() {
        let c = widget();
        assert_eq!(c.display_box(), ContentBox::default());
        assert!(c.workspace().is_none(), "no clip by default");
        assert_eq!(c.opacity(), 1.0);
        assert_eq!(c.z_index(), 0.0);
        assert!(!c.lock_enabled());
    }

    #[test]
    fn negative_mask_resolves_to_content_edge() {
        let mut c = widget();
        c.display = ContentBox::new(0.0, 0.0, 100.0, 50.0);
        c.mask = ContentBox::new(10.0, 5.0, -1.0, -1.0);
        assert_eq!(c.mask(), ContentBox::new(10.0, 5.0, 91.0, 46.0));
        c.mask = ContentBox::new(10.0, 5.0, 20.0, 20.0);
        assert_eq!(c.mask(), ContentBox::new(10.0, 5.0, 20.0, 20.0));
    }

    #[test]
    fn pin_overrides_geometry() {
        let a = OutputId(0);
        let b = OutputId(1);
        let rect_a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let rect_b = Rect::new(100.0, 0.0, 200.0, 100.0);

        let mut c = widget();
        c.display = ContentBox::new(10.0, 10.0, 20.0, 20.0);
        assert!(c.is_on(a, rect_a));
        assert!(!c.is_on(b, rect_b));

        c.fixed_output = Some(b);
        assert!(!c.is_on(a, rect_a), "pinned content ignores geometry");
        assert!(c.is_on(b, rect_b));
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let mut c = widget();
        c.display = ContentBox::new(100.0, 0.0, 10.0, 10.0);
        assert!(!c.is_on(OutputId(0), Rect::new(0.0, 0.0, 100.0, 100.0)));
    }
}
