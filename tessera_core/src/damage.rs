// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Spatial damage tracking for partial re-rendering.
//!
//! [`Region`] is a set of integer rectangles in output-local pixels.
//! [`DamageRing`] is the per-output accumulator: the damage collected for the
//! frame being built plus the damage of recent frames, so a backend that hands
//! out an older buffer can still be brought up to date.

use kurbo::Rect;

use crate::output::Transform;

/// Number of past frames a [`DamageRing`] remembers.
pub const DAMAGE_RING_PREVIOUS_LEN: usize = 2;

/// An axis-aligned integer rectangle in output-local pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width; zero or negative means empty.
    pub width: i32,
    /// Height; zero or negative means empty.
    pub height: i32,
}

impl IRect {
    /// Creates a rectangle from origin and size.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle from its edges.
    #[inline]
    #[must_use]
    pub const fn from_edges(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Snaps a floating-point rectangle outward to whole pixels.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "output-local pixel coordinates fit in i32"
    )]
    pub fn from_rect_outward(rect: Rect) -> Self {
        let r = rect.abs().expand();
        Self::from_edges(r.x0 as i32, r.y0 as i32, r.x1 as i32, r.y1 as i32)
    }

    /// Rounds each component of a floating-point origin/size rectangle.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "output-local pixel coordinates fit in i32"
    )]
    pub fn from_rect_rounded(rect: Rect) -> Self {
        Self::new(
            rect.x0.round() as i32,
            rect.y0.round() as i32,
            rect.width().round() as i32,
            rect.height().round() as i32,
        )
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Exclusive right edge.
    #[inline]
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Number of pixels covered.
    #[must_use]
    pub fn area(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            i64::from(self.width) * i64::from(self.height)
        }
    }

    /// Returns the overlap of two rectangles, if any.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let r = Self::from_edges(
            self.x.max(other.x),
            self.y.max(other.y),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        );
        (!r.is_empty()).then_some(r)
    }

    /// Returns `true` if `other` lies entirely inside `self`.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.is_empty()
            || (!self.is_empty()
                && other.x >= self.x
                && other.y >= self.y
                && other.right() <= self.right()
                && other.bottom() <= self.bottom())
    }

    /// Returns `true` if the pixel at `(x, y)` is covered.
    #[must_use]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }

    /// Grows the rectangle by `by` pixels on every side.
    #[must_use]
    pub const fn expand(&self, by: i32) -> Self {
        Self::new(
            self.x - by,
            self.y - by,
            self.width + 2 * by,
            self.height + 2 * by,
        )
    }

    /// Moves the rectangle.
    #[must_use]
    pub const fn translate(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Pieces of `self` not covered by `hole` (at most four).
    fn subtract(&self, hole: &Self) -> Vec<Self> {
        let Some(cut) = self.intersect(hole) else {
            return vec![*self];
        };
        let mut out = Vec::with_capacity(4);
        // Full-width bands above and below the cut, then the side slivers.
        if cut.y > self.y {
            out.push(Self::from_edges(self.x, self.y, self.right(), cut.y));
        }
        if cut.bottom() < self.bottom() {
            out.push(Self::from_edges(
                self.x,
                cut.bottom(),
                self.right(),
                self.bottom(),
            ));
        }
        if cut.x > self.x {
            out.push(Self::from_edges(self.x, cut.y, cut.x, cut.bottom()));
        }
        if cut.right() < self.right() {
            out.push(Self::from_edges(
                cut.right(),
                cut.y,
                self.right(),
                cut.bottom(),
            ));
        }
        out
    }
}

/// A set of rectangles in output-local pixels.
///
/// Rectangles may overlap; the region is the union of all of them. Adding a
/// rectangle that is already covered by a single member is a no-op, and
/// members swallowed by a new rectangle are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Region {
    rects: Vec<IRect>,
}

impl Region {
    /// Creates an empty region.
    #[must_use]
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Creates a region holding a single rectangle.
    #[must_use]
    pub fn from_rect(rect: IRect) -> Self {
        let mut region = Self::new();
        region.add_rect(rect);
        region
    }

    /// Returns `true` if the region covers no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Member rectangles.
    #[must_use]
    pub fn rects(&self) -> &[IRect] {
        &self.rects
    }

    /// Removes every rectangle.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Adds a rectangle to the region.
    pub fn add_rect(&mut self, rect: IRect) {
        if rect.is_empty() || self.rects.iter().any(|r| r.contains(&rect)) {
            return;
        }
        self.rects.retain(|r| !rect.contains(r));
        self.rects.push(rect);
    }

    /// Adds every rectangle of `other`.
    pub fn union(&mut self, other: &Self) {
        for rect in &other.rects {
            self.add_rect(*rect);
        }
    }

    /// Returns the part of the region inside `clip`.
    #[must_use]
    pub fn intersect_rect(&self, clip: &IRect) -> Self {
        let mut out = Self::new();
        for rect in &self.rects {
            if let Some(r) = rect.intersect(clip) {
                out.add_rect(r);
            }
        }
        out
    }

    /// Returns the part of the region inside `other`.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let mut out = Self::new();
        for clip in &other.rects {
            out.union(&self.intersect_rect(clip));
        }
        out
    }

    /// Smallest rectangle containing the whole region.
    #[must_use]
    pub fn extents(&self) -> Option<IRect> {
        let first = self.rects.first()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.right(), first.bottom());
        for r in &self.rects[1..] {
            x0 = x0.min(r.x);
            y0 = y0.min(r.y);
            x1 = x1.max(r.right());
            y1 = y1.max(r.bottom());
        }
        Some(IRect::from_edges(x0, y0, x1, y1))
    }

    /// Grows every member by `by` pixels on each side.
    #[must_use]
    pub fn expand(&self, by: i32) -> Self {
        let mut out = Self::new();
        for rect in &self.rects {
            out.add_rect(rect.expand(by));
        }
        out
    }

    /// Moves every member.
    #[must_use]
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            rects: self.rects.iter().map(|r| r.translate(dx, dy)).collect(),
        }
    }

    /// Maps the region through an output transform.
    ///
    /// `width` and `height` are the dimensions of the space the region is
    /// currently expressed in.
    #[must_use]
    pub fn transformed(&self, transform: Transform, width: i32, height: i32) -> Self {
        Self {
            rects: self
                .rects
                .iter()
                .map(|r| transform.apply_to_rect(r, width, height))
                .collect(),
        }
    }

    /// Returns `true` if the pixel at `(x, y)` is covered.
    #[must_use]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.rects.iter().any(|r| r.contains_point(x, y))
    }

    /// Returns `true` if every pixel of `rect` is covered.
    #[must_use]
    pub fn covers(&self, rect: &IRect) -> bool {
        let mut uncovered = vec![*rect];
        for hole in &self.rects {
            uncovered = uncovered
                .iter()
                .flat_map(|piece| piece.subtract(hole))
                .collect();
            if uncovered.is_empty() {
                return true;
            }
        }
        uncovered.iter().all(IRect::is_empty)
    }
}

/// Per-output damage accumulator keyed by buffer age.
///
/// `current` collects damage for the next frame. Each [`rotate`](Self::rotate)
/// pushes it into the history, so [`buffer_damage`](Self::buffer_damage) can
/// answer "what changed since the contents of a buffer that is `age` frames
/// old".
#[derive(Clone, Debug, Default)]
pub struct DamageRing {
    width: i32,
    height: i32,
    current: Region,
    previous: [Region; DAMAGE_RING_PREVIOUS_LEN],
    previous_idx: usize,
}

impl DamageRing {
    /// Creates an empty ring with zero bounds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the bounds and damages the whole area.
    pub fn set_bounds(&mut self, width: i32, height: i32) {
        if (self.width, self.height) == (width, height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.add_whole();
    }

    /// The bounds as a rectangle at the origin.
    #[must_use]
    pub const fn bounds(&self) -> IRect {
        IRect::new(0, 0, self.width, self.height)
    }

    /// Adds damage, clipped to the bounds.
    ///
    /// Returns `true` if any of it landed inside the bounds.
    pub fn add(&mut self, damage: &Region) -> bool {
        let clipped = damage.intersect_rect(&self.bounds());
        if clipped.is_empty() {
            return false;
        }
        self.current.union(&clipped);
        true
    }

    /// Damages the whole area.
    pub fn add_whole(&mut self) {
        self.current.add_rect(self.bounds());
    }

    /// Damage collected for the frame being built.
    #[must_use]
    pub fn current(&self) -> &Region {
        &self.current
    }

    /// Damage needed to bring a buffer of the given age up to date.
    ///
    /// An age of zero (unknown contents) or older than the history yields the
    /// whole area.
    #[must_use]
    pub fn buffer_damage(&self, age: u32) -> Region {
        let age = age as usize;
        if age == 0 || age > DAMAGE_RING_PREVIOUS_LEN + 1 {
            return Region::from_rect(self.bounds());
        }
        let mut damage = self.current.clone();
        for i in 0..age - 1 {
            let idx = (self.previous_idx + DAMAGE_RING_PREVIOUS_LEN - 1 - i)
                % DAMAGE_RING_PREVIOUS_LEN;
            damage.union(&self.previous[idx]);
        }
        damage.intersect_rect(&self.bounds())
    }

    /// Moves the current damage into the history after a frame was shown.
    pub fn rotate(&mut self) {
        self.previous[self.previous_idx] = core::mem::take(&mut self.current);
        self.previous_idx = (self.previous_idx + 1) % DAMAGE_RING_PREVIOUS_LEN;
    }
}
