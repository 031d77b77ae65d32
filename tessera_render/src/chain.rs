// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The compose chain: z-bands split at composite-effect layers.
//!
//! A composite effect must only see what lies below it. The chain cuts the
//! z axis at every effect that touches the frame damage, producing one band
//! per effect plus a final band above the topmost effect. Bands are
//! half-open: a band covers `lower < z <= upper`, so a content sharing an
//! effect's z-index is drawn below that effect.
//!
//! The chain is scratch state. It is rebuilt from the damage and the live
//! effects every frame and dropped once the frame is drawn.

use tessera_core::Compositor;
use tessera_core::content::{ContentId, Effect};
use tessera_core::damage::{IRect, Region};
use tessera_core::output::Output;

/// One z-band of the chain.
#[derive(Clone, Debug, PartialEq)]
pub struct Band {
    /// Exclusive lower z bound; `-inf` for the lowest band.
    pub lower: f64,
    /// Inclusive upper z bound; `+inf` for the topmost band.
    pub upper: f64,
    /// The composite effect sitting at `upper`, applied once the band is
    /// drawn. `None` only for the topmost band.
    pub effect: Option<ContentId>,
    /// Output-local area to redraw in this band.
    ///
    /// Bands below a spreading effect (a blur) redraw a wider area than the
    /// bands above it, because the effect samples around each damaged pixel.
    pub damage: Region,
}

impl Band {
    /// Whether a content at `z` is drawn in this band.
    #[must_use]
    pub fn contains(&self, z: f64) -> bool {
        z > self.lower && z <= self.upper
    }
}

/// The bands of one frame, lowest first.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposeChain {
    bands: Vec<Band>,
}

impl ComposeChain {
    /// Builds the chain for one output from the frame damage.
    ///
    /// Only effects on `output` whose footprint intersects `damage` split
    /// the chain. Reads the content z-order as of the last
    /// [`Compositor::update_contents`].
    #[must_use]
    pub fn build(comp: &Compositor, output: &Output, damage: &Region) -> Self {
        let out_rect = output.layout_rect();
        let effects: Vec<(ContentId, f64, &Effect, IRect)> = comp
            .contents()
            .z_ordered()
            .filter_map(|(id, content)| {
                let effect = content.kind().effect()?;
                if !content.is_on(output.id(), out_rect) {
                    return None;
                }
                let footprint = IRect::from_rect_outward(output.to_local(content.footprint()));
                if damage.intersect_rect(&footprint).is_empty() {
                    return None;
                }
                Some((id, content.z_index(), effect, footprint))
            })
            .collect();

        // Walk top-down so each band below an effect inherits the widened
        // damage of everything above it.
        let bounds = output.damage().bounds();
        let scale = output.scale();
        let mut bands = Vec::with_capacity(effects.len() + 1);
        let mut upper = f64::INFINITY;
        let mut above: Option<ContentId> = None;
        let mut band_damage = damage.clone();
        for &(id, z, effect, _) in effects.iter().rev() {
            bands.push(Band {
                lower: z,
                upper,
                effect: above,
                damage: band_damage.clone(),
            });
            #[expect(
                clippy::cast_possible_truncation,
                reason = "spread is a small pixel distance"
            )]
            let spread = (effect.damage_spread() * scale).ceil() as i32;
            if spread > 0 {
                band_damage = band_damage.expand(spread).intersect_rect(&bounds);
            }
            upper = z;
            above = Some(id);
        }
        bands.push(Band {
            lower: f64::NEG_INFINITY,
            upper,
            effect: above,
            damage: band_damage,
        });
        bands.reverse();
        Self { bands }
    }

    /// Bands from the bottom up.
    #[must_use]
    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Number of bands; always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    /// Always `false`; a chain has at least one band.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Whether any effect split the chain.
    #[must_use]
    pub fn is_layered(&self) -> bool {
        self.bands.len() > 1
    }

    /// Index of the band drawing a content at `z`.
    #[must_use]
    pub fn band_for(&self, z: f64) -> Option<usize> {
        self.bands.iter().position(|b| b.contains(z))
    }

    /// Damage of the topmost band: the frame damage itself.
    #[must_use]
    pub fn frame_damage(&self) -> &Region {
        // The constructor always pushes at least one band.
        &self.bands[self.bands.len() - 1].damage
    }
}
