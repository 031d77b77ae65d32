// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render plan: the draw calls for one frame on one output.

use kurbo::Rect;
use tessera_core::Compositor;
use tessera_core::content::{
    Content, ContentId, ContentKind, Effect, FINE_EPSILON, WidgetContent,
};
use tessera_core::damage::{IRect, Region};
use tessera_core::output::{Output, OutputId};

use crate::chain::ComposeChain;
use crate::renderer::{Renderer, Target};

/// Color used for clear passes.
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// One content to draw, in output-local pixels.
#[derive(Clone, Debug)]
pub struct RenderItem<'a> {
    /// The content this item draws.
    pub content: ContentId,
    /// Variant payload to draw.
    pub kind: &'a ContentKind,
    /// Display box, rounded to pixels.
    pub rect: IRect,
    /// Part of `rect` to redraw, already clipped to the workspace.
    pub damage: Region,
    /// Mask, rounded to pixels.
    pub mask: IRect,
    /// Corner radius in pixels.
    pub corner_radius: f64,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// How far to dim towards the lock screen: zero when unlocked or when the
    /// content stays visible on the lock screen.
    pub lock_dim: f64,
}

/// A composite effect to apply once its band is drawn.
#[derive(Clone, Debug)]
pub struct EffectPass<'a> {
    /// The composite content.
    pub content: ContentId,
    /// The effect.
    pub effect: &'a Effect,
    /// The effect's footprint, rounded outward to pixels.
    pub rect: IRect,
    /// Part of the footprint whose effect output must be refreshed.
    pub damage: Region,
}

/// Draw calls for one band of the compose chain.
#[derive(Clone, Debug)]
pub struct BandPlan<'a> {
    /// Where this band draws.
    pub target: Target,
    /// Area to clear on `target` before drawing, if any.
    pub clear: Option<Region>,
    /// Contents bottom to top.
    pub items: Vec<RenderItem<'a>>,
    /// Effect applied after the items, writing into the next band's target.
    pub effect: Option<EffectPass<'a>>,
}

/// Everything to draw for one frame, bottom band first.
#[derive(Clone, Debug)]
pub struct RenderPlan<'a> {
    /// Target output.
    pub output: OutputId,
    /// Area of the output buffer to clear before anything else, if any.
    ///
    /// Set when some content on the output is translucent, so a fading
    /// background does not blend with last frame's pixels.
    pub clear: Option<Region>,
    /// One entry per chain band.
    pub bands: Vec<BandPlan<'a>>,
}

impl<'a> RenderPlan<'a> {
    /// Lays out the draw calls for `chain`.
    ///
    /// Reads the content z-order as of the last
    /// [`Compositor::update_contents`].
    #[must_use]
    pub fn build(comp: &'a Compositor, output: &Output, chain: &ComposeChain) -> Self {
        let chain_bands = chain.bands();
        let top = chain_bands.len() - 1;
        let target = |i: usize| if i == top { Target::Output } else { Target::Band(i) };

        let mut bands: Vec<BandPlan<'a>> = (0..chain_bands.len())
            .map(|i| BandPlan {
                target: target(i),
                // Scratch buffers start with garbage.
                clear: (i == 0 && chain.is_layered()).then(|| chain_bands[0].damage.clone()),
                items: Vec::new(),
                effect: None,
            })
            .collect();

        let out_rect = output.layout_rect();
        let lock_fraction = comp.lock_fraction();
        let mut needs_clear = false;
        for (id, content) in comp.contents().z_ordered() {
            if !content.is_on(output.id(), out_rect) {
                continue;
            }
            if let Some(effect) = content.kind().effect() {
                let Some(i) = chain_bands.iter().position(|b| b.effect == Some(id)) else {
                    continue;
                };
                let rect = IRect::from_rect_outward(output.to_local(content.footprint()));
                bands[i].effect = Some(EffectPass {
                    content: id,
                    effect,
                    rect,
                    damage: chain_bands[i + 1].damage.intersect_rect(&rect),
                });
                continue;
            }
            if content.opacity() < 1.0 - FINE_EPSILON {
                needs_clear = true;
            }
            if content.opacity() < FINE_EPSILON || !draws_anything(content.kind()) {
                continue;
            }
            let Some(i) = chain.band_for(content.z_index()) else {
                continue;
            };
            if let Some(item) =
                render_item(id, content, output, &chain_bands[i].damage, lock_fraction)
            {
                bands[i].items.push(item);
            }
        }

        Self {
            output: output.id(),
            clear: needs_clear.then(|| chain.frame_damage().clone()),
            bands,
        }
    }

    /// Number of contents drawn across all bands.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.bands.iter().map(|b| b.items.len()).sum()
    }

    /// Every item, bottom band first.
    pub fn items(&self) -> impl Iterator<Item = &RenderItem<'a>> + '_ {
        self.bands.iter().flat_map(|b| b.items.iter())
    }

    /// Issues the plan's draw calls.
    ///
    /// Failed draws and effects are logged and skipped. Returns the
    /// output-local area they left stale, empty if everything succeeded.
    #[must_use = "stale areas must be redrawn on a later frame"]
    pub fn execute(&self, renderer: &mut dyn Renderer) -> Region {
        let mut failed = Region::default();
        if let Some(clear) = &self.clear {
            renderer.clear(Target::Output, clear, CLEAR_COLOR);
        }
        for (i, band) in self.bands.iter().enumerate() {
            if let Some(clear) = &band.clear {
                renderer.clear(band.target, clear, CLEAR_COLOR);
            }
            for item in &band.items {
                if let Err(err) = renderer.draw(band.target, item) {
                    tracing::debug!(content = ?item.content, %err, "draw skipped");
                    failed.union(&item.damage);
                }
            }
            let Some(pass) = &band.effect else {
                continue;
            };
            let dest = self.bands.get(i + 1).map_or(Target::Output, |b| b.target);
            if let Err(err) = renderer.apply_effect(band.target, dest, pass) {
                tracing::debug!(content = ?pass.content, %err, "effect skipped");
                failed.union(&pass.damage);
            }
        }
        failed
    }
}

/// Whether a variant has anything to put on screen.
fn draws_anything(kind: &ContentKind) -> bool {
    match kind {
        ContentKind::Widget(w) => !matches!(w.content, WidgetContent::Empty),
        ContentKind::Drag(icon) => icon.surface.is_some(),
        ContentKind::View(_) => true,
        ContentKind::Composite(_) => false,
    }
}

fn render_item<'a>(
    id: ContentId,
    content: &'a Content,
    output: &Output,
    band_damage: &Region,
    lock_fraction: f64,
) -> Option<RenderItem<'a>> {
    let footprint = content.footprint();
    let mut damage =
        band_damage.intersect_rect(&IRect::from_rect_outward(output.to_local(footprint)));
    if let Some(ws) = content.workspace() {
        damage = damage.intersect_rect(&IRect::from_rect_outward(output.to_local(ws.to_rect())));
    }
    if damage.is_empty() {
        return None;
    }

    let b = content.display_box();
    let m = content.mask();
    let mask = Rect::new(b.x + m.x, b.y + m.y, b.x + m.x + m.width, b.y + m.y + m.height);
    Some(RenderItem {
        content: id,
        kind: content.kind(),
        rect: IRect::from_rect_rounded(output.to_local(footprint)),
        damage,
        mask: IRect::from_rect_rounded(output.to_local(mask)),
        corner_radius: content.corner_radius() * output.scale(),
        opacity: content.opacity(),
        lock_dim: if content.lock_enabled() {
            0.0
        } else {
            lock_fraction
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::config::{CompositorConfig, OutputConfig};
    use tessera_core::content::{ContentBox, Primitive, SurfaceId, View};
    use tessera_core::output::{Mode, OutputDescriptor};

    fn scene(scale: f64) -> (Compositor, OutputId) {
        let config = CompositorConfig {
            outputs: vec![OutputConfig {
                name: "DP-1".into(),
                scale: Some(scale),
                ..OutputConfig::default()
            }],
            ..CompositorConfig::default()
        };
        let mut comp = Compositor::new(config);
        let id = comp.add_output(
            OutputDescriptor::new("DP-1").with_mode(Mode::new(800, 600, 60000).preferred()),
        );
        (comp, id)
    }

    fn whole() -> Region {
        Region::from_rect(IRect::new(0, 0, 800, 600))
    }

    fn plan_for(comp: &mut Compositor, id: OutputId, damage: IRect) -> (ComposeChain, usize) {
        comp.update_contents();
        let output = comp.output(id).unwrap();
        let chain = ComposeChain::build(comp, output, &Region::from_rect(damage));
        let count = RenderPlan::build(comp, output, &chain).item_count();
        (chain, count)
    }

    fn primitive(comp: &mut Compositor, area: ContentBox) -> ContentId {
        let w = comp.create_widget();
        comp.set_widget_primitive(
            w,
            Primitive {
                name: "rect".into(),
                ..Primitive::default()
            },
        )
        .unwrap();
        comp.set_box(w, area).unwrap();
        w
    }

    #[test]
    fn items_are_scaled_and_carry_their_state() {
        let (mut comp, id) = scene(2.0);
        let w = primitive(&mut comp, ContentBox::new(10.0, 10.0, 100.0, 50.0));
        comp.set_opacity(w, 0.5).unwrap();
        comp.set_corner_radius(w, 4.0).unwrap();
        comp.set_mask(w, ContentBox::new(0.0, 0.0, 50.0, -1.0)).unwrap();
        comp.update_contents();

        let output = comp.output(id).unwrap();
        let chain = ComposeChain::build(&comp, output, &whole());
        let plan = RenderPlan::build(&comp, output, &chain);
        let item = plan.items().next().unwrap();
        assert_eq!(item.rect, IRect::new(20, 20, 200, 100));
        assert_eq!(item.mask, IRect::new(20, 20, 100, 102));
        assert_eq!(item.corner_radius, 8.0);
        assert_eq!(item.opacity, 0.5);
        assert_eq!(item.lock_dim, 0.0);
        assert!(plan.clear.is_some(), "translucent content forces a clear");
    }

    #[test]
    fn invisible_and_empty_contents_are_skipped() {
        let (mut comp, id) = scene(1.0);
        let faded = primitive(&mut comp, ContentBox::new(0.0, 0.0, 10.0, 10.0));
        comp.set_opacity(faded, 0.0).unwrap();
        let empty = comp.create_widget();
        comp.set_box(empty, ContentBox::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        let view = comp.create_view(View::new(SurfaceId(3)));
        comp.set_box(view, ContentBox::new(0.0, 0.0, 10.0, 10.0)).unwrap();

        let (_, count) = plan_for(&mut comp, id, IRect::new(0, 0, 800, 600));
        assert_eq!(count, 1, "only the view draws");
    }

    #[test]
    fn items_outside_the_damage_are_skipped() {
        let (mut comp, id) = scene(1.0);
        primitive(&mut comp, ContentBox::new(0.0, 0.0, 10.0, 10.0));
        primitive(&mut comp, ContentBox::new(400.0, 400.0, 10.0, 10.0));
        let (_, count) = plan_for(&mut comp, id, IRect::new(0, 0, 50, 50));
        assert_eq!(count, 1);
    }

    #[test]
    fn workspace_clips_item_damage() {
        let (mut comp, id) = scene(1.0);
        let w = primitive(&mut comp, ContentBox::new(0.0, 0.0, 100.0, 100.0));
        comp.set_workspace(w, ContentBox::new(0.0, 0.0, 40.0, 40.0)).unwrap();
        comp.update_contents();
        let output = comp.output(id).unwrap();
        let chain = ComposeChain::build(&comp, output, &whole());
        let plan = RenderPlan::build(&comp, output, &chain);
        let item = plan.items().next().unwrap();
        assert_eq!(item.damage.extents(), Some(IRect::new(0, 0, 40, 40)));
    }

    #[test]
    fn locked_contents_are_dimmed_unless_exempt() {
        let (mut comp, id) = scene(1.0);
        let hidden = primitive(&mut comp, ContentBox::new(0.0, 0.0, 10.0, 10.0));
        let shown = primitive(&mut comp, ContentBox::new(20.0, 0.0, 10.0, 10.0));
        comp.set_lock_enabled(shown, true).unwrap();
        comp.set_locked(0.75);
        comp.update_contents();

        let output = comp.output(id).unwrap();
        let chain = ComposeChain::build(&comp, output, &whole());
        let plan = RenderPlan::build(&comp, output, &chain);
        let dims: Vec<_> = plan.items().map(|i| (i.content, i.lock_dim)).collect();
        assert!(dims.contains(&(hidden, 0.75)), "{dims:?}");
        assert!(dims.contains(&(shown, 0.0)), "{dims:?}");
    }

    #[test]
    fn layered_plans_clear_the_lowest_band() {
        let (mut comp, id) = scene(1.0);
        primitive(&mut comp, ContentBox::new(0.0, 0.0, 10.0, 10.0));
        let tint = comp.create_composite(Effect::Tint {
            color: [0.0, 0.0, 0.0, 0.5],
        });
        comp.set_box(tint, ContentBox::new(0.0, 0.0, 800.0, 600.0)).unwrap();
        comp.set_z_index(tint, 1.0).unwrap();
        comp.update_contents();

        let output = comp.output(id).unwrap();
        let chain = ComposeChain::build(&comp, output, &whole());
        let plan = RenderPlan::build(&comp, output, &chain);
        assert_eq!(plan.bands.len(), 2);
        assert_eq!(plan.bands[0].target, Target::Band(0));
        assert!(plan.bands[0].clear.is_some());
        assert_eq!(plan.bands[0].items.len(), 1);
        assert_eq!(plan.bands[0].effect.as_ref().map(|p| p.content), Some(tint));
        assert_eq!(plan.bands[1].target, Target::Output);
        assert!(plan.bands[1].clear.is_none());
        assert!(plan.clear.is_none(), "everything is opaque");
    }
}
