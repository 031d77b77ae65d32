// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Output arrangement and damage propagation.
//!
//! [`Layout`] owns the outputs and maps the global coordinate space onto
//! them. The `impl Compositor` block below routes damage from contents to the
//! outputs they are on, and keeps view surfaces informed about which outputs
//! they are visible on.

use kurbo::{Point, Rect, Vec2};

use crate::Compositor;
use crate::content::{ContentId, SurfaceId};
use crate::control::{Notice, OutputInfo};
use crate::damage::{IRect, Region};
use crate::output::{Mode, Output, OutputDescriptor, OutputId, Transform};

/// How far inside the right and bottom edges a clamped point lands.
const EDGE_INSET: f64 = 1.0 / 65536.0;

/// The set of active outputs and their global arrangement.
#[derive(Debug, Default)]
pub struct Layout {
    outputs: Vec<Output>,
    next_id: u32,
    next_key: i32,
    refresh_master: Option<OutputId>,
    refresh_scheduled: Option<OutputId>,
}

impl Layout {
    /// Creates an empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Outputs in the order they were added.
    #[must_use]
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub(crate) fn outputs_mut(&mut self) -> &mut [Output] {
        &mut self.outputs
    }

    /// Looks up an output by id.
    #[must_use]
    pub fn output(&self, id: OutputId) -> Option<&Output> {
        self.outputs.iter().find(|o| o.id == id)
    }

    pub(crate) fn output_mut(&mut self, id: OutputId) -> Option<&mut Output> {
        self.outputs.iter_mut().find(|o| o.id == id)
    }

    /// Looks up an output by its current key.
    #[must_use]
    pub fn output_by_key(&self, key: i32) -> Option<&Output> {
        self.outputs.iter().find(|o| o.key == key)
    }

    /// Looks up an output by name.
    #[must_use]
    pub fn output_by_name(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name() == name)
    }

    /// The output with the highest refresh rate.
    #[must_use]
    pub fn refresh_master(&self) -> Option<OutputId> {
        self.refresh_master
    }

    /// The output whose frame drives the control layer's per-frame update
    /// this cycle.
    #[must_use]
    pub fn refresh_output(&self) -> Option<OutputId> {
        self.refresh_scheduled
    }

    /// Key of [`refresh_output`](Self::refresh_output), or `-1`.
    #[must_use]
    pub fn refresh_output_key(&self) -> i32 {
        self.refresh_scheduled
            .and_then(|id| self.output(id))
            .map_or(-1, Output::key)
    }

    /// Resets the refresh output for a new cycle.
    pub fn start_update(&mut self) {
        self.refresh_scheduled = None;
    }

    /// Records that `id` has a frame pending this cycle.
    ///
    /// The first damaged output becomes the refresh output, and the master
    /// takes over whenever it is damaged too.
    pub(crate) fn mark_refresh(&mut self, id: OutputId) {
        if self.refresh_scheduled.is_none() || self.refresh_master == Some(id) {
            self.refresh_scheduled = Some(id);
        }
    }

    /// Bounding box of every output.
    #[must_use]
    pub fn extents(&self) -> Option<Rect> {
        self.outputs
            .iter()
            .map(Output::layout_rect)
            .reduce(|a, b| a.union(b))
    }

    /// The output under a global point.
    #[must_use]
    pub fn output_at(&self, x: f64, y: f64) -> Option<&Output> {
        self.outputs
            .iter()
            .find(|o| o.layout_rect().contains(Point::new(x, y)))
    }

    /// The point inside some output closest to `(x, y)`.
    ///
    /// Output rectangles are treated as half-open; a point is clamped to just
    /// inside the right and bottom edges.
    #[must_use]
    pub fn closest_point(&self, x: f64, y: f64) -> (f64, f64) {
        let mut best = (x, y);
        let mut best_dist = f64::INFINITY;
        for output in &self.outputs {
            let r = output.layout_rect();
            if r.width() <= 0.0 || r.height() <= 0.0 {
                continue;
            }
            let cx = x.clamp(r.x0, r.x1 - EDGE_INSET);
            let cy = y.clamp(r.y0, r.y1 - EDGE_INSET);
            let dist = (cx - x).powi(2) + (cy - y).powi(2);
            if dist < best_dist {
                best_dist = dist;
                best = (cx, cy);
                if dist == 0.0 {
                    break;
                }
            }
        }
        best
    }

    /// Current outputs as reported to the control layer.
    #[must_use]
    pub fn infos(&self) -> Vec<OutputInfo> {
        self.outputs
            .iter()
            .map(|o| {
                let (width, height) = o.effective_resolution();
                let (x, y) = o.position();
                OutputInfo {
                    name: o.name().to_owned(),
                    key: o.key(),
                    scale: o.scale(),
                    width,
                    height,
                    x,
                    y,
                }
            })
            .collect()
    }

    fn insert(&mut self, descriptor: OutputDescriptor) -> OutputId {
        let id = OutputId(self.next_id);
        self.next_id += 1;
        self.outputs.push(Output::new(id, descriptor));
        id
    }

    fn remove(&mut self, id: OutputId) -> Option<Output> {
        let idx = self.outputs.iter().position(|o| o.id == id)?;
        if self.refresh_scheduled == Some(id) {
            self.refresh_scheduled = None;
        }
        Some(self.outputs.remove(idx))
    }

    /// Assigns fresh keys, places outputs and picks the refresh master.
    fn arrange(&mut self) {
        for output in &mut self.outputs {
            output.key = self.next_key;
            self.next_key += 1;
        }

        // Fixed positions first, then automatic placement to the right of
        // everything placed so far.
        let mut right_edge: Option<i32> = None;
        for output in self.outputs.iter_mut() {
            if let Some((x, y)) = output.configured_position {
                output.layout_x = x;
                output.layout_y = y;
                let (w, _) = output.effective_resolution();
                right_edge = Some(right_edge.map_or(x + w, |r| r.max(x + w)));
            }
        }
        for output in self.outputs.iter_mut() {
            if output.configured_position.is_none() {
                let x = right_edge.unwrap_or(0);
                output.layout_x = x;
                output.layout_y = 0;
                let (w, _) = output.effective_resolution();
                right_edge = Some(x + w);
                tracing::debug!(output = %output.name(), x, "placed automatically");
            }
        }

        let fastest = self.outputs.iter().map(Output::refresh_mhz).max();
        let keep = self
            .refresh_master
            .and_then(|id| self.output(id))
            .is_some_and(|o| Some(o.refresh_mhz()) == fastest);
        if !keep {
            self.refresh_master = self
                .outputs
                .iter()
                .find(|o| Some(o.refresh_mhz()) == fastest)
                .map(Output::id);
        }
        if let Some(master) = self.refresh_master.and_then(|id| self.output(id)) {
            tracing::debug!(output = %master.name(), key = master.key(), "following master output");
        }
    }
}

// ---------------------------------------------------------------------------
// Compositor entry points
// ---------------------------------------------------------------------------

impl Compositor {
    /// Adds an output, configures it and recomputes the layout.
    pub fn add_output(&mut self, descriptor: OutputDescriptor) -> OutputId {
        tracing::info!(output = %descriptor.name, "new output");
        let id = self.layout.insert(descriptor);
        if let Some(output) = self.layout.output_mut(id) {
            let section = self.config.find_output(output.name());
            match section.and_then(|s| s.position) {
                Some(p) => tracing::info!(output = %output.name(), x = p.x, y = p.y, "placing at fixed position"),
                None => tracing::info!(output = %output.name(), "placing automatically"),
            }
            output.configure(section);
        }
        self.recompute_layout();
        id
    }

    /// Removes an output and recomputes the layout.
    ///
    /// Contents pinned to the output lose their pin. Returns `false` if the
    /// output was already gone.
    pub fn remove_output(&mut self, id: OutputId) -> bool {
        let Some(removed) = self.layout.remove(id) else {
            return false;
        };
        tracing::info!(output = %removed.name(), "output removed");
        for cid in self.contents.ids() {
            let Some(content) = self.contents.get_mut(cid) else {
                continue;
            };
            if content.fixed_output == Some(id) {
                tracing::warn!(content = ?cid, output = %removed.name(), "removing stale fixed output");
                content.fixed_output = None;
            }
            let mut left = Vec::new();
            if let crate::content::ContentKind::View(view) = content.kind_mut()
                && view.entered.contains(&id)
            {
                view.entered.retain(|o| *o != id);
                left = view.surfaces().collect();
            }
            for surface in left {
                self.clients.surface_leave(surface, id);
            }
        }
        self.recompute_layout();
        true
    }

    /// Backend signal: an output's mode, transform or scale changed.
    pub fn output_state_changed(
        &mut self,
        id: OutputId,
        mode: Option<Mode>,
        transform: Option<Transform>,
        scale: Option<f64>,
    ) {
        let Some(output) = self.layout.output_mut(id) else {
            return;
        };
        output.apply_state(mode, transform, scale);
        self.recompute_layout();
    }

    /// Opens a headless output with no advertised modes.
    pub fn open_virtual_output(&mut self, name: &str) -> OutputId {
        self.add_output(OutputDescriptor::new(name))
    }

    /// Closes an output by name. Returns `false` if none matched.
    pub fn close_virtual_output(&mut self, name: &str) -> bool {
        match self.layout.output_by_name(name).map(Output::id) {
            Some(id) => self.remove_output(id),
            None => {
                tracing::warn!(output = name, "no such virtual output");
                false
            }
        }
    }

    /// Reassigns keys and positions, notifies the control layer, damages
    /// everything and refreshes view output membership.
    pub fn recompute_layout(&mut self) {
        self.layout.arrange();
        let infos = self.layout.infos();
        self.notify_control(Notice::LayoutChanged(infos));
        self.damage_whole();
        for id in self.contents.ids() {
            self.update_content_outputs(id);
        }
    }

    /// Damages every output completely.
    pub fn damage_whole(&mut self) {
        let ids: Vec<_> = self.layout.outputs().iter().map(Output::id).collect();
        for id in ids {
            if let Some(output) = self.layout.output_mut(id) {
                output.damage_mut().add_whole();
                output.schedule_frame();
            }
            self.layout.mark_refresh(id);
        }
    }

    /// Whether a content is on an output: pinned to it, or unpinned and
    /// overlapping it.
    #[must_use]
    pub fn is_on_output(&self, content: ContentId, output: OutputId) -> bool {
        match (self.contents.get(content), self.layout.output(output)) {
            (Some(c), Some(o)) => c.is_on(o.id(), o.layout_rect()),
            _ => false,
        }
    }

    /// Damages a content's footprint on every output it is on.
    ///
    /// `hint` narrows the damage to a sub-rectangle given relative to the
    /// content's box. While the session is locked the hint is dropped for
    /// contents hidden by the lock screen.
    pub fn damage_from(&mut self, id: ContentId, hint: Option<Rect>) {
        let Some(content) = self.contents.get(id) else {
            return;
        };
        let hint = if self.is_locked() && !content.lock_enabled() {
            None
        } else {
            hint
        };
        let b = content.display_box();
        let area = hint.map_or_else(|| content.footprint(), |h| h + Vec2::new(b.x, b.y));
        let workspace = content.workspace().map(|w| w.to_rect());

        let mut per_output = Vec::new();
        for output in self.layout.outputs() {
            if !content.is_on(output.id(), output.layout_rect()) {
                continue;
            }
            let mut region = Region::from_rect(IRect::from_rect_outward(output.to_local(area)));
            if let Some(ws) = workspace {
                region = region.intersect_rect(&IRect::from_rect_outward(output.to_local(ws)));
            }
            per_output.push((output.id(), region));
        }
        for (output, region) in per_output {
            self.damage_output(output, &region, Some(id));
        }
    }

    /// Adds damage to one output, widening it for effect layers above
    /// `from`, and schedules a frame.
    pub fn damage_output(&mut self, output: OutputId, region: &Region, from: Option<ContentId>) {
        let from_z = from
            .and_then(|id| self.contents.get(id))
            .map_or(f64::NEG_INFINITY, |c| c.z_index());
        let Some(out) = self.layout.output_mut(output) else {
            return;
        };
        if out.damage_mut().add(region) {
            out.schedule_frame();
        }

        let out_rect = out.layout_rect();
        let scale = out.scale();
        let mut extra = Region::new();
        for (cid, content) in self.contents.iter() {
            let Some(effect) = content.kind().effect() else {
                continue;
            };
            if Some(cid) == from || content.z_index() <= from_z || !content.is_on(output, out_rect)
            {
                continue;
            }
            #[expect(
                clippy::cast_possible_truncation,
                reason = "spread is a small pixel distance"
            )]
            let spread = (effect.damage_spread() * scale).ceil() as i32;
            if spread <= 0 {
                continue;
            }
            let footprint = IRect::from_rect_outward(out.to_local(content.footprint()));
            extra.union(&region.expand(spread).intersect_rect(&footprint));
        }
        if !extra.is_empty() && out.damage_mut().add(&extra) {
            out.schedule_frame();
        }

        self.layout.mark_refresh(output);
    }

    /// Sends surface enter/leave for every output a view started or stopped
    /// overlapping. No-op for non-view contents.
    pub fn update_content_outputs(&mut self, id: ContentId) {
        let Some(content) = self.contents.get(id) else {
            return;
        };
        let Some(view) = content.kind().as_view() else {
            return;
        };
        let mut entered = Vec::new();
        let mut left = Vec::new();
        for output in self.layout.outputs() {
            let on = content.is_on(output.id(), output.layout_rect());
            let was = view.entered.contains(&output.id());
            if on && !was {
                entered.push(output.id());
            } else if !on && was {
                left.push(output.id());
            }
        }
        if entered.is_empty() && left.is_empty() {
            return;
        }
        let surfaces: Vec<SurfaceId> = view.surfaces().collect();

        if let Some(crate::content::ContentKind::View(view)) =
            self.contents.get_mut(id).map(|c| c.kind_mut())
        {
            view.entered.retain(|o| !left.contains(o));
            view.entered.extend(entered.iter().copied());
        }
        for output in left {
            for &surface in &surfaces {
                self.clients.surface_leave(surface, output);
            }
        }
        for output in entered {
            for &surface in &surfaces {
                self.clients.surface_enter(surface, output);
            }
        }
    }

    /// Resets the refresh output for a new cycle.
    pub fn start_update(&mut self) {
        self.layout.start_update();
    }

    /// The output whose frame should trigger the per-frame update.
    #[must_use]
    pub fn refresh_output(&self) -> Option<OutputId> {
        self.layout.refresh_output()
    }

    /// Frame-production hook, called after `output` committed a frame.
    ///
    /// If this output drives the current refresh cycle, starts a new cycle
    /// and runs the control layer's per-frame update. Damage the update
    /// causes counts toward the new cycle. Returns whether the update ran.
    pub fn frame_committed(&mut self, output: OutputId) -> bool {
        self.layout.mark_refresh(output);
        if self.layout.refresh_output() != Some(output) {
            return false;
        }
        self.layout.start_update();
        self.call_control("update", (), |layer, comp| layer.update(comp));
        true
    }
}
