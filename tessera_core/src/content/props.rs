// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content constructors and the property surface.
//!
//! Every setter is debounced against the current value and brackets the
//! change with damage: geometry changes damage both the old and the new
//! footprint, appearance changes damage the footprint once afterwards. A
//! stale handle is reported as [`SceneError::StaleContent`] and leaves
//! everything untouched.

use kurbo::Rect;

use super::{
    Composite, Content, ContentBox, ContentId, ContentKind, Effect, FINE_EPSILON,
    GEOMETRY_EPSILON, PixelBuffer, Primitive, SurfaceId, View, Widget, WidgetContent,
};
use crate::Compositor;
use crate::control::Notice;
use crate::error::SceneError;

impl Compositor {
    fn content(&self, id: ContentId) -> Result<&Content, SceneError> {
        self.contents.get(id).ok_or(SceneError::StaleContent(id))
    }

    /// Applies `f` to a live content. The caller has already checked the
    /// handle, so a miss here is silently ignored.
    fn modify(&mut self, id: ContentId, f: impl FnOnce(&mut Content)) {
        if let Some(content) = self.contents.get_mut(id) {
            f(content);
        }
    }

    // -- Constructors --

    /// Creates a view for a client surface tree and tells the control layer.
    pub fn create_view(&mut self, view: View) -> ContentId {
        let id = self.contents.insert(Content::new(ContentKind::View(view)));
        tracing::debug!(content = ?id, "view created");
        self.notify_control(Notice::ViewCreated(id));
        self.update_content_outputs(id);
        id
    }

    /// Creates an empty widget.
    pub fn create_widget(&mut self) -> ContentId {
        self.contents
            .insert(Content::new(ContentKind::Widget(Widget::default())))
    }

    /// Creates a composite-effect layer.
    pub fn create_composite(&mut self, effect: Effect) -> ContentId {
        self.contents
            .insert(Content::new(ContentKind::Composite(Composite { effect })))
    }

    /// Damages the footprint one last time and removes the content.
    ///
    /// Views report their destruction to the control layer while still
    /// alive, so the layer can query them. From inside a control callback
    /// the report is queued and arrives after removal.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] if the content is already gone.
    pub fn destroy(&mut self, id: ContentId) -> Result<(), SceneError> {
        let is_view = self.content(id)?.kind().as_view().is_some();
        self.damage_from(id, None);
        if is_view {
            self.notify_control(Notice::ViewDestroyed(id));
        }
        if self.seat.focused_view() == Some(id) {
            self.clear_focus();
        }
        self.seat.forget_view(id);
        if let Some(content) = self.contents.remove(id)
            && let ContentKind::View(view) = content.kind
        {
            for &output in &view.entered {
                for surface in view.surfaces() {
                    self.clients.surface_leave(surface, output);
                }
            }
        }
        tracing::debug!(content = ?id, "destroyed");
        Ok(())
    }

    // -- Geometry --

    /// Display box.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content.
    pub fn content_box(&self, id: ContentId) -> Result<ContentBox, SceneError> {
        Ok(self.content(id)?.display_box())
    }

    /// Moves or resizes a content.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content.
    pub fn set_box(&mut self, id: ContentId, display: ContentBox) -> Result<(), SceneError> {
        if self.content(id)?.display.distance(&display) < GEOMETRY_EPSILON {
            return Ok(());
        }
        self.damage_from(id, None);
        self.modify(id, |c| c.display = display);
        self.damage_from(id, None);
        self.update_content_outputs(id);
        Ok(())
    }

    /// Workspace clip as last set; a negative size means no clip.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content.
    pub fn content_workspace(&self, id: ContentId) -> Result<ContentBox, SceneError> {
        Ok(self.content(id)?.raw_workspace())
    }

    /// Sets the workspace clip. A negative width or height removes it.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content.
    pub fn set_workspace(&mut self, id: ContentId, workspace: ContentBox) -> Result<(), SceneError> {
        if self.content(id)?.workspace.distance(&workspace) < GEOMETRY_EPSILON {
            return Ok(());
        }
        self.damage_from(id, None);
        self.modify(id, |c| c.workspace = workspace);
        self.damage_from(id, None);
        self.update_content_outputs(id);
        Ok(())
    }

    /// Pins a content to the output with the given key, or releases the pin
    /// with `None`.
    ///
    /// An unknown key is logged and releases the pin.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content.
    pub fn set_output(&mut self, id: ContentId, key: Option<i32>) -> Result<(), SceneError> {
        self.content(id)?;
        let target = key.and_then(|key| {
            let found = self.layout.output_by_key(key).map(|o| o.id());
            if found.is_none() {
                tracing::warn!(content = ?id, key, "invalid output key, releasing pin");
            }
            found
        });
        if self.content(id)?.fixed_output == target {
            return Ok(());
        }
        self.damage_from(id, None);
        self.modify(id, |c| c.fixed_output = target);
        self.damage_from(id, None);
        self.update_content_outputs(id);
        Ok(())
    }

    /// Key of the output a content is pinned to, if any.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content.
    pub fn content_output(&self, id: ContentId) -> Result<Option<i32>, SceneError> {
        Ok(self
            .content(id)?
            .fixed_output()
            .and_then(|o| self.layout.output(o))
            .map(|o| o.key()))
    }

    // -- Appearance --

    /// Rendering priority.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content.
    pub fn content_z_index(&self, id: ContentId) -> Result<f64, SceneError> {
        Ok(self.content(id)?.z_index())
    }

    /// Changes the rendering priority.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content.
    pub fn set_z_index(&mut self, id: ContentId, z_index: f64) -> Result<(), SceneError> {
        if (self.content(id)?.z_index - z_index).abs() < FINE_EPSILON {
            return Ok(());
        }
        self.modify(id, |c| c.z_index = z_index);
        self.contents.mark_z_dirty();
        self.damage_from(id, None);
        Ok(())
    }

    /// Opacity.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content.
    pub fn content_opacity(&self, id: ContentId) -> Result<f64, SceneError> {
        Ok(self.content(id)?.opacity())
    }

    /// Sets the opacity, clamped to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content.
    pub fn set_opacity(&mut self, id: ContentId, opacity: f64) -> Result<(), SceneError> {
        let opacity = opacity.clamp(0.0, 1.0);
        if (self.content(id)?.opacity - opacity).abs() < FINE_EPSILON {
            return Ok(());
        }
        self.modify(id, |c| c.opacity = opacity);
        self.damage_from(id, None);
        Ok(())
    }

    /// Mask relative to the box, negative sizes resolved to the content edge.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content.
    pub fn content_mask(&self, id: ContentId) -> Result<ContentBox, SceneError> {
        Ok(self.content(id)?.mask())
    }

    /// Sets the mask. A negative width or height extends it to the content
    /// edge.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content.
    pub fn set_mask(&mut self, id: ContentId, mask: ContentBox) -> Result<(), SceneError> {
        if self.content(id)?.mask.distance(&mask) < FINE_EPSILON {
            return Ok(());
        }
        self.modify(id, |c| c.mask = mask);
        self.damage_from(id, None);
        Ok(())
    }

    /// Corner radius.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content.
    pub fn content_corner_radius(&self, id: ContentId) -> Result<f64, SceneError> {
        Ok(self.content(id)?.corner_radius())
    }

    /// Sets the corner radius.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content.
    pub fn set_corner_radius(&mut self, id: ContentId, radius: f64) -> Result<(), SceneError> {
        if (self.content(id)?.corner_radius - radius).abs() < GEOMETRY_EPSILON {
            return Ok(());
        }
        self.modify(id, |c| c.corner_radius = radius);
        self.damage_from(id, None);
        Ok(())
    }

    /// Keeps a content visible on the lock screen.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content.
    pub fn set_lock_enabled(&mut self, id: ContentId, enabled: bool) -> Result<(), SceneError> {
        if self.content(id)?.lock_enabled == enabled {
            return Ok(());
        }
        self.modify(id, |c| c.lock_enabled = enabled);
        self.damage_from(id, None);
        Ok(())
    }

    // -- Widgets --

    fn widget_mut(&mut self, id: ContentId) -> Result<&mut Widget, SceneError> {
        match self.contents.get_mut(id).map(Content::kind_mut) {
            None => Err(SceneError::StaleContent(id)),
            Some(ContentKind::Widget(widget)) => Ok(widget),
            Some(_) => Err(SceneError::WrongKind {
                id,
                expected: "widget",
            }),
        }
    }

    /// Replaces a widget's drawing with a pixel buffer.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content,
    /// [`SceneError::WrongKind`] if it is not a widget.
    pub fn set_widget_pixels(&mut self, id: ContentId, pixels: PixelBuffer) -> Result<(), SceneError> {
        self.widget_mut(id)?.content = WidgetContent::Pixels(pixels);
        self.damage_from(id, None);
        Ok(())
    }

    /// Replaces a widget's drawing with a named primitive.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content,
    /// [`SceneError::WrongKind`] if it is not a widget.
    pub fn set_widget_primitive(
        &mut self,
        id: ContentId,
        primitive: Primitive,
    ) -> Result<(), SceneError> {
        self.widget_mut(id)?.content = WidgetContent::Primitive(primitive);
        self.damage_from(id, None);
        Ok(())
    }

    // -- Views --

    fn view_mut(&mut self, id: ContentId) -> Result<&mut View, SceneError> {
        match self.contents.get_mut(id).map(Content::kind_mut) {
            None => Err(SceneError::StaleContent(id)),
            Some(ContentKind::View(view)) => Ok(view),
            Some(_) => Err(SceneError::WrongKind { id, expected: "view" }),
        }
    }

    /// Forwards a client-originated view event (e.g. `"request_fullscreen"`)
    /// to the control layer.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content,
    /// [`SceneError::WrongKind`] if it is not a view.
    pub fn view_event(&mut self, id: ContentId, event: &str) -> Result<(), SceneError> {
        self.view_mut(id)?;
        self.notify_control(Notice::ViewEvent(id, event.to_owned()));
        Ok(())
    }

    /// A client committed new contents in `rect`, given in surface-local
    /// units.
    ///
    /// The rect is scaled from surface units to the view's box before it is
    /// used as a damage hint.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content,
    /// [`SceneError::WrongKind`] if it is not a view.
    pub fn damage_view_surface(&mut self, id: ContentId, rect: Rect) -> Result<(), SceneError> {
        let (sw, sh) = self.view_mut(id)?.surface_size;
        let b = self.content(id)?.display_box();
        let hint = if sw > 0 && sh > 0 {
            let fx = b.width / f64::from(sw);
            let fy = b.height / f64::from(sh);
            Some(Rect::new(rect.x0 * fx, rect.y0 * fy, rect.x1 * fx, rect.y1 * fy))
        } else {
            None
        };
        self.damage_from(id, hint);
        Ok(())
    }

    /// Records the size of the client's last committed root buffer.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content,
    /// [`SceneError::WrongKind`] if it is not a view.
    pub fn set_view_surface_size(
        &mut self,
        id: ContentId,
        width: i32,
        height: i32,
    ) -> Result<(), SceneError> {
        let view = self.view_mut(id)?;
        if view.surface_size == (width, height) {
            return Ok(());
        }
        view.surface_size = (width, height);
        self.damage_from(id, None);
        Ok(())
    }

    /// Sets title and application id.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content,
    /// [`SceneError::WrongKind`] if it is not a view.
    pub fn set_view_identity(
        &mut self,
        id: ContentId,
        title: &str,
        app_id: &str,
    ) -> Result<(), SceneError> {
        let view = self.view_mut(id)?;
        title.clone_into(&mut view.title);
        app_id.clone_into(&mut view.app_id);
        Ok(())
    }

    /// Attaches a popup or subsurface to a view.
    ///
    /// The child is told about every output the view is already on.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content,
    /// [`SceneError::WrongKind`] if it is not a view.
    pub fn add_view_child(&mut self, id: ContentId, child: SurfaceId) -> Result<(), SceneError> {
        let view = self.view_mut(id)?;
        if view.children.contains(&child) {
            return Ok(());
        }
        view.children.push(child);
        let entered = view.entered.clone();
        for output in entered {
            self.clients.surface_enter(child, output);
        }
        self.damage_from(id, None);
        Ok(())
    }

    /// Detaches a popup or subsurface.
    ///
    /// # Errors
    ///
    /// [`SceneError::StaleContent`] for a destroyed content,
    /// [`SceneError::WrongKind`] if it is not a view.
    pub fn remove_view_child(&mut self, id: ContentId, child: SurfaceId) -> Result<(), SceneError> {
        let view = self.view_mut(id)?;
        let before = view.children.len();
        view.children.retain(|c| *c != child);
        if view.children.len() != before {
            self.damage_from(id, None);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompositorConfig;
    use crate::damage::IRect;
    use crate::output::{Mode, Output, OutputDescriptor, OutputId};

    fn compositor() -> (Compositor, OutputId) {
        let mut comp = Compositor::new(CompositorConfig::default());
        let out = comp.add_output(
            OutputDescriptor::new("DP-1").with_mode(Mode::new(800, 600, 60000).preferred()),
        );
        (comp, out)
    }

    fn settle(comp: &mut Compositor) {
        let ids: Vec<_> = comp.layout().outputs().iter().map(Output::id).collect();
        for id in ids {
            comp.output_mut(id).unwrap().finish_frame();
        }
    }

    fn damage(comp: &Compositor, out: OutputId) -> Option<IRect> {
        comp.output(out).unwrap().damage().current().extents()
    }

    #[test]
    fn set_box_damages_old_and_new_footprint() {
        let (mut comp, out) = compositor();
        let w = comp.create_widget();
        comp.set_box(w, ContentBox::new(10.0, 10.0, 20.0, 20.0)).unwrap();
        settle(&mut comp);

        comp.set_box(w, ContentBox::new(100.0, 100.0, 20.0, 20.0)).unwrap();
        let region = comp.output(out).unwrap().damage().current().clone();
        assert!(region.covers(&IRect::new(10, 10, 20, 20)), "old footprint");
        assert!(region.covers(&IRect::new(100, 100, 20, 20)), "new footprint");
        assert_eq!(comp.content_box(w).unwrap(), ContentBox::new(100.0, 100.0, 20.0, 20.0));
    }

    #[test]
    fn sub_epsilon_changes_are_ignored() {
        let (mut comp, out) = compositor();
        let w = comp.create_widget();
        comp.set_box(w, ContentBox::new(10.0, 10.0, 20.0, 20.0)).unwrap();
        comp.set_opacity(w, 0.5).unwrap();
        comp.set_z_index(w, 1.0).unwrap();
        settle(&mut comp);

        comp.set_box(w, ContentBox::new(10.004, 10.004, 20.0, 20.0)).unwrap();
        comp.set_opacity(w, 0.50005).unwrap();
        comp.set_z_index(w, 1.00005).unwrap();
        comp.set_corner_radius(w, 0.005).unwrap();
        assert_eq!(damage(&comp, out), None);
        assert_eq!(comp.content_box(w).unwrap(), ContentBox::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(comp.content_opacity(w).unwrap(), 0.5);
        assert_eq!(comp.content_z_index(w).unwrap(), 1.0);
    }

    #[test]
    fn appearance_changes_damage_footprint() {
        let (mut comp, out) = compositor();
        let w = comp.create_widget();
        comp.set_box(w, ContentBox::new(10.0, 10.0, 20.0, 20.0)).unwrap();
        settle(&mut comp);

        comp.set_mask(w, ContentBox::new(0.0, 0.0, 5.0, 5.0)).unwrap();
        assert_eq!(damage(&comp, out), Some(IRect::new(10, 10, 20, 20)));
        assert_eq!(comp.content_mask(w).unwrap(), ContentBox::new(0.0, 0.0, 5.0, 5.0));
    }

    #[test]
    fn stale_handles_are_rejected_without_side_effects() {
        let (mut comp, out) = compositor();
        let w = comp.create_widget();
        comp.set_box(w, ContentBox::new(10.0, 10.0, 20.0, 20.0)).unwrap();
        comp.destroy(w).unwrap();
        settle(&mut comp);

        assert_eq!(
            comp.set_box(w, ContentBox::new(0.0, 0.0, 1.0, 1.0)),
            Err(SceneError::StaleContent(w))
        );
        assert_eq!(comp.destroy(w), Err(SceneError::StaleContent(w)));
        assert_eq!(damage(&comp, out), None);
    }

    #[test]
    fn destroy_damages_the_vacated_footprint() {
        let (mut comp, out) = compositor();
        let w = comp.create_widget();
        comp.set_box(w, ContentBox::new(10.0, 10.0, 20.0, 20.0)).unwrap();
        settle(&mut comp);
        comp.destroy(w).unwrap();
        assert_eq!(damage(&comp, out), Some(IRect::new(10, 10, 20, 20)));
        assert!(comp.contents().is_empty());
    }

    #[test]
    fn invalid_output_key_releases_pin() {
        let (mut comp, out) = compositor();
        let key = comp.output(out).unwrap().key();
        let w = comp.create_widget();
        comp.set_output(w, Some(key)).unwrap();
        assert_eq!(comp.content_output(w).unwrap(), Some(key));
        assert!(comp.is_on_output(w, out), "pinned with an empty box");

        comp.set_output(w, Some(key + 100)).unwrap();
        assert_eq!(comp.content_output(w).unwrap(), None);
        assert!(!comp.is_on_output(w, out));
    }

    #[test]
    fn pixels_and_primitive_are_exclusive() {
        let (mut comp, _) = compositor();
        let w = comp.create_widget();
        comp.set_widget_pixels(
            w,
            PixelBuffer {
                width: 1,
                height: 1,
                stride: 4,
                data: vec![0; 4],
                ..PixelBuffer::default()
            },
        )
        .unwrap();
        comp.set_widget_primitive(
            w,
            Primitive {
                name: "rect".into(),
                ..Primitive::default()
            },
        )
        .unwrap();
        let Some(ContentKind::Widget(widget)) = comp.contents().get(w).map(Content::kind) else {
            panic!("widget expected");
        };
        assert!(matches!(widget.content, WidgetContent::Primitive(_)));

        let tint = comp.create_composite(Effect::Tint { color: [0.0; 4] });
        assert_eq!(
            comp.set_widget_primitive(tint, Primitive::default()),
            Err(SceneError::WrongKind {
                id: tint,
                expected: "widget"
            })
        );
    }

    #[test]
    fn surface_damage_is_scaled_into_the_box() {
        let (mut comp, out) = compositor();
        let v = comp.create_view(View::new(SurfaceId(1)).with_surface_size(200, 200));
        comp.set_box(v, ContentBox::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        settle(&mut comp);

        comp.damage_view_surface(v, Rect::new(20.0, 20.0, 40.0, 40.0)).unwrap();
        assert_eq!(damage(&comp, out), Some(IRect::new(10, 10, 10, 10)));
    }
}
