// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag-and-drop icon tracking.

use crate::Compositor;
use crate::content::{
    Content, ContentBox, ContentId, ContentKind, DRAG_OPACITY, DRAG_Z_INDEX, DragIcon, SurfaceId,
};

impl Compositor {
    /// Starts a drag-and-drop session, optionally with a client icon.
    ///
    /// Creates a dimmed drag-icon content above everything else. A session
    /// already in progress is ended first.
    pub fn start_drag(&mut self, icon: Option<SurfaceId>) -> ContentId {
        if self.seat.drag.is_some() {
            self.end_drag();
        }
        let mut content = Content::new(ContentKind::Drag(DragIcon {
            surface: icon,
            size: (0, 0),
        }));
        content.opacity = DRAG_OPACITY;
        content.z_index = DRAG_Z_INDEX;
        let id = self.contents.insert(content);
        tracing::debug!(content = ?id, ?icon, "drag started");
        self.seat.drag = Some(id);
        self.damage_whole();
        id
    }

    /// The drag icon surface committed a buffer of the given size.
    pub fn drag_icon_committed(&mut self, width: i32, height: i32) {
        let Some(id) = self.seat.drag else {
            return;
        };
        if let Some(ContentKind::Drag(icon)) = self.contents.get_mut(id).map(Content::kind_mut) {
            icon.size = (width, height);
        }
        self.update_drag_position();
    }

    /// The drag icon surface was unmapped or destroyed.
    pub fn drag_icon_destroyed(&mut self) {
        let Some(id) = self.seat.drag else {
            return;
        };
        tracing::debug!(content = ?id, "drag icon destroyed");
        self.damage_from(id, None);
        if let Some(ContentKind::Drag(icon)) = self.contents.get_mut(id).map(Content::kind_mut) {
            icon.surface = None;
        }
    }

    /// Ends the drag-and-drop session and removes its icon.
    pub fn end_drag(&mut self) {
        let Some(id) = self.seat.drag.take() else {
            return;
        };
        tracing::debug!(content = ?id, "drag ended");
        // The handle came from the seat and cannot be stale.
        _ = self.destroy(id);
    }

    /// Recenters the drag icon on the cursor.
    pub(crate) fn update_drag_position(&mut self) {
        let Some(id) = self.seat.drag else {
            return;
        };
        let Some(ContentKind::Drag(icon)) = self.contents.get(id).map(Content::kind) else {
            return;
        };
        if icon.surface.is_none() {
            return;
        }
        let (w, h) = (f64::from(icon.size.0), f64::from(icon.size.1));
        let (x, y) = self.seat.cursor.position();
        _ = self.set_box(id, ContentBox::new(x - 0.5 * w, y - 0.5 * h, w, h));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompositorConfig;
    use crate::damage::IRect;
    use crate::output::{Mode, OutputDescriptor};

    fn compositor() -> Compositor {
        let mut comp = Compositor::new(CompositorConfig::default());
        comp.add_output(
            OutputDescriptor::new("DP-1").with_mode(Mode::new(800, 600, 60000).preferred()),
        );
        comp
    }

    #[test]
    fn drag_icon_follows_cursor() {
        let mut comp = compositor();
        comp.notify_motion(100.0, 100.0, 0);
        let id = comp.start_drag(Some(SurfaceId(9)));
        let content = comp.contents().get(id).unwrap();
        assert_eq!(content.opacity(), DRAG_OPACITY);
        assert_eq!(content.z_index(), DRAG_Z_INDEX);

        comp.drag_icon_committed(20, 10);
        assert_eq!(
            comp.content_box(id).unwrap(),
            ContentBox::new(90.0, 95.0, 20.0, 10.0)
        );
        comp.notify_motion(50.0, 0.0, 1);
        assert_eq!(
            comp.content_box(id).unwrap(),
            ContentBox::new(140.0, 95.0, 20.0, 10.0)
        );
    }

    #[test]
    fn start_damages_everything_and_end_removes_icon() {
        let mut comp = compositor();
        let out = comp.layout().outputs()[0].id();
        comp.output_mut(out).unwrap().finish_frame();
        let id = comp.start_drag(None);
        assert_eq!(
            comp.output(out).unwrap().damage().current().extents(),
            Some(IRect::new(0, 0, 800, 600))
        );
        assert_eq!(comp.seat().drag(), Some(id));
        comp.end_drag();
        assert!(comp.seat().drag().is_none());
        assert!(!comp.contents().is_alive(id));
    }

    #[test]
    fn icon_damage_tracks_real_moves_only() {
        let mut comp = compositor();
        let out = comp.layout().outputs()[0].id();
        comp.notify_motion(100.0, 100.0, 0);
        comp.start_drag(Some(SurfaceId(9)));
        comp.drag_icon_committed(20, 10);
        comp.output_mut(out).unwrap().finish_frame();

        comp.update_drag_position();
        assert!(
            comp.output(out).unwrap().damage().current().is_empty(),
            "a stationary icon damages nothing"
        );

        comp.notify_motion(50.0, 0.0, 1);
        let damage = comp.output(out).unwrap().damage().current().clone();
        assert!(damage.covers(&IRect::new(90, 95, 20, 10)), "{damage:?}");
        assert!(damage.covers(&IRect::new(140, 95, 20, 10)), "{damage:?}");
    }

    #[test]
    fn iconless_drag_stays_put() {
        let mut comp = compositor();
        let id = comp.start_drag(None);
        comp.notify_motion(100.0, 100.0, 0);
        assert_eq!(comp.content_box(id).unwrap(), ContentBox::default());
    }
}
