// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-output frame production.
//!
//! The backend calls [`FrameProducer::produce`] from each output's frame
//! callback. One call walks the output through its frame states:
//!
//! ```text
//!   Requested ──► Rendering ──► Committed ──► (presented) ──► Idle
//!                     │
//!                     └──► Idle   (nothing damaged: rolled back)
//! ```

use std::collections::HashMap;

use tessera_core::Compositor;
use tessera_core::damage::Region;
use tessera_core::error::SceneError;
use tessera_core::output::OutputId;
use tessera_core::time::HostTime;
use tessera_core::trace::{
    ChainBuiltEvent, FrameBeginEvent, FrameCommittedEvent, FrameSkippedEvent, SkipReason, Tracer,
};

use crate::chain::ComposeChain;
use crate::plan::RenderPlan;
use crate::renderer::Renderer;

/// What a frame callback did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Nothing was drawn or committed.
    Skipped(SkipReason),
    /// The frame was drawn and handed to the backend.
    Committed {
        /// Committed damage in buffer coordinates.
        damage: Region,
        /// Whether the backend accepted the commit. A rejected frame keeps
        /// its damage for the next callback.
        ok: bool,
        /// Whether this frame drove the control layer's per-frame update.
        update_ran: bool,
        /// Output-local area whose draws or effects failed. It stays damaged
        /// and is redrawn by the next frame.
        stale: Region,
    },
}

impl FrameOutcome {
    /// Returns `true` if the backend accepted a frame.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { ok: true, .. })
    }

    /// Returns `true` if a committed frame left part of its damage undrawn.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Committed { stale, .. } if !stale.is_empty())
    }
}

/// Drives frame callbacks and numbers frames per output.
#[derive(Debug, Default)]
pub struct FrameProducer {
    frame_index: HashMap<OutputId, u64>,
}

impl FrameProducer {
    /// Creates a producer with every frame counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frame callbacks seen for an output so far.
    #[must_use]
    pub fn frames(&self, output: OutputId) -> u64 {
        self.frame_index.get(&output).copied().unwrap_or(0)
    }

    /// Handles one frame callback for `output`.
    ///
    /// Skips disabled outputs and outputs with neither damage nor a backend
    /// request (rolling back the acquired buffer). Otherwise draws the
    /// damaged area band by band, commits with the damage mapped back to
    /// buffer coordinates, and, if this output drives the refresh cycle,
    /// runs the control layer's per-frame update.
    ///
    /// # Errors
    ///
    /// [`SceneError::UnknownOutput`] if the output has been removed.
    pub fn produce(
        &mut self,
        comp: &mut Compositor,
        output: OutputId,
        renderer: &mut dyn Renderer,
        now: HostTime,
        tracer: &mut Tracer<'_>,
    ) -> Result<FrameOutcome, SceneError> {
        let out = comp.output(output).ok_or(SceneError::UnknownOutput(output))?;
        let counter = self.frame_index.entry(output).or_insert(0);
        let frame_index = *counter;
        *counter += 1;
        tracer.frame_begin(&FrameBeginEvent {
            frame_index,
            output,
            now,
        });

        if !out.is_enabled() {
            return Ok(skipped(tracer, frame_index, output, SkipReason::Disabled));
        }
        let age = match renderer.begin_frame(out) {
            Ok(age) => age,
            Err(err) => {
                tracing::debug!(output = %out.name(), %err, "no buffer for frame");
                return Ok(skipped(tracer, frame_index, output, SkipReason::NoBuffer));
            }
        };

        let out = comp
            .output_mut(output)
            .ok_or(SceneError::UnknownOutput(output))?;
        out.begin_frame();
        if !out.needs_frame() && out.damage().current().is_empty() {
            renderer.rollback(output);
            out.rollback_frame();
            return Ok(skipped(tracer, frame_index, output, SkipReason::NoDamage));
        }
        let damage = out.damage().buffer_damage(age);

        comp.update_contents();
        let out = comp.output(output).ok_or(SceneError::UnknownOutput(output))?;
        let chain = ComposeChain::build(comp, out, &damage);
        let plan = RenderPlan::build(comp, out, &chain);
        tracer.chain_built(&ChainBuiltEvent {
            frame_index,
            output,
            bands: chain.len(),
            items: plan.item_count(),
        });
        let stale = plan.execute(renderer);

        let (width, height) = out.transformed_resolution();
        let frame_damage = out
            .damage()
            .current()
            .transformed(out.transform().invert(), width, height);
        let committed = renderer.commit(output, &frame_damage);
        if let Err(err) = &committed {
            tracing::warn!(output = %out.name(), %err, "commit frame failed");
        }
        let out = comp
            .output_mut(output)
            .ok_or(SceneError::UnknownOutput(output))?;
        if committed.is_ok() {
            out.finish_frame();
            if !stale.is_empty() {
                tracing::debug!(output = %out.name(), ?stale, "retrying failed draws");
                out.redamage(&stale);
            }
        } else {
            // Keep the damage so the next callback redraws it.
            out.rollback_frame();
            out.schedule_frame();
        }
        tracer.frame_committed(&FrameCommittedEvent {
            frame_index,
            output,
            damage_rects: frame_damage.rects().len(),
            ok: committed.is_ok(),
            committed_at: now,
        });

        let update_ran = committed.is_ok() && comp.frame_committed(output);
        Ok(FrameOutcome::Committed {
            damage: frame_damage,
            ok: committed.is_ok(),
            update_ran,
            stale,
        })
    }
}

fn skipped(
    tracer: &mut Tracer<'_>,
    frame_index: u64,
    output: OutputId,
    reason: SkipReason,
) -> FrameOutcome {
    tracer.frame_skipped(&FrameSkippedEvent {
        frame_index,
        output,
        reason,
    });
    FrameOutcome::Skipped(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::config::CompositorConfig;
    use tessera_core::content::ContentBox;
    use tessera_core::damage::IRect;
    use tessera_core::error::RenderError;
    use tessera_core::output::{FrameState, Mode, Output, OutputDescriptor, Transform};

    use crate::plan::{EffectPass, RenderItem};
    use crate::renderer::Target;

    #[derive(Default)]
    struct Counting {
        age: u32,
        refuse_buffer: bool,
        refuse_commit: bool,
        fail_draws: usize,
        draws: usize,
        rollbacks: usize,
        commits: Vec<Region>,
    }

    impl Renderer for Counting {
        fn begin_frame(&mut self, _: &Output) -> Result<u32, RenderError> {
            if self.refuse_buffer {
                return Err(RenderError::Acquire("busy".into()));
            }
            Ok(self.age)
        }
        fn rollback(&mut self, _: OutputId) {
            self.rollbacks += 1;
        }
        fn clear(&mut self, _: Target, _: &Region, _: [f32; 4]) {}
        fn draw(&mut self, _: Target, _: &RenderItem<'_>) -> Result<(), RenderError> {
            if self.fail_draws > 0 {
                self.fail_draws -= 1;
                return Err(RenderError::MissingBuffer);
            }
            self.draws += 1;
            Ok(())
        }
        fn apply_effect(
            &mut self,
            _: Target,
            _: Target,
            _: &EffectPass<'_>,
        ) -> Result<(), RenderError> {
            Ok(())
        }
        fn commit(&mut self, _: OutputId, damage: &Region) -> Result<(), RenderError> {
            if self.refuse_commit {
                return Err(RenderError::Commit("lost".into()));
            }
            self.commits.push(damage.clone());
            Ok(())
        }
    }

    fn scene() -> (Compositor, OutputId) {
        let mut comp = Compositor::new(CompositorConfig::default());
        let id = comp.add_output(
            OutputDescriptor::new("DP-1").with_mode(Mode::new(800, 600, 60000).preferred()),
        );
        (comp, id)
    }

    fn produce(
        producer: &mut FrameProducer,
        comp: &mut Compositor,
        id: OutputId,
        renderer: &mut Counting,
    ) -> FrameOutcome {
        producer
            .produce(comp, id, renderer, HostTime::from_millis(16), &mut Tracer::none())
            .unwrap()
    }

    #[test]
    fn first_frame_commits_the_whole_output() {
        let (mut comp, id) = scene();
        let mut producer = FrameProducer::new();
        let mut renderer = Counting::default();
        let outcome = produce(&mut producer, &mut comp, id, &mut renderer);
        assert!(outcome.is_committed());
        assert_eq!(
            renderer.commits[0].extents(),
            Some(IRect::new(0, 0, 800, 600))
        );
        assert_eq!(comp.output(id).unwrap().frame_state(), FrameState::Committed);
        assert!(comp.output(id).unwrap().damage().current().is_empty());
        assert_eq!(producer.frames(id), 1);
    }

    #[test]
    fn undamaged_frames_roll_back() {
        let (mut comp, id) = scene();
        let mut producer = FrameProducer::new();
        let mut renderer = Counting::default();
        produce(&mut producer, &mut comp, id, &mut renderer);

        let outcome = produce(&mut producer, &mut comp, id, &mut renderer);
        assert_eq!(outcome, FrameOutcome::Skipped(SkipReason::NoDamage));
        assert_eq!(renderer.rollbacks, 1);
        assert_eq!(renderer.commits.len(), 1);
        assert_eq!(comp.output(id).unwrap().frame_state(), FrameState::Idle);

        comp.output_mut(id).unwrap().set_needs_frame();
        let outcome = produce(&mut producer, &mut comp, id, &mut renderer);
        assert!(outcome.is_committed(), "backend requests override the skip");
        assert!(!comp.output(id).unwrap().needs_frame());
    }

    #[test]
    fn disabled_outputs_and_missing_buffers_skip() {
        let (mut comp, id) = scene();
        let mut producer = FrameProducer::new();
        let mut renderer = Counting {
            refuse_buffer: true,
            ..Counting::default()
        };
        assert_eq!(
            produce(&mut producer, &mut comp, id, &mut renderer),
            FrameOutcome::Skipped(SkipReason::NoBuffer)
        );
        comp.output_mut(id).unwrap().set_enabled(false);
        assert_eq!(
            produce(&mut producer, &mut comp, id, &mut renderer),
            FrameOutcome::Skipped(SkipReason::Disabled)
        );
        assert_eq!(producer.frames(id), 2);
    }

    #[test]
    fn old_buffers_redraw_previous_damage() {
        let (mut comp, id) = scene();
        let mut producer = FrameProducer::new();
        let mut renderer = Counting::default();
        produce(&mut producer, &mut comp, id, &mut renderer);

        let w = comp.create_widget();
        comp.set_widget_primitive(w, tessera_core::content::Primitive::default())
            .unwrap();
        comp.set_box(w, ContentBox::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        renderer.age = 1;
        produce(&mut producer, &mut comp, id, &mut renderer);
        assert_eq!(renderer.draws, 1);

        // A buffer two frames old predates the widget.
        comp.output_mut(id).unwrap().set_needs_frame();
        renderer.age = 2;
        produce(&mut producer, &mut comp, id, &mut renderer);
        assert_eq!(renderer.draws, 2);
    }

    #[test]
    fn failed_commits_keep_their_damage() {
        let (mut comp, id) = scene();
        let mut producer = FrameProducer::new();
        let mut renderer = Counting {
            refuse_commit: true,
            ..Counting::default()
        };
        let outcome = produce(&mut producer, &mut comp, id, &mut renderer);
        assert!(matches!(
            outcome,
            FrameOutcome::Committed {
                ok: false,
                update_ran: false,
                ..
            }
        ));
        let output = comp.output(id).unwrap();
        assert!(!output.damage().current().is_empty());
        assert_eq!(output.frame_state(), FrameState::Requested);
    }

    #[test]
    fn failed_draws_are_redrawn_next_frame() {
        let (mut comp, id) = scene();
        let mut producer = FrameProducer::new();
        let mut renderer = Counting::default();
        produce(&mut producer, &mut comp, id, &mut renderer);

        let w = comp.create_widget();
        comp.set_widget_primitive(w, tessera_core::content::Primitive::default())
            .unwrap();
        comp.set_box(w, ContentBox::new(0.0, 0.0, 50.0, 50.0)).unwrap();
        renderer.fail_draws = 1;
        let outcome = produce(&mut producer, &mut comp, id, &mut renderer);
        assert!(outcome.is_committed(), "the rest of the frame still commits");
        assert!(outcome.is_partial(), "{outcome:?}");
        assert_eq!(renderer.draws, 0);
        let output = comp.output(id).unwrap();
        assert!(
            output.damage().current().covers(&IRect::new(0, 0, 50, 50)),
            "failed area stays damaged"
        );
        assert_eq!(output.frame_state(), FrameState::Requested);

        let outcome = produce(&mut producer, &mut comp, id, &mut renderer);
        assert!(outcome.is_committed() && !outcome.is_partial(), "{outcome:?}");
        assert_eq!(renderer.draws, 1, "the widget is drawn on the retry");
        assert!(comp.output(id).unwrap().damage().current().is_empty());
    }

    #[test]
    fn damage_is_committed_in_buffer_coordinates() {
        let config = CompositorConfig::from_toml_str(
            r#"
            [[outputs]]
            name = "DP-1"
            transform = "90"
            "#,
        )
        .unwrap();
        let mut comp = Compositor::new(config);
        let id = comp.add_output(
            OutputDescriptor::new("DP-1").with_mode(Mode::new(800, 600, 60000).preferred()),
        );
        assert_eq!(comp.output(id).unwrap().transform(), Transform::Rotated90);
        let mut producer = FrameProducer::new();
        let mut renderer = Counting::default();
        produce(&mut producer, &mut comp, id, &mut renderer);

        let w = comp.create_widget();
        comp.set_box(w, ContentBox::new(0.0, 0.0, 10.0, 20.0)).unwrap();
        produce(&mut producer, &mut comp, id, &mut renderer);
        // 600 x 800 output space, rotated back into the 800 x 600 buffer.
        assert_eq!(renderer.commits[1].extents(), Some(IRect::new(0, 590, 20, 10)));
    }
}
