// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame production against a full compositor.

use tessera_core::Compositor;
use tessera_core::config::CompositorConfig;
use tessera_core::content::{ContentBox, ContentId, Effect, Primitive, SurfaceId, View};
use tessera_core::damage::{IRect, Region};
use tessera_core::error::RenderError;
use tessera_core::output::{FrameState, Mode, Output, OutputDescriptor, OutputId};
use tessera_core::testing::{ClientCall, ControlCall, RecordingClients, RecordingControl};
use tessera_core::time::HostTime;
use tessera_core::trace::{SkipReason, Tracer};
use tessera_render::{
    ComposeChain, EffectPass, FrameOutcome, FrameProducer, RenderItem, RenderPlan, Renderer,
    Target,
};

#[derive(Clone, Debug, PartialEq)]
enum Op {
    Clear(Target),
    Draw(Target, ContentId),
    Effect(Target, Target, ContentId),
    Rollback,
    Commit(OutputId, Region),
}

#[derive(Default)]
struct Recorder {
    ops: Vec<Op>,
    fail_effects: usize,
}

impl Recorder {
    fn take(&mut self) -> Vec<Op> {
        core::mem::take(&mut self.ops)
    }
}

impl Renderer for Recorder {
    fn begin_frame(&mut self, _: &Output) -> Result<u32, RenderError> {
        Ok(1)
    }

    fn rollback(&mut self, _: OutputId) {
        self.ops.push(Op::Rollback);
    }

    fn clear(&mut self, target: Target, _: &Region, _: [f32; 4]) {
        self.ops.push(Op::Clear(target));
    }

    fn draw(&mut self, target: Target, item: &RenderItem<'_>) -> Result<(), RenderError> {
        self.ops.push(Op::Draw(target, item.content));
        Ok(())
    }

    fn apply_effect(
        &mut self,
        source: Target,
        dest: Target,
        pass: &EffectPass<'_>,
    ) -> Result<(), RenderError> {
        if self.fail_effects > 0 {
            self.fail_effects -= 1;
            return Err(RenderError::Allocation("scratch band".into()));
        }
        self.ops.push(Op::Effect(source, dest, pass.content));
        Ok(())
    }

    fn commit(&mut self, output: OutputId, damage: &Region) -> Result<(), RenderError> {
        self.ops.push(Op::Commit(output, damage.clone()));
        Ok(())
    }
}

fn frame(
    producer: &mut FrameProducer,
    comp: &mut Compositor,
    output: OutputId,
    renderer: &mut Recorder,
) -> FrameOutcome {
    producer
        .produce(
            comp,
            output,
            renderer,
            HostTime::from_millis(16),
            &mut Tracer::none(),
        )
        .expect("output exists")
}

fn desc(name: &str, width: i32, height: i32, refresh_mhz: i32) -> OutputDescriptor {
    OutputDescriptor::new(name).with_mode(Mode::new(width, height, refresh_mhz).preferred())
}

#[test]
fn moving_a_view_across_outputs() {
    let config = CompositorConfig::from_toml_str(
        r#"
        [[outputs]]
        name = "A"
        scale = 2.0
        "#,
    )
    .unwrap();
    let mut comp = Compositor::new(config);
    let clients = RecordingClients::new();
    comp.set_clients(Box::new(clients.clone()));
    let a = comp.add_output(desc("A", 1920, 1080, 60000));
    let b = comp.add_output(desc("B", 1280, 720, 60000));
    assert_eq!(comp.output(b).unwrap().position(), (960, 0), "side by side");

    let view = comp.create_view(View::new(SurfaceId(7)));
    comp.set_box(view, ContentBox::new(100.0, 100.0, 200.0, 200.0))
        .unwrap();
    assert!(comp.is_on_output(view, a));
    assert!(!comp.is_on_output(view, b));

    let mut producer = FrameProducer::new();
    let mut renderer = Recorder::default();
    frame(&mut producer, &mut comp, a, &mut renderer);
    frame(&mut producer, &mut comp, b, &mut renderer);
    clients.take();
    renderer.take();

    comp.set_box(view, ContentBox::new(1850.0, 100.0, 200.0, 200.0))
        .unwrap();
    assert!(!comp.is_on_output(view, a));
    assert!(comp.is_on_output(view, b));
    let sent = clients.take();
    assert!(sent.contains(&ClientCall::SurfaceEnter(SurfaceId(7), b)), "{sent:?}");
    assert!(sent.contains(&ClientCall::SurfaceLeave(SurfaceId(7), a)), "{sent:?}");

    let old = comp.output(a).unwrap().damage().current().clone();
    assert!(old.covers(&IRect::new(200, 200, 400, 400)), "{old:?}");
    let new = comp.output(b).unwrap().damage().current().clone();
    assert!(new.covers(&IRect::new(890, 100, 200, 200)), "{new:?}");

    // Each output redraws its own part of the move.
    frame(&mut producer, &mut comp, a, &mut renderer);
    frame(&mut producer, &mut comp, b, &mut renderer);
    let ops = renderer.take();
    let draws: Vec<_> = ops
        .iter()
        .filter(|op| matches!(op, Op::Draw(..)))
        .collect();
    assert_eq!(draws, vec![&Op::Draw(Target::Output, view)], "drawn on B only");
}

#[test]
fn idle_frames_commit_nothing() {
    let mut comp = Compositor::new(CompositorConfig::default());
    let control = RecordingControl::new();
    comp.set_control(Box::new(control.clone()));
    let id = comp.add_output(desc("DP-1", 800, 600, 60000));
    let w = comp.create_widget();
    comp.set_widget_primitive(w, Primitive::default()).unwrap();
    comp.set_box(w, ContentBox::new(0.0, 0.0, 50.0, 50.0)).unwrap();

    let mut producer = FrameProducer::new();
    let mut renderer = Recorder::default();
    assert!(frame(&mut producer, &mut comp, id, &mut renderer).is_committed());
    renderer.take();
    control.take();

    let before = comp.output(id).unwrap().damage().current().clone();
    let outcome = frame(&mut producer, &mut comp, id, &mut renderer);
    assert_eq!(outcome, FrameOutcome::Skipped(SkipReason::NoDamage));
    assert_eq!(renderer.take(), vec![Op::Rollback]);
    let output = comp.output(id).unwrap();
    assert_eq!(output.damage().current(), &before);
    assert_eq!(output.frame_state(), FrameState::Idle);
    assert!(control.take().is_empty(), "no per-frame update without a frame");
}

#[test]
fn per_frame_update_follows_the_refresh_master() {
    let mut comp = Compositor::new(CompositorConfig::default());
    let control = RecordingControl::new();
    comp.set_control(Box::new(control.clone()));
    let slow = comp.add_output(desc("A", 800, 600, 60000));
    let fast = comp.add_output(desc("B", 800, 600, 144000));
    control.take();

    let mut producer = FrameProducer::new();
    let mut renderer = Recorder::default();
    let updates = |outcome: FrameOutcome| match outcome {
        FrameOutcome::Committed { update_ran, .. } => update_ran,
        FrameOutcome::Skipped(_) => false,
    };
    assert!(!updates(frame(&mut producer, &mut comp, slow, &mut renderer)));
    assert!(updates(frame(&mut producer, &mut comp, fast, &mut renderer)));
    assert_eq!(control.take(), vec![ControlCall::Update]);
}

#[test]
fn compose_chain_covers_every_content_once() {
    let mut comp = Compositor::new(CompositorConfig::default());
    let id = comp.add_output(desc("DP-1", 800, 600, 60000));
    let full = ContentBox::new(0.0, 0.0, 800.0, 600.0);

    let mut effects = Vec::new();
    for z in [3.0, 1.0, 2.0] {
        let e = comp.create_composite(Effect::Blur {
            radius: 2.0,
            passes: 1,
        });
        comp.set_box(e, full).unwrap();
        comp.set_z_index(e, z).unwrap();
        effects.push((z, e));
    }
    effects.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut widgets = Vec::new();
    for z in [10.0_f64, 2.5, 1.0, 1.5, -4.0] {
        let w = comp.create_widget();
        comp.set_widget_primitive(w, Primitive::default()).unwrap();
        comp.set_box(w, ContentBox::new(z.abs() * 10.0, 0.0, 20.0, 20.0))
            .unwrap();
        comp.set_z_index(w, z).unwrap();
        widgets.push(w);
    }

    comp.update_contents();
    let output = comp.output(id).unwrap();
    let damage = Region::from_rect(IRect::new(0, 0, 800, 600));
    let chain = ComposeChain::build(&comp, output, &damage);
    assert_eq!(chain.len(), effects.len() + 1);
    for pair in chain.bands().windows(2) {
        assert_eq!(pair[0].upper, pair[1].lower, "bands are contiguous");
        assert!(pair[0].lower < pair[0].upper);
    }

    let plan = RenderPlan::build(&comp, output, &chain);
    let mut drawn: Vec<_> = plan.items().map(|item| item.content).collect();
    assert_eq!(drawn.len(), widgets.len(), "each content drawn once");
    drawn.sort_by_key(|id| format!("{id:?}"));
    drawn.dedup();
    assert_eq!(drawn.len(), widgets.len());

    let mut renderer = Recorder::default();
    let stale = plan.execute(&mut renderer);
    assert!(stale.is_empty(), "every call succeeded");
    let ops = renderer.take();
    assert_eq!(ops[0], Op::Clear(Target::Band(0)), "scratch buffers start cleared");
    let applied: Vec<_> = ops
        .iter()
        .filter_map(|op| match op {
            Op::Effect(src, dst, e) => Some((*src, *dst, *e)),
            _ => None,
        })
        .collect();
    assert_eq!(
        applied,
        vec![
            (Target::Band(0), Target::Band(1), effects[0].1),
            (Target::Band(1), Target::Band(2), effects[1].1),
            (Target::Band(2), Target::Output, effects[2].1),
        ]
    );
    // The widget tied with the lowest effect is drawn below it.
    assert!(ops.contains(&Op::Draw(Target::Band(0), widgets[2])));
    assert!(ops.contains(&Op::Draw(Target::Output, widgets[0])));
}

#[test]
fn failed_effects_are_retried_on_the_next_frame() {
    let mut comp = Compositor::new(CompositorConfig::default());
    let id = comp.add_output(desc("DP-1", 800, 600, 60000));
    let mut producer = FrameProducer::new();
    let mut renderer = Recorder::default();
    frame(&mut producer, &mut comp, id, &mut renderer);
    renderer.take();

    let blur = comp.create_composite(Effect::Blur {
        radius: 4.0,
        passes: 1,
    });
    comp.set_box(blur, ContentBox::new(100.0, 100.0, 200.0, 100.0))
        .unwrap();
    renderer.fail_effects = 1;
    let outcome = frame(&mut producer, &mut comp, id, &mut renderer);
    let FrameOutcome::Committed { ok, stale, .. } = &outcome else {
        panic!("frame was skipped: {outcome:?}");
    };
    assert!(ok, "the frame still commits");
    assert!(stale.covers(&IRect::new(100, 100, 200, 100)), "{stale:?}");
    assert!(
        !renderer.take().iter().any(|op| matches!(op, Op::Effect(..))),
        "the effect never ran"
    );

    let outcome = frame(&mut producer, &mut comp, id, &mut renderer);
    assert!(outcome.is_committed() && !outcome.is_partial(), "{outcome:?}");
    assert_eq!(
        renderer
            .take()
            .into_iter()
            .filter(|op| matches!(op, Op::Effect(..)))
            .collect::<Vec<_>>(),
        vec![Op::Effect(Target::Band(0), Target::Output, blur)],
        "the retry applies the effect"
    );
    assert_eq!(
        frame(&mut producer, &mut comp, id, &mut renderer),
        FrameOutcome::Skipped(SkipReason::NoDamage),
        "settled once redrawn"
    );
}
