// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted headless session.
//!
//! Brings up two virtual outputs, maps a client view, blurs a panel behind a
//! widget, moves the pointer across the layout and types a key, driving the
//! frame loop for both outputs on a simulated vsync. Every renderer call is
//! logged; the frame loop is recorded and exported as a Chrome trace.
//!
//! ```text
//! RUST_LOG=tessera_core=debug cargo run -p headless_demo -- [config.toml]
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::thread;

use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

use tessera_core::Compositor;
use tessera_core::client::ClientSink;
use tessera_core::config::CompositorConfig;
use tessera_core::content::{
    ContentBox, ContentId, ContentKind, Effect, Primitive, SurfaceId, View, Widget,
    WidgetContent,
};
use tessera_core::control::ControlLayer;
use tessera_core::damage::Region;
use tessera_core::error::{ControlError, RenderError};
use tessera_core::input::{ButtonEvent, ButtonState, KeyEvent, KeyState};
use tessera_core::output::{Mode, Output, OutputDescriptor, OutputId};
use tessera_core::seat::DeviceId;
use tessera_core::time::{Clock, HostTime};
use tessera_core::trace::Tracer;
use tessera_debug::recorder::RecorderSink;
use tessera_render::{EffectPass, FrameOutcome, FrameProducer, RenderItem, Renderer, Target};

const TICKS: u32 = 12;
const TICK_MS: u64 = 16;
const BTN_LEFT: u32 = 0x110;
const KEY_Q: u32 = 16;

/// Primitive names the logging renderer pretends to draw.
const KNOWN_PRIMITIVES: [&str; 2] = ["", "rounded_rect"];

fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            CompositorConfig::from_toml_str(&source)
                .with_context(|| format!("parsing config {path}"))?
        }
        None => CompositorConfig::default(),
    };

    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut comp = Compositor::new(config);
    comp.set_control(Box::new(Shell::default()));
    comp.set_clients(Box::new(LoggingClients));
    comp.start(Ok(())).context("starting backend")?;

    let left = comp.add_output(
        OutputDescriptor::new("HEADLESS-1")
            .with_mode(Mode::new(1920, 1080, 60_000).preferred())
            .with_physical_width_mm(300),
    );
    let right = comp.add_output(
        OutputDescriptor::new("HEADLESS-2").with_mode(Mode::new(1280, 1024, 75_000).preferred()),
    );
    comp.add_keyboard(DeviceId(1), "virtual keyboard");
    comp.add_pointer(DeviceId(2), "virtual pointer");

    // Scene: a blurred panel at the top of the left output, with a label
    // widget above the blur.
    let blur = comp.create_composite(Effect::Blur {
        radius: 8.0,
        passes: 2,
    });
    comp.set_box(blur, ContentBox::new(0.0, 0.0, 600.0, 40.0))?;
    comp.set_z_index(blur, 5.0)?;
    let label = comp.create_widget();
    comp.set_widget_primitive(label, Primitive::default())?;
    comp.set_box(label, ContentBox::new(10.0, 8.0, 200.0, 24.0))?;
    comp.set_z_index(label, 6.0)?;
    let view = comp.create_view(View::new(SurfaceId(1)).with_surface_size(640, 480));

    // Another thread asks for a lock screen; it lands on the next tick.
    let requests = comp.request_handle();
    thread::spawn(move || {
        requests.submit(|comp| comp.set_locked(0.5));
    })
    .join()
    .map_err(|_| anyhow::anyhow!("request thread panicked"))?;

    let clock = Clock::new();
    let mut renderer = LoggingRenderer::default();
    let mut producer = FrameProducer::new();
    let mut recorder = RecorderSink::new();
    for tick in 0..TICKS {
        let now = clock.now();
        comp.drain_requests();
        script(&mut comp, tick, view, label, now)?;

        for output in [left, right] {
            let outcome = producer.produce(
                &mut comp,
                output,
                &mut renderer,
                now,
                &mut Tracer::new(&mut recorder),
            )?;
            if let FrameOutcome::Committed { damage, stale, .. } = &outcome {
                tracing::info!(
                    tick,
                    ?output,
                    rects = damage.rects().len(),
                    partial = !stale.is_empty(),
                    "frame"
                );
                if let Some(o) = comp.output_mut(output) {
                    o.frame_presented();
                }
            }
        }
        thread::sleep(std::time::Duration::from_millis(TICK_MS));
    }

    for output in [left, right] {
        let counts = recorder.counts(output);
        tracing::info!(
            ?output,
            committed = counts.committed,
            skipped = counts.skipped,
            "session done"
        );
    }
    if comp.config().debug {
        let mut dump = String::new();
        comp.dump(&mut dump)?;
        tracing::debug!("\n{dump}");
    }

    let path = std::env::temp_dir().join("tessera_trace.json");
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    tessera_debug::chrome::export(recorder.events(), &mut BufWriter::new(file))?;
    tracing::info!(path = %path.display(), "chrome trace written");
    Ok(())
}

/// Input for one tick of the session.
fn script(
    comp: &mut Compositor,
    tick: u32,
    view: ContentId,
    label: ContentId,
    now: HostTime,
) -> anyhow::Result<()> {
    let time_msec = now.millis_u32();
    match tick {
        2 => {
            comp.notify_motion(400.0, 300.0, time_msec);
            comp.notify_pointer_frame();
        }
        3 => {
            for state in [ButtonState::Pressed, ButtonState::Released] {
                comp.notify_button(&ButtonEvent {
                    time_msec,
                    button: BTN_LEFT,
                    state,
                });
            }
            comp.notify_pointer_frame();
        }
        // The renderer cannot draw this one; the label stays damaged and is
        // retried every frame until it gets a shape the renderer knows.
        4 => comp.set_widget_primitive(label, primitive("sparkle"))?,
        6 => comp.set_widget_primitive(label, primitive("rounded_rect"))?,
        5 => {
            // Across the seam onto the second output.
            comp.set_box(view, ContentBox::new(1800.0, 100.0, 640.0, 480.0))?;
            comp.notify_motion(1600.0, 0.0, time_msec);
            comp.notify_pointer_frame();
        }
        7 => {
            for state in [KeyState::Pressed, KeyState::Released] {
                comp.notify_key(&KeyEvent {
                    time_msec,
                    keycode: KEY_Q,
                    state,
                    keysyms: vec!["q".into()],
                });
            }
        }
        9 => comp.set_locked(0.0),
        _ => {}
    }
    Ok(())
}

fn primitive(name: &str) -> Primitive {
    Primitive {
        name: name.to_owned(),
        ints: Vec::new(),
        floats: vec![6.0],
    }
}

// ---------------------------------------------------------------------------
// Control layer
// ---------------------------------------------------------------------------

/// Places new views, focuses them and keeps a clock widget ticking.
#[derive(Debug, Default)]
struct Shell {
    updates: u32,
    clock_widget: Option<ContentId>,
}

impl ControlLayer for Shell {
    fn view_created(&mut self, comp: &mut Compositor, view: ContentId) -> Result<(), ControlError> {
        tracing::info!(%view, handle = view.to_handle(), "placing view");
        comp.set_box(view, ContentBox::new(200.0, 150.0, 640.0, 480.0))
            .and_then(|()| comp.focus_view(view))
            .map_err(|err| ControlError::Raised(err.to_string()))
    }

    fn key(&mut self, _: &mut Compositor, event: &KeyEvent) -> Result<bool, ControlError> {
        tracing::info!(keysyms = %event.keysym_names(), "key seen by shell");
        Ok(false)
    }

    fn update(&mut self, comp: &mut Compositor) -> Result<(), ControlError> {
        self.updates += 1;
        let widget = match self.clock_widget {
            Some(id) => id,
            None => {
                let id = comp.create_widget();
                self.clock_widget = Some(id);
                id
            }
        };
        // A seconds hand that grows every update.
        let width = 4.0 * f64::from(self.updates);
        comp.set_widget_primitive(widget, Primitive::default())
            .and_then(|()| comp.set_box(widget, ContentBox::new(1700.0, 8.0, width, 24.0)))
            .map_err(|err| ControlError::Raised(err.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

/// Logs everything sent to clients.
#[derive(Debug)]
struct LoggingClients;

impl ClientSink for LoggingClients {
    fn surface_enter(&mut self, surface: SurfaceId, output: OutputId) {
        tracing::info!(?surface, ?output, "surface enter");
    }

    fn surface_leave(&mut self, surface: SurfaceId, output: OutputId) {
        tracing::info!(?surface, ?output, "surface leave");
    }

    fn pointer_enter(&mut self, surface: SurfaceId, sx: f64, sy: f64) {
        tracing::info!(?surface, sx, sy, "pointer enter");
    }

    fn keyboard_enter(&mut self, surface: SurfaceId) {
        tracing::info!(?surface, "keyboard enter");
    }

    fn key(&mut self, surface: SurfaceId, event: &KeyEvent) {
        tracing::info!(?surface, keycode = event.keycode, "key to client");
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// A renderer that draws nothing and logs every call.
#[derive(Debug, Default)]
struct LoggingRenderer {
    frames: HashMap<OutputId, u32>,
}

impl Renderer for LoggingRenderer {
    fn begin_frame(&mut self, output: &Output) -> Result<u32, RenderError> {
        // Double-buffered: once both buffers were presented, each is two
        // frames old.
        let frames = self.frames.entry(output.id()).or_default();
        Ok((*frames).min(2))
    }

    fn rollback(&mut self, output: OutputId) {
        tracing::trace!(?output, "rollback");
    }

    fn clear(&mut self, target: Target, damage: &Region, _: [f32; 4]) {
        tracing::debug!(?target, rects = damage.rects().len(), "clear");
    }

    fn draw(&mut self, target: Target, item: &RenderItem<'_>) -> Result<(), RenderError> {
        if let ContentKind::Widget(Widget {
            content: WidgetContent::Primitive(p),
            ..
        }) = item.kind
            && !KNOWN_PRIMITIVES.contains(&p.name.as_str())
        {
            return Err(RenderError::UnsupportedPrimitive(p.name.clone()));
        }
        tracing::debug!(
            ?target,
            content = ?item.content,
            kind = item.kind.name(),
            rect = ?item.rect,
            opacity = item.opacity,
            "draw"
        );
        Ok(())
    }

    fn apply_effect(
        &mut self,
        source: Target,
        dest: Target,
        pass: &EffectPass<'_>,
    ) -> Result<(), RenderError> {
        tracing::debug!(?source, ?dest, effect = ?pass.effect, "effect");
        Ok(())
    }

    fn commit(&mut self, output: OutputId, damage: &Region) -> Result<(), RenderError> {
        *self.frames.entry(output).or_default() += 1;
        tracing::debug!(?output, extents = ?damage.extents(), "commit");
        Ok(())
    }
}
