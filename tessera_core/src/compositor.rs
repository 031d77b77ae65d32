// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The top-level compositor context.

use core::fmt;
use std::sync::mpsc;

use crate::client::{ClientSink, NullClients};
use crate::config::CompositorConfig;
use crate::content::ContentStore;
use crate::control::{ControlLayer, Deferred};
use crate::error::BackendError;
use crate::layout::Layout;
use crate::output::{Output, OutputId};
use crate::seat::Seat;

type Request = Box<dyn FnOnce(&mut Compositor) + Send>;

/// All compositor state, owned in one place.
///
/// There is exactly one `Compositor` per process. It is created at startup,
/// passed by reference to every entry point (backend events, frame callbacks,
/// control-layer requests) and dropped at shutdown. It is deliberately not
/// `Send`: everything runs on the main loop, and other threads reach it only
/// through a [`RequestHandle`].
pub struct Compositor {
    pub(crate) config: CompositorConfig,
    pub(crate) contents: ContentStore,
    pub(crate) layout: Layout,
    pub(crate) seat: Seat,
    pub(crate) control: Option<Box<dyn ControlLayer>>,
    pub(crate) deferred: Deferred,
    pub(crate) clients: Box<dyn ClientSink>,
    pub(crate) lock_fraction: f64,
    requests: mpsc::Receiver<Request>,
    request_tx: mpsc::Sender<Request>,
    started: bool,
}

impl fmt::Debug for Compositor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compositor")
            .field("contents", &self.contents.len())
            .field("outputs", &self.layout.outputs().len())
            .field("locked", &self.is_locked())
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

impl Compositor {
    /// Creates a compositor with no outputs, no contents, no control layer
    /// and a client sink that discards everything.
    #[must_use]
    pub fn new(config: CompositorConfig) -> Self {
        let (request_tx, requests) = mpsc::channel();
        let seat = Seat::new(&config);
        Self {
            config,
            contents: ContentStore::new(),
            layout: Layout::new(),
            seat,
            control: None,
            deferred: Deferred::default(),
            clients: Box::new(NullClients),
            lock_fraction: 0.0,
            requests,
            request_tx,
            started: false,
        }
    }

    /// Installs the control layer, replacing any previous one.
    pub fn set_control(&mut self, control: Box<dyn ControlLayer>) {
        self.control = Some(control);
    }

    /// Removes and returns the control layer.
    pub fn take_control(&mut self) -> Option<Box<dyn ControlLayer>> {
        self.control.take()
    }

    /// Returns `true` if a control layer is installed and not currently
    /// running a callback.
    #[must_use]
    pub fn has_control(&self) -> bool {
        self.control.is_some()
    }

    /// Installs the client sink.
    pub fn set_clients(&mut self, clients: Box<dyn ClientSink>) {
        self.clients = clients;
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Every live content.
    #[must_use]
    pub fn contents(&self) -> &ContentStore {
        &self.contents
    }

    /// Brings the cached z-order up to date.
    pub fn update_contents(&mut self) {
        self.contents.update_z_order();
    }

    /// Output arrangement.
    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Looks up an output.
    #[must_use]
    pub fn output(&self, id: OutputId) -> Option<&Output> {
        self.layout.output(id)
    }

    /// Looks up an output mutably, for backend signals and frame production.
    pub fn output_mut(&mut self, id: OutputId) -> Option<&mut Output> {
        self.layout.output_mut(id)
    }

    /// Input seat.
    #[must_use]
    pub fn seat(&self) -> &Seat {
        &self.seat
    }

    // -- Lock screen --

    /// Whether the session is locked.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock_fraction > 0.0
    }

    /// How far the lock screen has faded in, in `[0, 1]`.
    #[must_use]
    pub fn lock_fraction(&self) -> f64 {
        self.lock_fraction
    }

    /// Sets the lock fade; any value above zero locks the session.
    pub fn set_locked(&mut self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction == self.lock_fraction {
            return;
        }
        tracing::debug!(fraction, "lock state changed");
        self.lock_fraction = fraction;
        self.damage_whole();
    }

    // -- Lifecycle --

    /// Reports the backend start result and fires `ready` on success.
    ///
    /// # Errors
    ///
    /// Passes a backend start failure through after logging it; the caller
    /// should abort startup.
    pub fn start(&mut self, backend: Result<(), BackendError>) -> Result<(), BackendError> {
        if let Err(err) = backend {
            tracing::error!(%err, "failed to start backend");
            return Err(err);
        }
        if self.started {
            return Ok(());
        }
        self.started = true;
        tracing::info!("backend started");
        self.call_control("ready", (), |layer, comp| layer.ready(comp));
        Ok(())
    }

    /// Whether [`start`](Self::start) succeeded.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Applies a new configuration to outputs, keyboards and the cursor.
    pub fn reconfigure(&mut self, config: CompositorConfig) {
        tracing::info!("reconfiguring");
        self.config = config;
        for output in self.layout.outputs_mut() {
            let section = self.config.find_output(output.name());
            output.configure(section);
        }
        self.seat.reconfigure(&self.config);
        self.recompute_layout();
    }

    // -- Cross-thread requests --

    /// Returns a handle other threads can use to queue work for the main
    /// loop.
    #[must_use]
    pub fn request_handle(&self) -> RequestHandle {
        RequestHandle {
            tx: self.request_tx.clone(),
        }
    }

    /// Applies every queued request in submission order.
    ///
    /// Returns the number of requests applied.
    pub fn drain_requests(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(request) = self.requests.try_recv() {
            request(self);
            applied += 1;
        }
        applied
    }

    // -- Diagnostics --

    /// Writes the layout and every content, one per line.
    ///
    /// # Errors
    ///
    /// Propagates write failures from `out`.
    pub fn dump(&self, out: &mut impl fmt::Write) -> fmt::Result {
        writeln!(out, "layout")?;
        for output in self.layout.outputs() {
            let (w, h) = output.transformed_resolution();
            let (x, y) = output.position();
            writeln!(
                out,
                "  output {} key={} ({w} x {h}) at {x}, {y} scale={}",
                output.name(),
                output.key(),
                output.scale()
            )?;
        }
        writeln!(out, "contents")?;
        for (id, content) in self.contents.iter() {
            let b = content.display_box();
            writeln!(
                out,
                "  {} {id} ({}, {} - {}, {}) z={}",
                content.kind().name(),
                b.x,
                b.y,
                b.width,
                b.height,
                content.z_index()
            )?;
        }
        Ok(())
    }
}

/// A `Send` handle for queueing work onto the main loop.
///
/// Requests run, in order, the next time the main loop calls
/// [`Compositor::drain_requests`].
#[derive(Clone)]
pub struct RequestHandle {
    tx: mpsc::Sender<Request>,
}

impl fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle").finish_non_exhaustive()
    }
}

impl RequestHandle {
    /// Queues a request.
    ///
    /// Returns `false` if the compositor is gone.
    pub fn submit(&self, request: impl FnOnce(&mut Compositor) + Send + 'static) -> bool {
        self.tx.send(Box::new(request)).is_ok()
    }
}
