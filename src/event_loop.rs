//! The main loop.
//!
//! [`EventLoop`] owns the window-system connection, the registry of tracked
//! windows and the grabs installed on them.  It polls instead of blocking so
//! that a termination request is noticed between events:
//!
//! ```text
//! Running --(registry empty | termination requested)--> Draining
//! Draining --(grabs released, registry cleared)--> Terminated
//! ```

use crate::command::{ButtonBindings, Event};
use crate::grab::GrabManager;
use crate::registry::Registry;
use crate::switcher;
use crate::traits::WindowSystem;
use log::{debug, info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default pause between two polls when nothing is queued.
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_micros(100);

/// Loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Draining,
    Terminated,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// Termination was requested from outside.
    Requested,
    /// Every tracked window was destroyed.
    NoWindowsLeft,
}

/// Fatal loop errors.
#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    /// Events can no longer be read.
    #[error("lost connection to the window system: {0}")]
    Connection(String),
}

pub struct EventLoop<W: WindowSystem> {
    ws: W,
    registry: Registry,
    grabs: GrabManager,
    bindings: ButtonBindings,
    terminate: Arc<AtomicBool>,
    idle: Duration,
    sync: bool,
    state: LoopState,
    shutdown: Option<Shutdown>,
}

impl<W: WindowSystem> EventLoop<W> {
    /// Create a loop over already located windows.  Call
    /// [`install_grabs`](Self::install_grabs) before [`run`](Self::run).
    pub fn new(
        ws: W,
        registry: Registry,
        grabs: GrabManager,
        bindings: ButtonBindings,
        terminate: Arc<AtomicBool>,
    ) -> Self {
        Self {
            ws,
            registry,
            grabs,
            bindings,
            terminate,
            idle: DEFAULT_IDLE_INTERVAL,
            sync: true,
            state: LoopState::Running,
            shutdown: None,
        }
    }

    pub fn with_idle_interval(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }

    /// Wait for the server to process every request batch instead of only
    /// flushing it.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Watch and grab every tracked window.
    pub fn install_grabs(&mut self) {
        for tracked in self.registry.iter() {
            self.grabs.setup(&self.ws, tracked, &self.bindings);
        }
        if let Err(e) = self.ws.flush(false) {
            warn!("flush after grabbing failed: {}", e);
        }
        info!(
            "tracking {} window(s), {} button grab(s)",
            self.registry.len(),
            self.grabs.installed().len()
        );
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn grabs(&self) -> &GrabManager {
        &self.grabs
    }

    pub fn window_system(&self) -> &W {
        &self.ws
    }

    /// Give the connection back.  Dropping it closes it.
    pub fn into_inner(self) -> W {
        self.ws
    }

    /// Run until the loop terminates.
    ///
    /// On a connection failure the grabs are still released on a best-effort
    /// basis before the error is returned.
    pub fn run(&mut self) -> Result<Shutdown, LoopError> {
        loop {
            match self.state {
                LoopState::Running => {
                    if let Err(e) = self.step() {
                        self.shutdown.get_or_insert(Shutdown::Requested);
                        self.drain();
                        return Err(e);
                    }
                }
                LoopState::Draining => self.drain(),
                LoopState::Terminated => {
                    return Ok(self.shutdown.unwrap_or(Shutdown::Requested));
                }
            }
        }
    }

    /// One iteration while running: handle exactly one queued event, or
    /// check for termination, or sleep.
    pub fn step(&mut self) -> Result<LoopState, LoopError> {
        if self.state != LoopState::Running {
            return Ok(self.state);
        }
        let event = self
            .ws
            .poll_event()
            .map_err(|e| LoopError::Connection(e.to_string()))?;
        match event {
            Some(event) => self.dispatch(event),
            None if self.terminate.load(Ordering::SeqCst) => {
                info!("termination requested");
                self.begin_draining(Shutdown::Requested);
            }
            None => std::thread::sleep(self.idle),
        }
        Ok(self.state)
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::Destroyed(window) => {
                if !self.registry.contains(window) {
                    trace!("ignoring destruction of untracked 0x{:x}", window);
                    return;
                }
                info!("tracked window 0x{:x} was destroyed", window);
                self.grabs.forget(window);
                if self.registry.remove_if_present(window) {
                    info!("no tracked windows left");
                    self.begin_draining(Shutdown::NoWindowsLeft);
                }
            }
            Event::ButtonPress { window, button, time } => {
                let Some(action) = self.bindings.action_for(button) else {
                    trace!("button {} is not bound", button);
                    return;
                };
                debug!("button {} on 0x{:x}: {}", button, window, action);
                let messages = match switcher::handle(&self.ws, action, time) {
                    Ok(messages) => messages,
                    Err(e) => {
                        warn!("{} failed: {}", action, e);
                        return;
                    }
                };
                if messages.is_empty() {
                    return;
                }
                for message in &messages {
                    if let Err(e) = self.ws.send(message) {
                        warn!("cannot send {:?}: {}", message, e);
                    }
                }
                if let Err(e) = self.ws.flush(self.sync) {
                    warn!("flush failed: {}", e);
                }
            }
            Event::Other => {}
        }
    }

    fn begin_draining(&mut self, reason: Shutdown) {
        if self.state == LoopState::Running {
            self.shutdown = Some(reason);
            self.state = LoopState::Draining;
        }
    }

    /// Release every grab still installed and forget the tracked windows.
    fn drain(&mut self) {
        if self.state == LoopState::Terminated {
            return;
        }
        debug!("releasing {} grab(s)", self.grabs.installed().len());
        self.grabs.release_all(&self.ws);
        self.registry.clear();
        if let Err(e) = self.ws.flush(true) {
            debug!("final flush failed: {}", e);
        }
        self.state = LoopState::Terminated;
    }
}
