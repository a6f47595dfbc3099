//! Runtime manager owning the periodic tasks.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::daily::DailyScheduler;
use crate::error::{Result, RuntimeError};
use crate::weather_poller::WeatherPoller;

/// Owns the periodic tasks and the shutdown broadcast.
///
/// Components are registered at startup and every pending timer is
/// cancelled on shutdown; nothing schedules itself through ambient
/// globals. Build the poller and scheduler with a receiver from
/// [`Runtime::shutdown_signal`], then hand them to [`Runtime::start`].
pub struct Runtime {
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver (for cloning to tasks).
    shutdown_rx: watch::Receiver<bool>,
    /// Handles of the spawned task loops.
    handles: Vec<JoinHandle<()>>,
    /// Whether the runtime has been started.
    started: bool,
}

impl Runtime {
    /// Creates a stopped runtime.
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            shutdown_tx,
            shutdown_rx,
            handles: Vec::new(),
            started: false,
        }
    }

    /// Returns a receiver for the shutdown broadcast.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Spawns the weather poller and daily scheduler loops.
    pub fn start(&mut self, mut poller: WeatherPoller, mut scheduler: DailyScheduler) -> Result<()> {
        if self.started {
            return Err(RuntimeError::AlreadyStarted);
        }

        info!("starting runtime");

        self.handles.push(tokio::spawn(async move {
            poller.run().await;
        }));
        self.handles.push(tokio::spawn(async move {
            scheduler.run().await;
        }));
        self.started = true;

        debug!("runtime started");
        Ok(())
    }

    /// Stops the runtime gracefully: broadcasts shutdown and joins every
    /// task loop.
    pub async fn shutdown(&mut self) -> Result<()> {
        if !self.started {
            return Err(RuntimeError::NotStarted);
        }

        info!("shutting down runtime");

        self.shutdown_tx.send(true).map_err(|e| {
            RuntimeError::Shutdown(format!("failed to send shutdown signal: {e}"))
        })?;

        for handle in self.handles.drain(..) {
            handle
                .await
                .map_err(|e| RuntimeError::Shutdown(format!("task panicked: {e}")))?;
        }

        self.started = false;
        info!("runtime stopped");
        Ok(())
    }

    /// Check if the runtime has been started.
    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        // Send shutdown signal if still running
        if self.started {
            let _ = self.shutdown_tx.send(true);
        }
    }
}
