//! The dispatch queue and its delivery loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{DispatchError, Result};
use crate::format::MessageFormatter;
use crate::message::{OutboundMessage, Severity, Transport};

/// Configuration for the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Bounded queue capacity; producers drop on overflow.
    pub queue_capacity: usize,
    /// Total delivery attempts per message.
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles per attempt.
    pub retry_backoff: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            max_attempts: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

struct Envelope {
    target: i64,
    message: OutboundMessage,
    severity: Severity,
}

/// Handle for enqueueing notifications.
///
/// Cheap to clone; every producing component holds one. The consumer task
/// is spawned once by [`Dispatcher::spawn`].
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<Envelope>,
}

impl Dispatcher {
    /// Spawns the delivery task and returns the enqueue handle plus the
    /// task's join handle.
    pub fn spawn(
        transport: Arc<dyn Transport>,
        formatter: Arc<dyn MessageFormatter>,
        config: DispatcherConfig,
        mut shutdown: watch::Receiver<bool>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Envelope>(config.queue_capacity);

        let handle = tokio::spawn(async move {
            debug!("dispatcher started");
            loop {
                tokio::select! {
                    envelope = rx.recv() => {
                        match envelope {
                            Some(envelope) => {
                                deliver(&*transport, &*formatter, &config, envelope).await;
                            }
                            None => break,
                        }
                    }
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            debug!("dispatcher received shutdown signal");
                            break;
                        }
                    }
                }
            }
            debug!("dispatcher stopped");
        });

        (Self { tx }, handle)
    }

    /// Enqueues a message for delivery.
    ///
    /// Never blocks: a full queue drops the message and reports
    /// [`DispatchError::QueueFull`].
    pub fn dispatch(
        &self,
        target: i64,
        message: OutboundMessage,
        severity: Severity,
    ) -> Result<()> {
        self.tx
            .try_send(Envelope {
                target,
                message,
                severity,
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(envelope) => {
                    warn!(chat_id = envelope.target, "dispatch queue full, dropping message");
                    DispatchError::QueueFull
                }
                mpsc::error::TrySendError::Closed(_) => DispatchError::QueueClosed,
            })
    }
}

/// Delivers one envelope with bounded retries, then gives up.
async fn deliver(
    transport: &dyn Transport,
    formatter: &dyn MessageFormatter,
    config: &DispatcherConfig,
    envelope: Envelope,
) {
    let text = formatter.format(&envelope.message);
    let mut backoff = config.retry_backoff;

    for attempt in 1..=config.max_attempts {
        let result = match &envelope.message {
            OutboundMessage::ReportReady { file, .. } => {
                transport.send_file(envelope.target, file, &text).await
            }
            _ => transport.send_text(envelope.target, &text).await,
        };

        match result {
            Ok(()) => {
                info!(
                    chat_id = envelope.target,
                    severity = ?envelope.severity,
                    attempt,
                    "notification delivered"
                );
                return;
            }
            Err(e) => {
                warn!(
                    chat_id = envelope.target,
                    attempt,
                    error = %e,
                    "delivery attempt failed"
                );
                if attempt < config.max_attempts {
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    warn!(
        chat_id = envelope.target,
        attempts = config.max_attempts,
        "giving up on notification"
    );
}
