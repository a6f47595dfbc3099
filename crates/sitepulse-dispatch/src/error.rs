//! Error types for the dispatch crate.

use thiserror::Error;

/// Errors that can occur while dispatching notifications.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The queue is full; the message was dropped at enqueue time.
    #[error("dispatch queue full, message dropped")]
    QueueFull,

    /// The consumer task has stopped.
    #[error("dispatch queue closed")]
    QueueClosed,

    /// The transport failed to deliver.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
