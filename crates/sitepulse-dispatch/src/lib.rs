//! Alert and notification dispatch for Sitepulse.
//!
//! Producers enqueue semantic [`OutboundMessage`]s; a single consumer task
//! formats them for the configured locale and delivers them through the
//! [`Transport`] with bounded retries. Delivery is best effort and never
//! blocks a producer: the queue is bounded, and a message that still fails
//! after the final attempt is dropped with a logged failure.
//!
//! Duplicate suppression is deliberately NOT here: callers own it (the
//! weather alert state machine, the daily-job latches).

pub mod dispatcher;
pub mod error;
pub mod format;
pub mod message;

pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use error::{DispatchError, Result};
pub use format::{formatter_for, ArabicFormatter, EnglishFormatter, MessageFormatter};
pub use message::{OutboundMessage, Severity, Transport};
