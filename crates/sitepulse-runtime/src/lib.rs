//! Periodic tasks for Sitepulse.
//!
//! Two independent loops run under the [`Runtime`]:
//!
//! - the [`WeatherPoller`], which fetches one weather sample per cycle and
//!   drives the per-site alert state machines;
//! - the [`DailyScheduler`], which fires the fixed local-time jobs (safety
//!   tip, activity reminder, report compilation).
//!
//! Both loops stop on the runtime's shutdown broadcast. Neither loop ever
//! dies on a collaborator failure; a bad cycle is logged and the next cycle
//! tries again.

pub mod alert;
pub mod config;
pub mod daily;
pub mod error;
pub mod runtime;
#[cfg(test)]
pub(crate) mod testutil;
pub mod weather_poller;

pub use alert::{AlertMonitor, AlertPhase, Transition};
pub use config::{QuietHours, RuntimeConfig, SiteConfig};
pub use daily::DailyScheduler;
pub use error::{Result, RuntimeError};
pub use runtime::Runtime;
pub use weather_poller::WeatherPoller;
