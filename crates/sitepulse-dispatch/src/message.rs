//! Outbound message shapes and the delivery seam.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;

/// How urgent a notification is. Recorded in delivery logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Routine information (reports, tips).
    Info,
    /// Conditions that need attention (weather alerts, reminders).
    Warning,
}

/// A semantic outbound message.
///
/// Producers enqueue these; the locale formatter turns them into text at
/// dispatch time, so no producer carries presentation strings.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    /// Wind crossed the crane-stop threshold.
    WindAlert {
        /// Observed wind speed in km/h.
        wind_speed_kmh: f64,
    },
    /// Rain probability crossed the threshold.
    RainAlert {
        /// Observed probability, 0–100.
        rain_probability_pct: f64,
    },
    /// AI-generated safety tip, dispatched verbatim.
    SafetyTip {
        /// The tip text.
        tip: String,
    },
    /// Morning nudge when no activity has been logged yet.
    ActivityReminder,
    /// A compiled report file is ready to deliver.
    ReportReady {
        /// Human-facing report serial.
        report_id: String,
        /// Day the report covers.
        report_date: NaiveDate,
        /// Rendered report document.
        file: PathBuf,
    },
    /// Pre-formatted text that bypasses the locale formatter.
    Plain {
        /// The text to deliver.
        text: String,
    },
}

/// The messaging seam.
///
/// The Telegram layer implements this; tests use in-memory recorders.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a text message to a chat.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Sends a file with a caption to a chat.
    async fn send_file(&self, chat_id: i64, path: &Path, caption: &str) -> Result<()>;
}
