//! Shared state for the Telegram handlers.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;

use sitepulse_dispatch::Dispatcher;
use sitepulse_persistence::{LogStore, SettingsStore};
use sitepulse_report::ReportCompiler;

use crate::config::AppConfig;

/// State shared across all handlers.
pub struct AppState {
    /// Validated process configuration.
    pub config: AppConfig,
    /// The append-only log store.
    pub store: Arc<LogStore>,
    /// Per-site settings (alert destinations).
    pub settings: Arc<SettingsStore>,
    /// Report compiler, for `/report`.
    pub compiler: Arc<ReportCompiler>,
    /// Outbound notification queue.
    pub dispatcher: Dispatcher,
}

impl AppState {
    /// Directory where the given local day's photos are stored.
    pub fn photo_dir(&self, date: NaiveDate) -> PathBuf {
        self.config
            .data_dir
            .join("logs")
            .join(date.to_string())
            .join("photos")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_dir_layout() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let dir = PathBuf::from("/data")
            .join("logs")
            .join(date.to_string())
            .join("photos");
        assert_eq!(dir, PathBuf::from("/data/logs/2026-08-07/photos"));
    }
}
