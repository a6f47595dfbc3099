//! Per-site runtime settings.
//!
//! The only setting today is the alert destination: which chat receives
//! alerts, tips, reminders, and reports for a site. Stored as one JSON file
//! so the mapping survives restarts.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use sitepulse_models::SiteId;

use crate::error::Result;
use crate::fsutil::{load_json, replace_json};

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    /// site_id -> chat id receiving notifications for that site.
    destinations: HashMap<String, i64>,
}

/// Store for per-site settings.
pub struct SettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SettingsStore {
    /// Creates a store under `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            path: base_path.into().join("settings.json"),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the configured destination chat for a site, if any.
    pub fn alert_destination(&self, site_id: &SiteId) -> Result<Option<i64>> {
        let file: SettingsFile = load_json(&self.path)?.unwrap_or_default();
        Ok(file.destinations.get(site_id.as_str()).copied())
    }

    /// Sets (or replaces) the destination chat for a site.
    pub async fn set_alert_destination(&self, site_id: &SiteId, chat_id: i64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut file: SettingsFile = load_json(&self.path)?.unwrap_or_default();
        file.destinations.insert(site_id.as_str().to_string(), chat_id);
        replace_json(&self.path, &file)
    }
}
