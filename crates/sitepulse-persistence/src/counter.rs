//! Monthly report serial counter.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use sitepulse_models::ReportId;

use crate::error::Result;
use crate::fsutil::{load_json, replace_json};

const MONTH_ABBREVS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

#[derive(Debug, Default, Serialize, Deserialize)]
struct CounterFile {
    /// "YYYY-MM" -> last serial issued that month.
    counts: HashMap<String, u32>,
}

/// Issues sequential report serials, reset monthly.
///
/// Serials look like `SP-AUG-26-003`: prefix, month abbreviation, two-digit
/// year, then a zero-padded sequence number. The counter file is rewritten
/// atomically under a lock, so two compilations cannot draw the same serial.
pub struct ReportCounterStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ReportCounterStore {
    /// Creates a counter store under `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            path: base_path.into().join("report_counters.json"),
            lock: Mutex::new(()),
        }
    }

    /// Draws the next serial for the month containing `now`.
    pub async fn next_report_id(&self, now: DateTime<Utc>) -> Result<ReportId> {
        let _guard = self.lock.lock().await;

        let month_key = format!("{:04}-{:02}", now.year(), now.month());
        let mut file: CounterFile = load_json(&self.path)?.unwrap_or_default();
        let count = file.counts.entry(month_key).or_insert(0);
        *count += 1;
        let serial = format!(
            "SP-{}-{:02}-{:03}",
            MONTH_ABBREVS[now.month0() as usize],
            now.year() % 100,
            *count
        );
        replace_json(&self.path, &file)?;

        Ok(ReportId::from_string(serial))
    }
}
