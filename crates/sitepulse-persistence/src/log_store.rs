//! Append-only store for site log entries.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::warn;

use sitepulse_models::{LogEntry, SiteId};

use crate::error::{PersistenceError, Result};
use crate::fsutil::{append_json_line, read_json_lines};

/// The append-only record of site submissions.
///
/// Entries are stored as JSON Lines, one file per site per UTC day:
/// ```text
/// base_path/
/// └── logs/
///     └── {site_id}/
///         ├── 2026-08-06.jsonl
///         └── 2026-08-07.jsonl
/// ```
///
/// There is no mutation or deletion API. Writers serialize through a
/// per-site lock; reads go straight to disk, which is what makes
/// [`LogStore::fetch_since`] restartable.
pub struct LogStore {
    base_path: PathBuf,
    append_locks: StdMutex<HashMap<SiteId, Arc<Mutex<()>>>>,
}

impl LogStore {
    /// Creates a store rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            append_locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Returns the directory holding a site's day files.
    fn site_dir(&self, site_id: &SiteId) -> PathBuf {
        self.base_path.join("logs").join(site_id.as_str())
    }

    /// Returns the day file an entry with the given timestamp lands in.
    fn day_file(&self, site_id: &SiteId, timestamp: DateTime<Utc>) -> PathBuf {
        self.site_dir(site_id)
            .join(format!("{}.jsonl", timestamp.date_naive()))
    }

    fn append_lock(&self, site_id: &SiteId) -> Arc<Mutex<()>> {
        let mut locks = self
            .append_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(site_id.clone()).or_default())
    }

    /// Appends an entry.
    ///
    /// Fails with [`PersistenceError::Validation`] when a required field is
    /// empty; nothing is written in that case.
    pub async fn record(&self, entry: &LogEntry) -> Result<()> {
        if let Err(field) = entry.check_required_fields() {
            return Err(PersistenceError::Validation { field });
        }

        let lock = self.append_lock(&entry.site_id);
        let _guard = lock.lock().await;
        append_json_line(&self.day_file(&entry.site_id, entry.timestamp), entry)
    }

    /// Returns all entries for `site_id` with `timestamp >= since`, ordered
    /// by timestamp ascending.
    ///
    /// Every call re-reads from disk, so a consumer can restart the scan at
    /// any point.
    pub fn fetch_since(&self, site_id: &SiteId, since: DateTime<Utc>) -> Result<Vec<LogEntry>> {
        let dir = self.site_dir(site_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries: Vec<LogEntry> = Vec::new();
        let listing = fs::read_dir(&dir).map_err(|source| PersistenceError::ReadError {
            path: dir.clone(),
            source,
        })?;

        for item in listing {
            let item = item.map_err(|source| PersistenceError::ReadError {
                path: dir.clone(),
                source,
            })?;
            let path = item.path();

            // Day files older than `since`'s UTC date cannot contain matches.
            let Some(day) = day_of(&path) else { continue };
            if day < since.date_naive() {
                continue;
            }

            let (mut rows, skipped): (Vec<LogEntry>, usize) = read_json_lines(&path)?;
            if skipped > 0 {
                warn!(
                    site_id = %site_id,
                    file = %path.display(),
                    skipped,
                    "skipped malformed log lines"
                );
            }
            rows.retain(|e| e.timestamp >= since);
            entries.append(&mut rows);
        }

        entries.sort_by_key(|e| e.timestamp);
        Ok(entries)
    }

    /// Returns entries with `start <= timestamp < end`, ordered ascending.
    pub fn fetch_range(
        &self,
        site_id: &SiteId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LogEntry>> {
        let mut entries = self.fetch_since(site_id, start)?;
        entries.retain(|e| e.timestamp < end);
        Ok(entries)
    }

    /// True when the site has at least one entry in `[start, end)`.
    pub fn has_entries_between(
        &self,
        site_id: &SiteId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(!self.fetch_range(site_id, start, end)?.is_empty())
    }
}

fn day_of(path: &std::path::Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    stem.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn entry_at(site: &SiteId, message: &str, timestamp: DateTime<Utc>) -> LogEntry {
        let mut entry = LogEntry::text(site.clone(), "7", "foreman", message);
        entry.timestamp = timestamp;
        entry
    }

    #[tokio::test]
    async fn test_record_then_fetch_roundtrip() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path());
        let site = SiteId::new("main");

        let entry = LogEntry::text(site.clone(), "7", "foreman", "poured slab B2");
        store.record(&entry).await.unwrap();

        let fetched = store.fetch_since(&site, entry.timestamp).unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].id, entry.id);
        assert_eq!(fetched[0].payload, "poured slab B2");
    }

    #[tokio::test]
    async fn test_fetch_is_ordered_and_exactly_once() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path());
        let site = SiteId::new("main");
        let base = Utc::now();

        // Record out of order, spanning two UTC days.
        for offset_hours in [5i64, -20, 0, 2] {
            let entry = entry_at(&site, "update", base + Duration::hours(offset_hours));
            store.record(&entry).await.unwrap();
        }

        let fetched = store.fetch_since(&site, base - Duration::days(2)).unwrap();
        assert_eq!(fetched.len(), 4);
        for pair in fetched.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[tokio::test]
    async fn test_fetch_since_excludes_older() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path());
        let site = SiteId::new("main");
        let base = Utc::now();

        store
            .record(&entry_at(&site, "old", base - Duration::hours(3)))
            .await
            .unwrap();
        store.record(&entry_at(&site, "new", base)).await.unwrap();

        let fetched = store.fetch_since(&site, base - Duration::hours(1)).unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].payload, "new");
    }

    #[tokio::test]
    async fn test_fetch_range_is_half_open() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path());
        let site = SiteId::new("main");
        let base = Utc::now();

        store.record(&entry_at(&site, "at-start", base)).await.unwrap();
        store
            .record(&entry_at(&site, "at-end", base + Duration::hours(1)))
            .await
            .unwrap();

        let fetched = store
            .fetch_range(&site, base, base + Duration::hours(1))
            .unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].payload, "at-start");
    }

    #[tokio::test]
    async fn test_record_rejects_missing_fields() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path());
        let site = SiteId::new("main");

        let mut entry = LogEntry::text(site.clone(), "7", "foreman", "update");
        entry.payload.clear();

        let result = store.record(&entry).await;
        assert!(matches!(
            result,
            Err(PersistenceError::Validation { field: "payload" })
        ));
        assert!(store.fetch_since(&site, Utc::now() - Duration::days(1)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sites_are_isolated() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path());
        let north = SiteId::new("north");
        let south = SiteId::new("south");
        let base = Utc::now();

        store.record(&entry_at(&north, "north update", base)).await.unwrap();

        assert!(store
            .fetch_since(&south, base - Duration::hours(1))
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_has_entries_between() {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path());
        let site = SiteId::new("main");
        let base = Utc::now();

        assert!(!store
            .has_entries_between(&site, base - Duration::hours(2), base)
            .unwrap());

        store
            .record(&entry_at(&site, "update", base - Duration::hours(1)))
            .await
            .unwrap();

        assert!(store
            .has_entries_between(&site, base - Duration::hours(2), base)
            .unwrap());
    }
}
