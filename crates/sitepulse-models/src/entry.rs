//! Site log entries.
//!
//! Entries are the append-only record of everything workers send from the
//! site: free-text updates and photos. An entry is immutable once created;
//! report compilation reads them but never rewrites them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{EntryId, SiteId};

/// What kind of payload an entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    /// Free-text site update; payload is the message text.
    Text,
    /// Photo upload; payload is the stored file path.
    Photo,
}

/// A single submission from the site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique identifier for this entry.
    pub id: EntryId,

    /// Site the entry belongs to.
    pub site_id: SiteId,

    /// Messaging-platform id of the author.
    pub author_id: String,

    /// Display name of the author at submission time.
    pub author_name: String,

    /// Payload kind.
    pub kind: LogKind,

    /// Message text for [`LogKind::Text`], stored file path for
    /// [`LogKind::Photo`].
    pub payload: String,

    /// Photo caption, if the author attached one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,

    /// When the entry was received.
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Creates a text entry stamped with the current time.
    pub fn text(
        site_id: SiteId,
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: EntryId::new(),
            site_id,
            author_id: author_id.into(),
            author_name: author_name.into(),
            kind: LogKind::Text,
            payload: message.into(),
            caption: None,
            timestamp: Utc::now(),
        }
    }

    /// Creates a photo entry pointing at a stored file.
    pub fn photo(
        site_id: SiteId,
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        file_path: impl Into<String>,
        caption: Option<String>,
    ) -> Self {
        Self {
            id: EntryId::new(),
            site_id,
            author_id: author_id.into(),
            author_name: author_name.into(),
            kind: LogKind::Photo,
            payload: file_path.into(),
            caption,
            timestamp: Utc::now(),
        }
    }

    /// Returns `Err` with the name of the first missing required field.
    ///
    /// The store rejects entries that fail this check; everything else is
    /// accepted verbatim.
    pub fn check_required_fields(&self) -> Result<(), &'static str> {
        if self.site_id.as_str().is_empty() {
            return Err("site_id");
        }
        if self.author_id.is_empty() {
            return Err("author_id");
        }
        if self.payload.is_empty() {
            return Err("payload");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_entry_fields() {
        let entry = LogEntry::text(SiteId::new("main"), "42", "foreman", "poured slab B2");
        assert_eq!(entry.kind, LogKind::Text);
        assert_eq!(entry.payload, "poured slab B2");
        assert!(entry.caption.is_none());
        assert!(entry.check_required_fields().is_ok());
    }

    #[test]
    fn test_photo_entry_keeps_caption() {
        let entry = LogEntry::photo(
            SiteId::new("main"),
            "42",
            "foreman",
            "/data/logs/2026-08-07/photos/abc.jpg",
            Some("rebar on level 3".to_string()),
        );
        assert_eq!(entry.kind, LogKind::Photo);
        assert_eq!(entry.caption.as_deref(), Some("rebar on level 3"));
    }

    #[test]
    fn test_required_fields_reported_by_name() {
        let mut entry = LogEntry::text(SiteId::new("main"), "42", "foreman", "update");
        entry.payload.clear();
        assert_eq!(entry.check_required_fields(), Err("payload"));

        entry.payload = "update".to_string();
        entry.author_id.clear();
        assert_eq!(entry.check_required_fields(), Err("author_id"));
    }

    #[test]
    fn test_entry_serde_roundtrip() {
        let entry = LogEntry::text(SiteId::new("main"), "42", "foreman", "update");
        let json = serde_json::to_string(&entry).unwrap();
        let back: LogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, entry.id);
        assert_eq!(back.payload, entry.payload);
        assert_eq!(back.timestamp, entry.timestamp);
    }
}
