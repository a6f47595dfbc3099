//! Compiled report records and their building blocks.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::LogEntry;
use crate::ids::{EntryId, ReportId, SiteId};
use crate::weather::WeatherSample;

/// A unit of project work tracked by the project-management collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPackage {
    /// Id assigned by the project-management system.
    pub id: u64,

    /// Subject line of the work package.
    pub subject: String,

    /// Status title, lower-cased (e.g. "in progress").
    pub status: String,

    /// Scheduled start date, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    /// Scheduled due date, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

/// Snapshot of project status at compile time, filtered to in-progress work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    /// Work packages that were in progress when the snapshot was taken.
    pub in_progress: Vec<WorkPackage>,

    /// When the snapshot was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl ProjectSnapshot {
    /// Wraps a fetched package list with the current time.
    pub fn new(in_progress: Vec<WorkPackage>) -> Self {
        Self {
            in_progress,
            fetched_at: Utc::now(),
        }
    }
}

/// AI commentary on one photo entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoNote {
    /// Entry the note describes.
    pub entry_id: EntryId,

    /// Analysis text, or the literal "unavailable" when the call failed.
    pub analysis: String,
}

/// AI enrichment attached to a report.
///
/// A report without AI commentary is still valuable, so this is an explicit
/// state rather than an error: compilation degrades to
/// [`AiInsights::Unavailable`] when the collaborator cannot be reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AiInsights {
    /// The collaborator answered.
    Ready {
        /// Summary of the period's text entries, if there were any.
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
        /// Per-photo analysis notes.
        photo_notes: Vec<PhotoNote>,
    },
    /// The collaborator was unavailable or rate-limited.
    Unavailable,
}

impl AiInsights {
    /// True when no AI commentary could be produced.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AiInsights::Unavailable)
    }
}

impl fmt::Display for AiInsights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiInsights::Ready { summary, .. } => {
                f.write_str(summary.as_deref().unwrap_or_default())
            }
            AiInsights::Unavailable => f.write_str("unavailable"),
        }
    }
}

/// The assembled output of one report compilation.
///
/// Immutable after creation; the compiler hands it to the renderer and
/// dispatcher without further changes. Aggregated entries all fall within
/// `[period_start, period_end)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Human-facing serial for this report.
    pub report_id: ReportId,

    /// Site the report covers.
    pub site_id: SiteId,

    /// Inclusive start of the aggregation window.
    pub period_start: DateTime<Utc>,

    /// Exclusive end of the aggregation window.
    pub period_end: DateTime<Utc>,

    /// Log entries within the window, ordered by timestamp.
    pub aggregated_logs: Vec<LogEntry>,

    /// Project status at compile time.
    pub project_status_snapshot: ProjectSnapshot,

    /// Latest weather observation, when the collaborator answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_summary: Option<WeatherSample>,

    /// AI enrichment, possibly degraded.
    pub ai_insights: AiInsights,

    /// When compilation finished.
    pub generated_at: DateTime<Utc>,
}

impl ReportRecord {
    /// Number of photo entries in the aggregated window.
    pub fn photo_count(&self) -> usize {
        self.aggregated_logs
            .iter()
            .filter(|e| e.kind == crate::entry::LogKind::Photo)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::LogEntry;

    #[test]
    fn test_unavailable_renders_as_literal() {
        assert_eq!(AiInsights::Unavailable.to_string(), "unavailable");
        assert!(AiInsights::Unavailable.is_unavailable());
    }

    #[test]
    fn test_ready_renders_summary() {
        let insights = AiInsights::Ready {
            summary: Some("two pours completed".to_string()),
            photo_notes: vec![],
        };
        assert_eq!(insights.to_string(), "two pours completed");
        assert!(!insights.is_unavailable());
    }

    #[test]
    fn test_photo_count() {
        let site = SiteId::new("main");
        let record = ReportRecord {
            report_id: ReportId::from_string("SP-AUG-26-001"),
            site_id: site.clone(),
            period_start: Utc::now(),
            period_end: Utc::now(),
            aggregated_logs: vec![
                LogEntry::text(site.clone(), "1", "a", "update"),
                LogEntry::photo(site.clone(), "1", "a", "/p/x.jpg", None),
            ],
            project_status_snapshot: ProjectSnapshot::new(vec![]),
            weather_summary: None,
            ai_insights: AiInsights::Unavailable,
            generated_at: Utc::now(),
        };
        assert_eq!(record.photo_count(), 1);
    }

    #[test]
    fn test_snapshot_serde() {
        let snapshot = ProjectSnapshot::new(vec![WorkPackage {
            id: 7,
            subject: "Formwork level 4".to_string(),
            status: "in progress".to_string(),
            start_date: None,
            due_date: NaiveDate::from_ymd_opt(2026, 8, 20),
        }]);
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ProjectSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.in_progress.len(), 1);
        assert_eq!(back.in_progress[0].subject, "Formwork level 4");
    }
}
