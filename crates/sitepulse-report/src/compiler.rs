//! The report compilation pipeline.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use sitepulse_clients::{ProjectApi, SiteAnalyst, WeatherApi};
use sitepulse_models::{
    AiInsights, LogEntry, LogKind, PhotoNote, ProjectSnapshot, ReportRecord, SiteId,
};
use sitepulse_persistence::{LogStore, ReportCounterStore};

use crate::error::{ReportError, Result};
use crate::period::Period;
use crate::render::ReportRenderer;

/// Default ceiling for one AI sub-request.
const DEFAULT_AI_TIMEOUT: Duration = Duration::from_secs(25);

/// A finished compilation: the record plus the rendered document.
#[derive(Debug, Clone)]
pub struct CompiledReport {
    /// The assembled report.
    pub record: ReportRecord,
    /// Path of the rendered document.
    pub file: PathBuf,
}

/// Compiles site reports.
///
/// `compile` enforces at-most-one in-flight compilation per site: a second
/// call for the same site while one runs is rejected with
/// [`ReportError::CompileInFlight`] rather than producing a duplicate
/// report (and duplicate AI billing).
pub struct ReportCompiler {
    store: Arc<LogStore>,
    counter: Arc<ReportCounterStore>,
    project: Arc<dyn ProjectApi>,
    weather: Arc<dyn WeatherApi>,
    analyst: Arc<dyn SiteAnalyst>,
    renderer: Arc<dyn ReportRenderer>,
    site_coordinates: HashMap<SiteId, (f64, f64)>,
    ai_timeout: Duration,
    in_flight: StdMutex<HashSet<SiteId>>,
}

impl ReportCompiler {
    /// Creates a compiler over the given stores and collaborators.
    pub fn new(
        store: Arc<LogStore>,
        counter: Arc<ReportCounterStore>,
        project: Arc<dyn ProjectApi>,
        weather: Arc<dyn WeatherApi>,
        analyst: Arc<dyn SiteAnalyst>,
        renderer: Arc<dyn ReportRenderer>,
    ) -> Self {
        Self {
            store,
            counter,
            project,
            weather,
            analyst,
            renderer,
            site_coordinates: HashMap::new(),
            ai_timeout: DEFAULT_AI_TIMEOUT,
            in_flight: StdMutex::new(HashSet::new()),
        }
    }

    /// Registers a site's coordinates for the weather step.
    pub fn with_site(mut self, site_id: SiteId, latitude: f64, longitude: f64) -> Self {
        self.site_coordinates.insert(site_id, (latitude, longitude));
        self
    }

    /// Overrides the per-call AI timeout.
    pub fn with_ai_timeout(mut self, timeout: Duration) -> Self {
        self.ai_timeout = timeout;
        self
    }

    /// Runs the staged pipeline for one site and period.
    ///
    /// Log and project fetches are fatal on failure; weather and AI degrade
    /// (missing summary, [`AiInsights::Unavailable`]).
    pub async fn compile(&self, site_id: &SiteId, period: Period) -> Result<CompiledReport> {
        let _guard = InFlightGuard::acquire(&self.in_flight, site_id)?;
        info!(site_id = %site_id, start = %period.start, "compiling report");

        let entries = self.store.fetch_range(site_id, period.start, period.end)?;

        let packages = self
            .project
            .in_progress_work_packages()
            .await
            .map_err(ReportError::Project)?;
        let snapshot = ProjectSnapshot::new(packages);

        let weather_summary = match self.site_coordinates.get(site_id) {
            Some(&(lat, lon)) => match self.weather.current(lat, lon).await {
                Ok(sample) => Some(sample),
                Err(e) => {
                    warn!(site_id = %site_id, error = %e, "weather unavailable for report");
                    None
                }
            },
            None => None,
        };

        let ai_insights = self.gather_insights(&entries).await;

        let report_id = self.counter.next_report_id(Utc::now()).await?;
        let record = ReportRecord {
            report_id,
            site_id: site_id.clone(),
            period_start: period.start,
            period_end: period.end,
            aggregated_logs: entries,
            project_status_snapshot: snapshot,
            weather_summary,
            ai_insights,
            generated_at: Utc::now(),
        };

        let file = self.renderer.render(&record)?;
        info!(
            site_id = %site_id,
            report_id = %record.report_id,
            file = %file.display(),
            "report compiled"
        );
        Ok(CompiledReport { record, file })
    }

    /// Fans out the AI enrichment calls and joins them.
    ///
    /// Text summarization and per-photo analysis have no mutual ordering,
    /// so they all run concurrently; assembly waits for every call to
    /// resolve or time out. When every attempted call fails, the whole
    /// enrichment degrades to [`AiInsights::Unavailable`].
    async fn gather_insights(&self, entries: &[LogEntry]) -> AiInsights {
        let transcript = build_transcript(entries);
        let photos: Vec<&LogEntry> = entries
            .iter()
            .filter(|e| e.kind == LogKind::Photo)
            .collect();

        let summarize = async {
            match transcript.as_deref() {
                Some(text) => Some(self.ai_call(self.analyst.summarize(text)).await),
                None => None,
            }
        };

        let analyses = join_all(photos.iter().map(|entry| async move {
            let analysis = match tokio::fs::read(&entry.payload).await {
                Ok(bytes) => {
                    self.ai_call(self.analyst.analyze_image(&bytes, entry.caption.as_deref()))
                        .await
                }
                Err(e) => {
                    warn!(path = %entry.payload, error = %e, "failed to read photo for analysis");
                    None
                }
            };
            (entry.id.clone(), analysis)
        }));

        let (summary_outcome, photo_outcomes) = tokio::join!(summarize, analyses);

        let mut attempted = 0usize;
        let mut failed = 0usize;

        let summary = match summary_outcome {
            Some(outcome) => {
                attempted += 1;
                if outcome.is_none() {
                    failed += 1;
                }
                outcome
            }
            None => None,
        };

        let photo_notes: Vec<PhotoNote> = photo_outcomes
            .into_iter()
            .map(|(entry_id, outcome)| {
                attempted += 1;
                let analysis = match outcome {
                    Some(text) => text,
                    None => {
                        failed += 1;
                        "unavailable".to_string()
                    }
                };
                PhotoNote { entry_id, analysis }
            })
            .collect();

        if attempted > 0 && failed == attempted {
            debug!("all AI calls failed, marking insights unavailable");
            AiInsights::Unavailable
        } else {
            AiInsights::Ready {
                summary,
                photo_notes,
            }
        }
    }

    /// Runs one AI call under the configured timeout, flattening failures.
    async fn ai_call(
        &self,
        call: impl std::future::Future<Output = sitepulse_clients::Result<String>>,
    ) -> Option<String> {
        match tokio::time::timeout(self.ai_timeout, call).await {
            Ok(Ok(text)) => Some(text),
            Ok(Err(e)) => {
                warn!(error = %e, "AI call failed");
                None
            }
            Err(_) => {
                warn!(timeout_s = self.ai_timeout.as_secs(), "AI call timed out");
                None
            }
        }
    }
}

/// Builds the transcript fed to summarization; `None` when the period has
/// no text to summarize.
fn build_transcript(entries: &[LogEntry]) -> Option<String> {
    let mut lines = Vec::new();
    for entry in entries {
        match entry.kind {
            LogKind::Text => lines.push(format!(
                "{}: {}: {}",
                entry.timestamp.format("%H:%M"),
                entry.author_name,
                entry.payload
            )),
            LogKind::Photo => {
                if let Some(caption) = &entry.caption {
                    lines.push(format!(
                        "{}: {}: [photo] {}",
                        entry.timestamp.format("%H:%M"),
                        entry.author_name,
                        caption
                    ));
                }
            }
        }
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Marks a site as having a compilation in flight; clears on drop.
struct InFlightGuard<'a> {
    set: &'a StdMutex<HashSet<SiteId>>,
    site_id: SiteId,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(set: &'a StdMutex<HashSet<SiteId>>, site_id: &SiteId) -> Result<Self> {
        let mut in_flight = set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !in_flight.insert(site_id.clone()) {
            return Err(ReportError::CompileInFlight(site_id.clone()));
        }
        Ok(Self {
            set,
            site_id: site_id.clone(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = self
            .set
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        in_flight.remove(&self.site_id);
    }
}
