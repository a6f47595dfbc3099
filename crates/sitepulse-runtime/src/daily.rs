//! Fixed-time daily jobs.
//!
//! Three jobs fire at configured local wall-clock times: the safety-tip
//! broadcast, the no-activity reminder check, and scheduled report
//! compilation. Each job latches on the local date it last ran, so a
//! double fire within the same day is a no-op.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use sitepulse_clients::SiteAnalyst;
use sitepulse_dispatch::{Dispatcher, OutboundMessage, Severity};
use sitepulse_models::SiteId;
use sitepulse_persistence::{LogStore, SettingsStore};
use sitepulse_report::{Period, ReportCompiler, ReportError};

use crate::config::RuntimeConfig;

/// Canned tip used when the AI collaborator cannot produce one. The
/// failure is reported through this fallback once; the job does not retry
/// until the next day.
const FALLBACK_TIP: &str =
    "⚠️ تذكير بالسلامة: تأكد من ارتداء الخوذة وحذاء السلامة في جميع الأوقات.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Job {
    SafetyTip,
    ActivityReminder,
    CompileReports,
}

/// Runs the fixed-time daily jobs until shutdown.
pub struct DailyScheduler {
    store: Arc<LogStore>,
    settings: Arc<SettingsStore>,
    analyst: Arc<dyn SiteAnalyst>,
    compiler: Arc<ReportCompiler>,
    dispatcher: Dispatcher,
    config: RuntimeConfig,
    shutdown: watch::Receiver<bool>,
    tip_sent_on: Option<NaiveDate>,
    reminder_sent_on: HashMap<SiteId, NaiveDate>,
    reports_run_on: Option<NaiveDate>,
}

impl DailyScheduler {
    /// Creates a scheduler over the given stores and collaborators.
    pub fn new(
        store: Arc<LogStore>,
        settings: Arc<SettingsStore>,
        analyst: Arc<dyn SiteAnalyst>,
        compiler: Arc<ReportCompiler>,
        dispatcher: Dispatcher,
        config: RuntimeConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            settings,
            analyst,
            compiler,
            dispatcher,
            config,
            shutdown,
            tip_sent_on: None,
            reminder_sent_on: HashMap::new(),
            reports_run_on: None,
        }
    }

    /// Sleeps until the nearest job time, runs it, repeats. Stops on the
    /// shutdown signal.
    pub async fn run(&mut self) {
        debug!(
            tip = %self.config.safety_tip_time,
            reminder = %self.config.reminder_time,
            report = %self.config.report_time,
            "starting daily scheduler"
        );

        loop {
            let now = Utc::now();
            let (job, at) = self.next_job(now);
            let delay = (at - now).to_std().unwrap_or(Duration::ZERO);
            debug!(?job, at = %at, "next daily job");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    self.run_job(job, Utc::now()).await;
                }
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        debug!("daily scheduler received shutdown signal");
                        break;
                    }
                }
            }
        }

        debug!("daily scheduler stopped");
    }

    /// Picks the job with the nearest upcoming occurrence.
    fn next_job(&self, now: DateTime<Utc>) -> (Job, DateTime<Utc>) {
        let offset = self.config.utc_offset;
        [
            (Job::SafetyTip, self.config.safety_tip_time),
            (Job::ActivityReminder, self.config.reminder_time),
            (Job::CompileReports, self.config.report_time),
        ]
        .into_iter()
        .map(|(job, at)| (job, next_occurrence(now, at, offset)))
        .min_by_key(|(_, at)| *at)
        .unwrap_or((Job::SafetyTip, now + ChronoDuration::days(1)))
    }

    async fn run_job(&mut self, job: Job, now: DateTime<Utc>) {
        match job {
            Job::SafetyTip => self.run_safety_tip(now).await,
            Job::ActivityReminder => self.run_reminder_check(now).await,
            Job::CompileReports => self.run_reports(now).await,
        }
    }

    /// Fetches one AI tip and broadcasts it to every site destination.
    ///
    /// On failure the canned fallback goes out instead; either way the job
    /// latches and will not run again until tomorrow.
    async fn run_safety_tip(&mut self, now: DateTime<Utc>) {
        let today = self.local_date(now);
        if self.tip_sent_on == Some(today) {
            return;
        }
        self.tip_sent_on = Some(today);

        let tip = match self.analyst.safety_tip().await {
            Ok(tip) => tip,
            Err(e) => {
                warn!(error = %e, "safety tip unavailable, broadcasting fallback");
                FALLBACK_TIP.to_string()
            }
        };

        for site in self.config.sites.clone() {
            self.send(&site.id, OutboundMessage::SafetyTip { tip: tip.clone() }, Severity::Info);
        }
    }

    /// Dispatches a reminder for every site with no activity so far today.
    ///
    /// Idempotent: once logs exist, or once a reminder went out, re-running
    /// the check the same day is a no-op.
    async fn run_reminder_check(&mut self, now: DateTime<Utc>) {
        let today = self.local_date(now);
        let day_start = Period::day(today, self.config.utc_offset).start;

        for site in self.config.sites.clone() {
            if self.reminder_sent_on.get(&site.id) == Some(&today) {
                continue;
            }
            match self.store.has_entries_between(&site.id, day_start, now) {
                Ok(true) => {
                    debug!(site_id = %site.id, "activity present, no reminder needed");
                }
                Ok(false) => {
                    info!(site_id = %site.id, "no activity yet today, sending reminder");
                    self.send(&site.id, OutboundMessage::ActivityReminder, Severity::Warning);
                    self.reminder_sent_on.insert(site.id.clone(), today);
                }
                Err(e) => {
                    warn!(site_id = %site.id, error = %e, "activity check failed");
                }
            }
        }
    }

    /// Compiles and delivers today's report for every site.
    async fn run_reports(&mut self, now: DateTime<Utc>) {
        let today = self.local_date(now);
        if self.reports_run_on == Some(today) {
            return;
        }
        self.reports_run_on = Some(today);

        for site in self.config.sites.clone() {
            let period = Period::day(today, self.config.utc_offset);
            match self.compiler.compile(&site.id, period).await {
                Ok(compiled) => {
                    self.send(
                        &site.id,
                        OutboundMessage::ReportReady {
                            report_id: compiled.record.report_id.to_string(),
                            report_date: today,
                            file: compiled.file,
                        },
                        Severity::Info,
                    );
                }
                Err(ReportError::CompileInFlight(_)) => {
                    warn!(site_id = %site.id, "scheduled compile skipped, one already in flight");
                }
                Err(e) => {
                    warn!(site_id = %site.id, error = %e, "scheduled report compilation failed");
                }
            }
        }
    }

    fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.config.utc_offset).date_naive()
    }

    fn send(&self, site_id: &SiteId, message: OutboundMessage, severity: Severity) {
        match self.settings.alert_destination(site_id) {
            Ok(Some(chat_id)) => {
                if let Err(e) = self.dispatcher.dispatch(chat_id, message, severity) {
                    warn!(site_id = %site_id, error = %e, "failed to enqueue notification");
                }
            }
            Ok(None) => {
                warn!(site_id = %site_id, "no destination configured, notification not delivered");
            }
            Err(e) => {
                warn!(site_id = %site_id, error = %e, "failed to load destination");
            }
        }
    }
}

/// Next UTC instant at which the local wall clock reads `at`.
fn next_occurrence(now: DateTime<Utc>, at: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    let local_now = now.with_timezone(&offset);
    let mut date = local_now.date_naive();
    if local_now.time() >= at {
        date = date.succ_opt().unwrap_or(date);
    }
    let naive = date.and_time(at);
    Utc.from_utc_datetime(&(naive - ChronoDuration::seconds(offset.local_minus_utc() as i64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use std::time::Duration;
    use tempfile::tempdir;

    use sitepulse_dispatch::{DispatcherConfig, EnglishFormatter};
    use sitepulse_models::LogEntry;
    use sitepulse_persistence::ReportCounterStore;
    use sitepulse_report::HtmlRenderer;

    use crate::config::offset_east_hours;
    use crate::testutil::{MockAnalyst, MockProject, MockWeather, RecordingTransport};

    struct Harness {
        _dir: tempfile::TempDir,
        scheduler: DailyScheduler,
        store: Arc<LogStore>,
        transport: Arc<RecordingTransport>,
        site: SiteId,
    }

    async fn harness(analyst: MockAnalyst) -> Harness {
        let dir = tempdir().unwrap();
        let store = Arc::new(LogStore::new(dir.path()));
        let settings = Arc::new(SettingsStore::new(dir.path()));
        let counter = Arc::new(ReportCounterStore::new(dir.path()));
        let site = SiteId::new("main");
        settings.set_alert_destination(&site, 42).await.unwrap();

        let transport = RecordingTransport::new();
        let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        let (dispatcher, _handle) = Dispatcher::spawn(
            Arc::clone(&transport) as Arc<dyn sitepulse_dispatch::Transport>,
            Arc::new(EnglishFormatter),
            DispatcherConfig::default(),
            shutdown_rx.clone(),
        );

        let analyst = Arc::new(analyst);
        let compiler = Arc::new(ReportCompiler::new(
            Arc::clone(&store),
            counter,
            Arc::new(MockProject),
            Arc::new(MockWeather::fixed(sitepulse_models::WeatherSample::now(
                10.0, 5.0,
            ))),
            Arc::clone(&analyst) as Arc<dyn SiteAnalyst>,
            Arc::new(HtmlRenderer::new(dir.path().join("reports"))),
        ));

        let config = RuntimeConfig::default().with_site(site.clone(), 24.7, 46.7);
        let scheduler = DailyScheduler::new(
            Arc::clone(&store),
            settings,
            analyst,
            compiler,
            dispatcher,
            config,
            shutdown_rx,
        );

        Harness {
            _dir: dir,
            scheduler,
            store,
            transport,
            site,
        }
    }

    /// 10:00 local at the default +03:00 offset.
    fn ten_am_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, 7, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_reminder_sent_once_when_no_activity() {
        let mut h = harness(MockAnalyst::ok()).await;
        let now = ten_am_utc();

        h.scheduler.run_reminder_check(now).await;
        h.scheduler.run_reminder_check(now).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        let sent = h.transport.texts();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("No site activity"));
    }

    #[tokio::test]
    async fn test_no_reminder_when_entry_exists() {
        let mut h = harness(MockAnalyst::ok()).await;
        let now = ten_am_utc();

        // One entry at 09:59 local.
        let mut entry = LogEntry::text(h.site.clone(), "7", "foreman", "starting work");
        entry.timestamp = now - ChronoDuration::minutes(1);
        h.store.record(&entry).await.unwrap();

        h.scheduler.run_reminder_check(now).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(h.transport.texts().is_empty());
    }

    #[tokio::test]
    async fn test_yesterdays_entries_do_not_count() {
        let mut h = harness(MockAnalyst::ok()).await;
        let now = ten_am_utc();

        let mut entry = LogEntry::text(h.site.clone(), "7", "foreman", "old news");
        entry.timestamp = now - ChronoDuration::days(1);
        h.store.record(&entry).await.unwrap();

        h.scheduler.run_reminder_check(now).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.transport.texts().len(), 1);
    }

    #[tokio::test]
    async fn test_safety_tip_broadcast_verbatim() {
        let mut h = harness(MockAnalyst::ok()).await;

        h.scheduler.run_safety_tip(ten_am_utc()).await;
        h.scheduler.run_safety_tip(ten_am_utc()).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        let sent = h.transport.texts();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], "🦺 wear your harness");
    }

    #[tokio::test]
    async fn test_safety_tip_failure_sends_fallback_once() {
        let mut h = harness(MockAnalyst::failing()).await;

        h.scheduler.run_safety_tip(ten_am_utc()).await;
        h.scheduler.run_safety_tip(ten_am_utc()).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        let sent = h.transport.texts();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], FALLBACK_TIP);
    }

    #[tokio::test]
    async fn test_scheduled_report_delivered_as_file() {
        let mut h = harness(MockAnalyst::ok()).await;
        let now = ten_am_utc();

        let mut entry = LogEntry::text(h.site.clone(), "7", "foreman", "poured slab B2");
        entry.timestamp = now - ChronoDuration::hours(1);
        h.store.record(&entry).await.unwrap();

        h.scheduler.run_reports(now).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        let captions = h.transport.file_captions();
        assert_eq!(captions.len(), 1);
        // Serial month tracks the wall clock; check the stable parts.
        assert!(captions[0].contains("SP-"));
        assert!(captions[0].contains("-001"));
    }

    #[test]
    fn test_next_occurrence_today_and_tomorrow() {
        let offset = offset_east_hours(3);
        let eight = NaiveTime::from_hms_opt(8, 0, 0).unwrap();

        // 06:00 local: today at 08:00 local = 05:00 UTC.
        let now = ten_am_utc() - ChronoDuration::hours(4);
        let at = next_occurrence(now, eight, offset);
        assert_eq!(at, ten_am_utc() - ChronoDuration::hours(2));

        // 10:00 local: tomorrow.
        let at = next_occurrence(ten_am_utc(), eight, offset);
        assert_eq!(at, ten_am_utc() + ChronoDuration::hours(22));
    }

    #[tokio::test]
    async fn test_next_job_picks_nearest() {
        let h = harness(MockAnalyst::ok()).await;

        // 09:00 local: the 10:00 reminder is nearer than tomorrow's tip or
        // today's 17:00 report.
        let nine_am = ten_am_utc() - ChronoDuration::hours(1);
        let (job, at) = h.scheduler.next_job(nine_am);
        assert_eq!(job, Job::ActivityReminder);
        assert_eq!(at, ten_am_utc());
    }
}
