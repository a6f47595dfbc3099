//! Hourly weather polling and alerting.

use chrono::{DateTime, Timelike, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info, warn};

use sitepulse_clients::WeatherApi;
use sitepulse_dispatch::{Dispatcher, OutboundMessage, Severity};
use sitepulse_models::{AlertKind, SiteId, WeatherSample};
use sitepulse_persistence::SettingsStore;

use crate::alert::{AlertMonitor, Transition};
use crate::config::{RuntimeConfig, SiteConfig};

/// Polls the weather collaborator and drives the alert state machines.
///
/// One fetch per site per cycle. A failed fetch is logged and waits for
/// the next cycle; it is never retried within the cycle, so one flaky
/// provider response cannot turn into an alert storm.
pub struct WeatherPoller {
    weather: Arc<dyn WeatherApi>,
    settings: Arc<SettingsStore>,
    dispatcher: Dispatcher,
    config: RuntimeConfig,
    monitor: AlertMonitor,
    shutdown: watch::Receiver<bool>,
}

impl WeatherPoller {
    /// Creates a poller; alert state starts all-inactive.
    pub fn new(
        weather: Arc<dyn WeatherApi>,
        settings: Arc<SettingsStore>,
        dispatcher: Dispatcher,
        config: RuntimeConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            weather,
            settings,
            dispatcher,
            config,
            monitor: AlertMonitor::new(),
            shutdown,
        }
    }

    /// Runs the polling loop until the shutdown signal.
    pub async fn run(&mut self) {
        let mut ticker = interval(self.config.poll_interval);

        debug!(
            poll_interval_s = self.config.poll_interval.as_secs(),
            "starting weather poller"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_all().await;
                }
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        debug!("weather poller received shutdown signal");
                        break;
                    }
                }
            }
        }

        debug!("weather poller stopped");
    }

    /// Polls every configured site once.
    async fn poll_all(&mut self) {
        for site in self.config.sites.clone() {
            match self.weather.current(site.latitude, site.longitude).await {
                Ok(sample) => self.evaluate(&site, &sample, Utc::now()),
                Err(e) => {
                    // Wait for the next cycle; alert state is untouched.
                    warn!(site_id = %site.id, error = %e, "weather fetch failed");
                }
            }
        }
    }

    /// Feeds one sample through both threshold machines and dispatches on
    /// raise edges.
    fn evaluate(&mut self, site: &SiteConfig, sample: &WeatherSample, now: DateTime<Utc>) {
        let local_hour = now.with_timezone(&self.config.utc_offset).hour();
        let quiet = self
            .config
            .quiet_hours
            .is_some_and(|q| q.contains(local_hour));

        // Cranes are parked during quiet hours; the wind predicate is not
        // evaluated at all, so a breach that starts at night raises at the
        // first daytime cycle.
        if quiet {
            debug!(site_id = %site.id, local_hour, "quiet hours, skipping wind check");
        } else {
            let breached = sample.wind_speed_kmh > self.config.wind_limit_kmh;
            match self.monitor.observe(&site.id, AlertKind::HighWind, breached, now) {
                Transition::Raised => {
                    info!(
                        site_id = %site.id,
                        wind_kmh = sample.wind_speed_kmh,
                        "high wind alert raised"
                    );
                    self.send_alert(
                        &site.id,
                        OutboundMessage::WindAlert {
                            wind_speed_kmh: sample.wind_speed_kmh,
                        },
                    );
                }
                Transition::Cleared => {
                    info!(site_id = %site.id, "high wind condition cleared");
                }
                Transition::Unchanged => {}
            }
        }

        let breached = sample.rain_probability_pct > self.config.rain_limit_pct;
        match self
            .monitor
            .observe(&site.id, AlertKind::HighRainProbability, breached, now)
        {
            Transition::Raised => {
                info!(
                    site_id = %site.id,
                    rain_pct = sample.rain_probability_pct,
                    "rain probability alert raised"
                );
                self.send_alert(
                    &site.id,
                    OutboundMessage::RainAlert {
                        rain_probability_pct: sample.rain_probability_pct,
                    },
                );
            }
            Transition::Cleared => {
                info!(site_id = %site.id, "rain probability condition cleared");
            }
            Transition::Unchanged => {}
        }
    }

    fn send_alert(&self, site_id: &SiteId, message: OutboundMessage) {
        match self.settings.alert_destination(site_id) {
            Ok(Some(chat_id)) => {
                if let Err(e) = self.dispatcher.dispatch(chat_id, message, Severity::Warning) {
                    warn!(site_id = %site_id, error = %e, "failed to enqueue alert");
                }
            }
            Ok(None) => {
                warn!(site_id = %site_id, "no alert destination configured, alert not delivered");
            }
            Err(e) => {
                warn!(site_id = %site_id, error = %e, "failed to load alert destination");
            }
        }
    }
}
