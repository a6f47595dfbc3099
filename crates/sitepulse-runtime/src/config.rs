//! Runtime configuration.

use std::time::Duration;

use chrono::{FixedOffset, NaiveTime, Offset, Utc};

use sitepulse_models::SiteId;

/// One monitored site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Site identifier.
    pub id: SiteId,
    /// Latitude for weather lookups.
    pub latitude: f64,
    /// Longitude for weather lookups.
    pub longitude: f64,
}

/// A wrap-around window of local hours during which wind alerts are
/// suppressed (cranes are parked at night anyway).
#[derive(Debug, Clone, Copy)]
pub struct QuietHours {
    /// First quiet hour, 0–23.
    pub start_hour: u32,
    /// First loud hour after the window, 0–23.
    pub end_hour: u32,
}

impl QuietHours {
    /// True when `hour` falls inside the window.
    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            self.start_hour <= hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Configuration for the periodic tasks.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// How often to poll the weather collaborator.
    pub poll_interval: Duration,
    /// Wind alert threshold in km/h.
    pub wind_limit_kmh: f64,
    /// Rain-probability alert threshold in percent.
    pub rain_limit_pct: f64,
    /// Local hours during which wind alerts stay silent.
    pub quiet_hours: Option<QuietHours>,
    /// The sites' local UTC offset.
    pub utc_offset: FixedOffset,
    /// Local time of the safety-tip broadcast.
    pub safety_tip_time: NaiveTime,
    /// Local time of the no-activity reminder check.
    pub reminder_time: NaiveTime,
    /// Local time of scheduled report compilation.
    pub report_time: NaiveTime,
    /// The monitored sites.
    pub sites: Vec<SiteConfig>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3600),
            wind_limit_kmh: 30.0,
            rain_limit_pct: 50.0,
            quiet_hours: Some(QuietHours {
                start_hour: 22,
                end_hour: 6,
            }),
            utc_offset: offset_east_hours(3),
            safety_tip_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            reminder_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN),
            report_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            sites: Vec::new(),
        }
    }
}

impl RuntimeConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the weather poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the alert thresholds.
    pub fn with_thresholds(mut self, wind_limit_kmh: f64, rain_limit_pct: f64) -> Self {
        self.wind_limit_kmh = wind_limit_kmh;
        self.rain_limit_pct = rain_limit_pct;
        self
    }

    /// Sets (or clears) the wind-alert quiet hours.
    pub fn with_quiet_hours(mut self, quiet_hours: Option<QuietHours>) -> Self {
        self.quiet_hours = quiet_hours;
        self
    }

    /// Sets the local UTC offset.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Sets the scheduled report time.
    pub fn with_report_time(mut self, time: NaiveTime) -> Self {
        self.report_time = time;
        self
    }

    /// Adds a monitored site.
    pub fn with_site(mut self, id: SiteId, latitude: f64, longitude: f64) -> Self {
        self.sites.push(SiteConfig {
            id,
            latitude,
            longitude,
        });
        self
    }
}

/// Builds a whole-hour eastern offset, falling back to UTC for values
/// outside chrono's range.
pub fn offset_east_hours(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = RuntimeConfig::default();
        assert_eq!(config.wind_limit_kmh, 30.0);
        assert_eq!(config.rain_limit_pct, 50.0);
        assert_eq!(config.poll_interval, Duration::from_secs(3600));
    }

    #[test]
    fn test_quiet_hours_wraparound() {
        let quiet = QuietHours {
            start_hour: 22,
            end_hour: 6,
        };
        assert!(quiet.contains(23));
        assert!(quiet.contains(0));
        assert!(quiet.contains(5));
        assert!(!quiet.contains(6));
        assert!(!quiet.contains(12));
    }

    #[test]
    fn test_quiet_hours_same_day() {
        let quiet = QuietHours {
            start_hour: 12,
            end_hour: 14,
        };
        assert!(quiet.contains(12));
        assert!(quiet.contains(13));
        assert!(!quiet.contains(14));
        assert!(!quiet.contains(11));
    }

    #[test]
    fn test_offset_out_of_range_falls_back_to_utc() {
        assert_eq!(offset_east_hours(99).local_minus_utc(), 0);
        assert_eq!(offset_east_hours(3).local_minus_utc(), 3 * 3600);
    }

    #[test]
    fn test_builder() {
        let config = RuntimeConfig::new()
            .with_poll_interval(Duration::from_millis(10))
            .with_thresholds(40.0, 60.0)
            .with_site(SiteId::new("main"), 24.7, 46.7);

        assert_eq!(config.poll_interval, Duration::from_millis(10));
        assert_eq!(config.wind_limit_kmh, 40.0);
        assert_eq!(config.sites.len(), 1);
    }
}
