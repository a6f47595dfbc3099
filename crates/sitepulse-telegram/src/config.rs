//! Process configuration from the environment.

use std::path::PathBuf;

use chrono::{FixedOffset, NaiveTime};

use sitepulse_models::SiteId;
use sitepulse_runtime::config::offset_east_hours;

use crate::error::ConfigError;

/// Default AI gateway root.
const DEFAULT_AI_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default AI model slug.
const DEFAULT_AI_MODEL: &str = "google/gemini-2.5-pro";

/// Default site coordinates.
const DEFAULT_LAT: f64 = 24.7136;
const DEFAULT_LON: f64 = 46.6753;

/// Default data directory name under home.
const DEFAULT_DATA_DIR: &str = ".sitepulse";

/// Everything the process needs, validated at startup.
///
/// Missing required variables abort startup with a diagnostic; there is no
/// partially configured mode.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Telegram bot token.
    pub bot_token: String,
    /// AI gateway root URL.
    pub ai_base_url: String,
    /// AI credential.
    pub ai_api_key: String,
    /// AI model slug.
    pub ai_model: String,
    /// OpenProject instance URL.
    pub project_url: String,
    /// OpenProject API key.
    pub project_api_key: String,
    /// Weather API credential.
    pub weather_api_key: String,
    /// Site latitude.
    pub latitude: f64,
    /// Site longitude.
    pub longitude: f64,
    /// Base directory for logs, settings, and reports.
    pub data_dir: PathBuf,
    /// User ids allowed to run admin commands; empty means unrestricted.
    pub admin_ids: Vec<i64>,
    /// Site UTC offset in whole hours.
    pub utc_offset_hours: i32,
    /// Notification locale code.
    pub locale: String,
    /// Local time of the scheduled daily report.
    pub report_time: NaiveTime,
    /// Site identifier.
    pub site_id: String,
}

impl AppConfig {
    /// Reads and validates the configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bot_token: required("TELEGRAM_BOT_TOKEN")?,
            ai_base_url: optional("OPENROUTER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string()),
            ai_api_key: required("OPENROUTER_API_KEY")?,
            ai_model: optional("OPENROUTER_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
            project_url: required("OPENPROJECT_URL")?,
            project_api_key: required("OPENPROJECT_API_KEY")?,
            weather_api_key: required("OPENWEATHER_API_KEY")?,
            latitude: parsed("OPENWEATHER_LAT", DEFAULT_LAT)?,
            longitude: parsed("OPENWEATHER_LON", DEFAULT_LON)?,
            data_dir: optional("SITEPULSE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_data_dir),
            admin_ids: parse_admin_ids(&optional("SITEPULSE_ADMIN_IDS").unwrap_or_default())?,
            utc_offset_hours: parsed("SITEPULSE_UTC_OFFSET", 3)?,
            locale: optional("SITEPULSE_LOCALE").unwrap_or_else(|| "ar".to_string()),
            report_time: parse_report_time(
                &optional("SITEPULSE_REPORT_TIME").unwrap_or_else(|| "17:00".to_string()),
            )?,
            site_id: optional("SITEPULSE_SITE_ID").unwrap_or_else(|| "main".to_string()),
        })
    }

    /// The configured site id.
    pub fn site(&self) -> SiteId {
        SiteId::new(self.site_id.as_str())
    }

    /// The site's fixed UTC offset.
    pub fn utc_offset(&self) -> FixedOffset {
        offset_east_hours(self.utc_offset_hours)
    }

    /// True when `user_id` may run admin commands. An empty admin list
    /// leaves admin commands unrestricted (logged at startup).
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.is_empty() || self.admin_ids.contains(&user_id)
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn optional(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match optional(name) {
        Some(raw) => raw.trim().parse().map_err(|e| ConfigError::Invalid {
            name,
            reason: format!("{e}"),
        }),
        None => Ok(default),
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(DEFAULT_DATA_DIR))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Parses a comma-separated admin id list.
fn parse_admin_ids(raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse().map_err(|_| ConfigError::Invalid {
                name: "SITEPULSE_ADMIN_IDS",
                reason: format!("`{part}` is not a user id"),
            })
        })
        .collect()
}

/// Parses an `HH:MM` local time.
fn parse_report_time(raw: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| ConfigError::Invalid {
        name: "SITEPULSE_REPORT_TIME",
        reason: format!("`{raw}` is not HH:MM"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_ids() {
        assert_eq!(parse_admin_ids("").unwrap(), Vec::<i64>::new());
        assert_eq!(parse_admin_ids("42").unwrap(), vec![42]);
        assert_eq!(
            parse_admin_ids("42, -100123, 7").unwrap(),
            vec![42, -100123, 7]
        );
        assert!(parse_admin_ids("42,abc").is_err());
    }

    #[test]
    fn test_parse_report_time() {
        assert_eq!(
            parse_report_time("17:30").unwrap(),
            NaiveTime::from_hms_opt(17, 30, 0).unwrap()
        );
        assert!(parse_report_time("25:00").is_err());
        assert!(parse_report_time("evening").is_err());
    }

    #[test]
    fn test_empty_admin_list_is_unrestricted() {
        let mut config = sample_config();
        config.admin_ids.clear();
        assert!(config.is_admin(1));

        config.admin_ids = vec![42];
        assert!(config.is_admin(42));
        assert!(!config.is_admin(1));
    }

    fn sample_config() -> AppConfig {
        AppConfig {
            bot_token: "token".to_string(),
            ai_base_url: DEFAULT_AI_BASE_URL.to_string(),
            ai_api_key: "key".to_string(),
            ai_model: DEFAULT_AI_MODEL.to_string(),
            project_url: "https://project.example".to_string(),
            project_api_key: "key".to_string(),
            weather_api_key: "key".to_string(),
            latitude: DEFAULT_LAT,
            longitude: DEFAULT_LON,
            data_dir: PathBuf::from("/tmp/sitepulse"),
            admin_ids: vec![],
            utc_offset_hours: 3,
            locale: "ar".to_string(),
            report_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            site_id: "main".to_string(),
        }
    }
}
