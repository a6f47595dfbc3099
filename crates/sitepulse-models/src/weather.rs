//! Weather observations and alert categories.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation from the weather collaborator.
///
/// Samples are compared against alert thresholds and then discarded; they
/// are never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// When the sample was taken.
    pub timestamp: DateTime<Utc>,

    /// Wind speed in km/h.
    pub wind_speed_kmh: f64,

    /// Probability of rain over the coming hours, 0–100.
    pub rain_probability_pct: f64,
}

impl WeatherSample {
    /// Creates a sample stamped with the current time.
    pub fn now(wind_speed_kmh: f64, rain_probability_pct: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            wind_speed_kmh,
            rain_probability_pct,
        }
    }
}

/// Categorical label keying alert de-duplication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    /// Wind speed above the crane-stop threshold.
    HighWind,
    /// Rain probability above the threshold.
    HighRainProbability,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::HighWind => f.write_str("high-wind"),
            AlertKind::HighRainProbability => f.write_str("high-rain-probability"),
        }
    }
}
