//! Weather collaborator.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use sitepulse_models::WeatherSample;

use crate::error::{ClientError, Result};

const SERVICE: &str = "weather";

/// Default API root (OpenWeatherMap data 2.5).
const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// How many forecast slots (3 h each) to scan for rain probability.
const FORECAST_SLOTS: usize = 2;

/// The weather collaborator interface.
#[async_trait]
pub trait WeatherApi: Send + Sync {
    /// Fetches the current observation for the given coordinates.
    async fn current(&self, lat: f64, lon: f64) -> Result<WeatherSample>;
}

/// OpenWeatherMap-backed [`WeatherApi`].
///
/// One sample needs two requests: the current-weather endpoint carries wind
/// but no precipitation probability, so the probability comes from the next
/// forecast slots.
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherClient {
    /// Creates a client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Overrides the API root (test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::from_request(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::from_status(SERVICE, status));
        }

        response.json().await.map_err(|e| ClientError::InvalidResponse {
            service: SERVICE,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn current(&self, lat: f64, lon: f64) -> Result<WeatherSample> {
        let current: CurrentConditions = self
            .get_json(format!(
                "{}/weather?lat={lat}&lon={lon}&appid={}&units=metric",
                self.base_url, self.api_key
            ))
            .await?;

        let forecast: Forecast = self
            .get_json(format!(
                "{}/forecast?lat={lat}&lon={lon}&appid={}&units=metric&cnt={FORECAST_SLOTS}",
                self.base_url, self.api_key
            ))
            .await?;

        let sample = build_sample(&current, &forecast);
        debug!(
            wind_kmh = sample.wind_speed_kmh,
            rain_pct = sample.rain_probability_pct,
            "fetched weather sample"
        );
        Ok(sample)
    }
}

/// Combines the two provider responses into one sample.
///
/// The provider reports wind in m/s and probability as a 0–1 fraction; the
/// engine works in km/h and percent.
fn build_sample(current: &CurrentConditions, forecast: &Forecast) -> WeatherSample {
    let wind_speed_kmh = current.wind.speed * 3.6;
    let rain_probability_pct = forecast
        .list
        .iter()
        .take(FORECAST_SLOTS)
        .map(|slot| slot.pop)
        .fold(0.0f64, f64::max)
        * 100.0;
    WeatherSample::now(wind_speed_kmh, rain_probability_pct)
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    wind: Wind,
}

#[derive(Debug, Deserialize)]
struct Wind {
    /// Wind speed in m/s (metric units).
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct Forecast {
    #[serde(default)]
    list: Vec<ForecastSlot>,
}

#[derive(Debug, Deserialize)]
struct ForecastSlot {
    /// Probability of precipitation, 0–1.
    #[serde(default)]
    pop: f64,
}
