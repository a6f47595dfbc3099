//! Shared mocks for the runtime tests.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sitepulse_clients::{ClientError, ProjectApi, Result as ClientResult, SiteAnalyst, WeatherApi};
use sitepulse_dispatch::{DispatchError, Transport};
use sitepulse_models::{WeatherSample, WorkPackage};

fn outage(service: &'static str) -> ClientError {
    ClientError::ServiceUnavailable {
        service,
        reason: "simulated outage".to_string(),
    }
}

/// Weather collaborator returning a fixed sample, or failing every call.
pub(crate) struct MockWeather {
    sample: Option<WeatherSample>,
}

impl MockWeather {
    pub(crate) fn fixed(sample: WeatherSample) -> Self {
        Self {
            sample: Some(sample),
        }
    }

    pub(crate) fn failing() -> Self {
        Self { sample: None }
    }
}

#[async_trait]
impl WeatherApi for MockWeather {
    async fn current(&self, _lat: f64, _lon: f64) -> ClientResult<WeatherSample> {
        self.sample.ok_or_else(|| outage("weather"))
    }
}

/// Project collaborator returning one in-progress package.
pub(crate) struct MockProject;

#[async_trait]
impl ProjectApi for MockProject {
    async fn in_progress_work_packages(&self) -> ClientResult<Vec<WorkPackage>> {
        Ok(vec![WorkPackage {
            id: 12,
            subject: "Formwork level 4".to_string(),
            status: "in progress".to_string(),
            start_date: None,
            due_date: None,
        }])
    }
}

/// AI collaborator answering canned text, or failing every call.
pub(crate) struct MockAnalyst {
    available: bool,
}

impl MockAnalyst {
    pub(crate) fn ok() -> Self {
        Self { available: true }
    }

    pub(crate) fn failing() -> Self {
        Self { available: false }
    }
}

#[async_trait]
impl SiteAnalyst for MockAnalyst {
    async fn summarize(&self, _text: &str) -> ClientResult<String> {
        if self.available {
            Ok("summary".to_string())
        } else {
            Err(outage("ai"))
        }
    }

    async fn analyze_image(&self, _image: &[u8], _caption: Option<&str>) -> ClientResult<String> {
        if self.available {
            Ok("photo analysis".to_string())
        } else {
            Err(outage("ai"))
        }
    }

    async fn safety_tip(&self) -> ClientResult<String> {
        if self.available {
            Ok("🦺 wear your harness".to_string())
        } else {
            Err(outage("ai"))
        }
    }
}

/// Transport that records every delivery.
pub(crate) struct RecordingTransport {
    texts: Mutex<Vec<(i64, String)>>,
    files: Mutex<Vec<(i64, String)>>,
}

impl RecordingTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            texts: Mutex::new(Vec::new()),
            files: Mutex::new(Vec::new()),
        })
    }

    /// Delivered text bodies, in order.
    pub(crate) fn texts(&self) -> Vec<String> {
        self.texts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    /// Delivered file captions, in order.
    pub(crate) fn file_captions(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .map(|(_, caption)| caption.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DispatchError> {
        self.texts.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }

    async fn send_file(
        &self,
        chat_id: i64,
        _path: &Path,
        caption: &str,
    ) -> Result<(), DispatchError> {
        self.files
            .lock()
            .unwrap()
            .push((chat_id, caption.to_string()));
        Ok(())
    }
}
