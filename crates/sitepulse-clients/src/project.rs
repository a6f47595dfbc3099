//! Project-management collaborator.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use sitepulse_models::WorkPackage;

use crate::error::{ClientError, Result};

const SERVICE: &str = "project";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// The project-management collaborator interface.
#[async_trait]
pub trait ProjectApi: Send + Sync {
    /// Returns the work packages currently in progress.
    async fn in_progress_work_packages(&self) -> Result<Vec<WorkPackage>>;
}

/// OpenProject-backed [`ProjectApi`].
///
/// OpenProject authenticates API keys as HTTP basic auth with the fixed
/// user name `apikey`.
#[derive(Clone)]
pub struct OpenProjectClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenProjectClient {
    /// Creates a client for the instance at `base_url`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ProjectApi for OpenProjectClient {
    async fn in_progress_work_packages(&self) -> Result<Vec<WorkPackage>> {
        let url = format!(
            "{}/api/v3/work_packages",
            self.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .get(&url)
            .basic_auth("apikey", Some(&self.api_key))
            .send()
            .await
            .map_err(|e| ClientError::from_request(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::from_status(SERVICE, status));
        }

        let body: WorkPackagesResponse =
            response.json().await.map_err(|e| ClientError::InvalidResponse {
                service: SERVICE,
                reason: e.to_string(),
            })?;

        let packages = filter_in_progress(body);
        debug!(count = packages.len(), "fetched in-progress work packages");
        Ok(packages)
    }
}

/// Keeps only packages whose status title is "in progress".
fn filter_in_progress(body: WorkPackagesResponse) -> Vec<WorkPackage> {
    body.embedded
        .elements
        .into_iter()
        .filter_map(|element| {
            let status = element
                .links
                .status
                .and_then(|s| s.title)
                .unwrap_or_default()
                .to_lowercase();
            if status != "in progress" {
                return None;
            }
            let Some(id) = element.id else {
                warn!("work package without id skipped");
                return None;
            };
            Some(WorkPackage {
                id,
                subject: element.subject.unwrap_or_default(),
                status,
                start_date: element.start_date,
                due_date: element.due_date,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct WorkPackagesResponse {
    #[serde(rename = "_embedded")]
    embedded: Embedded,
}

#[derive(Debug, Deserialize)]
struct Embedded {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
struct Element {
    id: Option<u64>,
    subject: Option<String>,
    #[serde(rename = "startDate")]
    start_date: Option<NaiveDate>,
    #[serde(rename = "dueDate")]
    due_date: Option<NaiveDate>,
    #[serde(rename = "_links", default)]
    links: Links,
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    status: Option<StatusLink>,
}

#[derive(Debug, Deserialize)]
struct StatusLink {
    title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "_embedded": {
            "elements": [
                {
                    "id": 12,
                    "subject": "Formwork level 4",
                    "startDate": "2026-08-01",
                    "dueDate": "2026-08-20",
                    "_links": {"status": {"title": "In progress"}}
                },
                {
                    "id": 13,
                    "subject": "Paint lobby",
                    "_links": {"status": {"title": "Scheduled"}}
                },
                {
                    "subject": "No id",
                    "_links": {"status": {"title": "In progress"}}
                }
            ]
        }
    }"#;

    #[test]
    fn test_filter_keeps_only_in_progress() {
        let body: WorkPackagesResponse = serde_json::from_str(SAMPLE).unwrap();
        let packages = filter_in_progress(body);

        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].id, 12);
        assert_eq!(packages[0].status, "in progress");
        assert_eq!(
            packages[0].due_date,
            NaiveDate::from_ymd_opt(2026, 8, 20)
        );
    }

    #[test]
    fn test_missing_embedded_is_invalid() {
        let result: std::result::Result<WorkPackagesResponse, _> =
            serde_json::from_str(r#"{"total": 0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_package_without_status_dropped() {
        let json = r#"{"_embedded": {"elements": [{"id": 1, "subject": "x", "_links": {}}]}}"#;
        let body: WorkPackagesResponse = serde_json::from_str(json).unwrap();
        assert!(filter_in_progress(body).is_empty());
    }
}
