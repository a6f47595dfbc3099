//! Rendering seam.
//!
//! The renderer is an external collaborator with a narrow interface: it
//! takes a finished [`ReportRecord`] and produces a document file. The
//! built-in implementation writes a self-contained HTML page; richer
//! layouts (PDF pipelines) plug in behind the same trait.

use std::fs;
use std::path::PathBuf;

use sitepulse_models::{LogKind, ReportRecord};

use crate::error::{ReportError, Result};

/// Produces a document file from a compiled report.
pub trait ReportRenderer: Send + Sync {
    /// Renders `record` and returns the written file's path.
    fn render(&self, record: &ReportRecord) -> Result<PathBuf>;
}

/// Minimal HTML renderer.
///
/// Reports land under `output_dir/<YYYY-MM-DD>/Site_Report_<serial>.html`.
pub struct HtmlRenderer {
    output_dir: PathBuf,
}

impl HtmlRenderer {
    /// Creates a renderer writing below `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl ReportRenderer for HtmlRenderer {
    fn render(&self, record: &ReportRecord) -> Result<PathBuf> {
        let day = record.period_start.date_naive();
        let dir = self.output_dir.join(day.to_string());
        fs::create_dir_all(&dir).map_err(|e| ReportError::Render(e.to_string()))?;

        let path = dir.join(format!("Site_Report_{}.html", record.report_id));
        fs::write(&path, render_html(record)).map_err(|e| ReportError::Render(e.to_string()))?;
        Ok(path)
    }
}

fn render_html(record: &ReportRecord) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\">");
    html.push_str(&format!(
        "<title>Site Report {}</title></head>\n<body>\n",
        escape(record.report_id.as_str())
    ));
    html.push_str(&format!(
        "<h1>Site Report {} — {}</h1>\n",
        escape(record.report_id.as_str()),
        escape(record.site_id.as_str())
    ));
    html.push_str(&format!(
        "<p>Period: {} to {}</p>\n",
        record.period_start, record.period_end
    ));

    html.push_str("<h2>Weather</h2>\n");
    match &record.weather_summary {
        Some(sample) => html.push_str(&format!(
            "<p>Wind {:.1} km/h, rain probability {:.0}%</p>\n",
            sample.wind_speed_kmh, sample.rain_probability_pct
        )),
        None => html.push_str("<p>unavailable</p>\n"),
    }

    html.push_str("<h2>Work in progress</h2>\n<ul>\n");
    for package in &record.project_status_snapshot.in_progress {
        let due = package
            .due_date
            .map(|d| format!(" (due {d})"))
            .unwrap_or_default();
        html.push_str(&format!(
            "<li>#{} {}{}</li>\n",
            package.id,
            escape(&package.subject),
            due
        ));
    }
    html.push_str("</ul>\n");

    html.push_str("<h2>Site log</h2>\n<ul>\n");
    for entry in &record.aggregated_logs {
        let body = match entry.kind {
            LogKind::Text => escape(&entry.payload),
            LogKind::Photo => format!(
                "[photo]{}",
                entry
                    .caption
                    .as_deref()
                    .map(|c| format!(" {}", escape(c)))
                    .unwrap_or_default()
            ),
        };
        html.push_str(&format!(
            "<li>{} — {}: {}</li>\n",
            entry.timestamp.format("%H:%M"),
            escape(&entry.author_name),
            body
        ));
    }
    html.push_str("</ul>\n");

    html.push_str("<h2>AI insights</h2>\n");
    html.push_str(&format!("<p>{}</p>\n", escape(&record.ai_insights.to_string())));

    html.push_str(&format!(
        "<footer>Generated at {}</footer>\n</body>\n</html>\n",
        record.generated_at
    ));
    html
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sitepulse_models::{
        AiInsights, LogEntry, ProjectSnapshot, ReportId, ReportRecord, SiteId,
    };
    use tempfile::tempdir;

    fn sample_record(insights: AiInsights) -> ReportRecord {
        let site = SiteId::new("main");
        ReportRecord {
            report_id: ReportId::from_string("SP-AUG-26-001"),
            site_id: site.clone(),
            period_start: Utc::now(),
            period_end: Utc::now(),
            aggregated_logs: vec![LogEntry::text(site, "1", "foreman", "2 < 3 pours")],
            project_status_snapshot: ProjectSnapshot::new(vec![]),
            weather_summary: None,
            ai_insights: insights,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_renders_file_with_serial() {
        let dir = tempdir().unwrap();
        let renderer = HtmlRenderer::new(dir.path());

        let path = renderer.render(&sample_record(AiInsights::Unavailable)).unwrap();
        assert!(path.exists());

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("SP-AUG-26-001"));
        assert!(html.contains("unavailable"));
    }

    #[test]
    fn test_escapes_log_text() {
        let dir = tempdir().unwrap();
        let renderer = HtmlRenderer::new(dir.path());

        let path = renderer.render(&sample_record(AiInsights::Unavailable)).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("2 &lt; 3 pours"));
    }
}
