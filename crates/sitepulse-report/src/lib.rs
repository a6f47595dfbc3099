//! Report compilation for Sitepulse.
//!
//! [`ReportCompiler::compile`] runs the staged pipeline that turns a day of
//! silent log accumulation into a [`sitepulse_models::ReportRecord`]: fetch
//! the period's entries, snapshot in-progress project work, grab the latest
//! weather, fan out the AI enrichment calls, assemble, render. Log and
//! project fetches are load-bearing and fail the compilation; weather and
//! AI degrade gracefully.

pub mod compiler;
pub mod error;
pub mod period;
pub mod render;

pub use compiler::{CompiledReport, ReportCompiler};
pub use error::{ReportError, Result};
pub use period::Period;
pub use render::{HtmlRenderer, ReportRenderer};
