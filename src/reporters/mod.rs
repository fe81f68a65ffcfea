//! Output reporters for scan results
//!
//! Supports two output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON with stable camelCase field names

mod json;
mod text;

use crate::models::ScanReport;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: text, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render per-commit verdicts
pub fn render_scan(report: &ScanReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render_scan(report),
        OutputFormat::Json => json::render_scan(report),
    }
}

/// Render the author leaderboard plus the verdicts behind it
pub fn render_stats(report: &ScanReport, repo_name: &str, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render_stats(report, repo_name),
        OutputFormat::Json => json::render_stats(report),
    }
}

/// Render a scan-level failure
pub fn render_error(message: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => text::render_error(message),
        OutputFormat::Json => json::render_error(message),
    }
}
