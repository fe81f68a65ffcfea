//! JSON reporter
//!
//! `scan` emits `{"commits": [...], "cancelled": bool}`; `stats` adds the
//! leaderboard under `repositoryStats` and the overall verdict under
//! `summary`. Useful for piping to jq or CI gates.

use crate::models::{AuthorStats, CommitVerdict, RepoSummary, ScanReport};
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsOutput<'a> {
    repository_stats: Vec<AuthorStats>,
    summary: RepoSummary,
    commits: &'a [CommitVerdict],
    cancelled: bool,
}

pub fn render_scan(report: &ScanReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn render_stats(report: &ScanReport) -> Result<String> {
    let output = StatsOutput {
        repository_stats: report.leaderboard(),
        summary: report.summary(),
        commits: &report.commits,
        cancelled: report.cancelled,
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

pub fn render_error(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}
