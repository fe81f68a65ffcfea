//! Text (terminal) reporter with colors and formatting

use crate::models::{Band, CommitVerdict, RepoSummary, ScanReport};
use anyhow::Result;

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const MIN_TREND_COMMITS: usize = 3;

fn band_color(band: Band) -> &'static str {
    match band {
        Band::LikelyHuman => "\x1b[32m", // Green
        Band::Mixed => "\x1b[33m",       // Yellow
        Band::LikelyAi => "\x1b[31m",    // Red
    }
}

/// Render per-commit verdicts as a table, followed by the trend and verdict
pub fn render_scan(report: &ScanReport) -> Result<String> {
    let mut out = String::new();

    out.push_str(&format!("\n{BOLD}AI-Likelihood Scan{RESET}\n"));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&commit_table(&report.commits));
    if report.cancelled {
        out.push_str(&format!(
            "{DIM}Scan cancelled, showing {} finished commits.{RESET}\n\n",
            report.commits.len()
        ));
    }
    out.push_str(&trend(&report.commits));
    out.push_str(&verdict(&report.summary()));
    Ok(out)
}

/// Render the author leaderboard
pub fn render_stats(report: &ScanReport, repo_name: &str) -> Result<String> {
    let mut out = String::new();

    out.push_str(&format!("\n{BOLD}AI Usage Leaderboard: {repo_name}{RESET}\n"));
    out.push_str(&format!(
        "{DIM}  #   AUTHOR                    COMMITS   AVG SCORE   HIGH-AI{RESET}\n"
    ));
    out.push_str(&format!(
        "{DIM}  ────────────────────────────────────────────────────────────{RESET}\n"
    ));

    for (i, row) in report.leaderboard().iter().enumerate() {
        let color = band_color(Band::from_score(row.avg_score));
        let high = if row.high_ai_commit_count > 0 {
            row.high_ai_commit_count.to_string()
        } else {
            format!("{DIM}0{RESET}")
        };
        out.push_str(&format!(
            "  {DIM}{:>3}{RESET}  {:<24}  {:>7}   {color}{:>9.2}{RESET}   {:>7}\n",
            i + 1,
            truncate(&row.author, 24),
            row.commits_analyzed,
            row.avg_score,
            high
        ));
    }
    out.push('\n');

    out.push_str(&trend(&report.commits));
    out.push_str(&verdict(&report.summary()));
    Ok(out)
}

pub fn render_error(message: &str) -> String {
    format!("\x1b[31m{BOLD}Error{RESET}: {message}")
}

fn commit_table(commits: &[CommitVerdict]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{DIM}  COMMIT    AUTHOR            SCORE                         REASONS{RESET}\n"
    ));
    out.push_str(&format!(
        "{DIM}  ─────────────────────────────────────────────────────────────────────────{RESET}\n"
    ));

    for c in commits {
        let color = band_color(c.band);
        let score = format!("{:.2} ({})", c.score, c.band);
        let mut reasons = c.reasons.iter();
        let first = reasons.next().map(String::as_str).unwrap_or("");
        out.push_str(&format!(
            "  {:<8}  {:<16}  {color}{:<28}{RESET}  • {}\n",
            c.short_id,
            truncate(&c.author, 16),
            score,
            first
        ));
        for reason in reasons {
            out.push_str(&format!("  {:<8}  {:<16}  {:<28}  • {}\n", "", "", "", reason));
        }
    }
    out.push('\n');
    out
}

/// Scores oldest to newest as a one-line sparkline.
fn trend(commits: &[CommitVerdict]) -> String {
    if commits.len() < MIN_TREND_COMMITS {
        return format!(
            "{DIM}Not enough commits to draw a trend (need at least {MIN_TREND_COMMITS}).{RESET}\n\n"
        );
    }
    let line: String = commits.iter().rev().map(|c| spark(c.score)).collect();
    format!("{BOLD}AI usage trend{RESET} {DIM}(oldest → newest){RESET}\n  {line}\n\n")
}

fn spark(score: f64) -> char {
    let idx = (score.clamp(0.0, 1.0) * (SPARK.len() - 1) as f64).round() as usize;
    SPARK[idx.min(SPARK.len() - 1)]
}

fn verdict(summary: &RepoSummary) -> String {
    if summary.commits_analyzed == 0 {
        return String::new();
    }
    let color = band_color(summary.band);
    let (label, advice) = match summary.band {
        Band::LikelyAi => (
            "LIKELY AI-ASSISTED",
            "High AI dependency detected. Manual code review recommended.",
        ),
        Band::Mixed => (
            "MIXED, PARTIALLY AI-ASSISTED",
            "Moderate AI usage signals. Some commits warrant closer review.",
        ),
        Band::LikelyHuman => (
            "LIKELY HUMAN-WRITTEN",
            "Low AI usage signals across the analyzed commits.",
        ),
    };

    let mut out = format!("{color}{BOLD}VERDICT: {label}{RESET}\n");
    out.push_str(&format!(
        "  Overall AI-likelihood : {color}{:.0}%{RESET}",
        summary.overall_score * 100.0
    ));
    if summary.boosted {
        out.push_str(&format!(
            " {DIM}(raised from mean {:.0}% by AI-commit density){RESET}",
            summary.mean_score * 100.0
        ));
    }
    out.push('\n');
    out.push_str(&format!(
        "  Commits analyzed      : {}\n",
        summary.commits_analyzed
    ));
    out.push_str(&format!(
        "  Likely AI-assisted    : {}\n",
        summary.high_ai_commit_count
    ));
    out.push_str(&format!("  {DIM}{advice}{RESET}\n"));
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{head}...")
}
