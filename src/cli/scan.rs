//! Scan and stats commands

use crate::ai::LlmAdjudicator;
use crate::config::{load_project_config, ProjectConfig, UserConfig};
use crate::git::GitHistory;
use crate::pipeline::Scanner;
use crate::reporters::{self, OutputFormat};
use crate::signals::Collaborators;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// What to print once the scan is done
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Commits,
    Leaderboard,
}

pub fn run(
    path: &Path,
    view: View,
    count: Option<usize>,
    format: OutputFormat,
    no_llm: bool,
) -> Result<()> {
    let history = match GitHistory::open(path) {
        Ok(history) => history,
        Err(e) => return fail(e.into(), format),
    };
    let repo_root = history.repo_root().unwrap_or(path).to_path_buf();
    let config = load_project_config(&repo_root);

    let default_count = match view {
        View::Commits => config.scan.count,
        View::Leaderboard => config.scan.stats_count,
    };
    let mut options = config.scan_options(count.unwrap_or(default_count).max(1));
    if no_llm {
        options.adjudicate = false;
    }

    let collaborators = collaborators(&config, options.adjudicate);
    let total = options.count;

    let progress = (format == OutputFormat::Text).then(|| {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(bar_style());
        bar.set_message("Sniffing commits...");
        bar
    });

    let mut scanner = Scanner::new(history, options).with_collaborators(collaborators);
    if let Some(bar) = progress.clone() {
        scanner = scanner.on_progress(move |done, total| {
            bar.set_length(total as u64);
            bar.set_position(done as u64);
        });
    }

    let result = scanner.scan();
    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }

    let report = match result {
        Ok(report) => report,
        Err(e) => return fail(e.into(), format),
    };
    info!("Scored {} commits, rendering {}", report.commits.len(), format);

    let output = match view {
        View::Commits => reporters::render_scan(&report, format)?,
        View::Leaderboard => {
            let repo_name = repo_root
                .canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_else(|| "repository".to_string());
            reporters::render_stats(&report, &repo_name, format)?
        }
    };
    print_output(&output, format);
    Ok(())
}

/// Text and semantic signals from config; the adjudicator only when enabled
/// and a backend can be reached.
fn collaborators(config: &ProjectConfig, adjudicate: bool) -> Collaborators {
    let collaborators = Collaborators::default()
        .with_timeout(config.signals.timeout())
        .with_adjudicator_timeout(config.adjudicator.timeout());
    if !adjudicate {
        return collaborators;
    }

    let adjudicator = UserConfig::load()
        .context("Failed to load user config")
        .and_then(|user| {
            user.ai_config(
                config.adjudicator.backend.as_deref(),
                config.adjudicator.model.as_deref(),
            )
            .map_err(anyhow::Error::from)
        })
        .and_then(|mut ai| {
            ai.timeout = config.adjudicator.timeout();
            LlmAdjudicator::detect(ai).map_err(anyhow::Error::from)
        });

    match adjudicator {
        Ok(adjudicator) => collaborators.with_adjudicator(Arc::new(adjudicator)),
        Err(e) => {
            warn!("LLM tie-breaker disabled: {:#}", e);
            collaborators
        }
    }
}

/// Report a scan-level failure and exit non-zero.
///
/// JSON errors go to stdout so scripts always get a parseable document.
fn fail(err: anyhow::Error, format: OutputFormat) -> ! {
    let rendered = reporters::render_error(&err.to_string(), format);
    match format {
        OutputFormat::Json => println!("{rendered}"),
        OutputFormat::Text if console::colors_enabled_stderr() => eprintln!("{rendered}"),
        OutputFormat::Text => eprintln!("{}", console::strip_ansi_codes(&rendered)),
    }
    std::process::exit(1);
}

fn print_output(output: &str, format: OutputFormat) {
    if format == OutputFormat::Text && !console::colors_enabled() {
        println!("{}", console::strip_ansi_codes(output));
    } else {
        println!("{output}");
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|s| s.progress_chars("█▓▒░  "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}
