//! CLI command definitions and handlers

mod init;
mod scan;

use crate::reporters::OutputFormat;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sniff - estimate how likely recent commits were written with an AI assistant
///
/// 100% LOCAL unless an LLM backend is configured for borderline commits.
#[derive(Parser, Debug)]
#[command(name = "sniff")]
#[command(
    version,
    about = "Estimate how likely each git commit was produced with an AI coding assistant",
    long_about = "sniff scores recent commits by combining structural regularity, \
near-duplicate fingerprints, per-author style baselines, commit velocity and \
message analysis into one AI-likelihood score with the reasons behind it.\n\n\
Scores are probabilistic estimates, never proof of authorship.\n\n\
Run without a subcommand to scan the current directory:\n  \
sniff .",
    after_help = "\
Examples:
  sniff .                          Scan the last 10 commits
  sniff scan . --count 30          Scan the last 30 commits
  sniff scan . --format json       JSON output for scripting (or --json)
  sniff stats . --no-llm           Author leaderboard, local engines only
  sniff init                       Write an example sniff.toml"
)]
pub struct Cli {
    /// Path to repository (default: current directory)
    #[arg(global = true, default_value = ".")]
    pub path: PathBuf,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write an example sniff.toml and user config
    Init,

    /// Score recent commits
    Scan {
        /// Number of commits to scan (default: 10, or [scan] count)
        #[arg(long, short = 'n')]
        count: Option<usize>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Shorthand for --format json
        #[arg(long)]
        json: bool,

        /// Disable the LLM tie-breaker (pure local engines)
        #[arg(long)]
        no_llm: bool,
    },

    /// Author leaderboard and overall verdict
    Stats {
        /// Number of commits to analyze (default: 50, or [scan] stats_count)
        #[arg(long, short = 'n')]
        count: Option<usize>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Shorthand for --format json
        #[arg(long)]
        json: bool,

        /// Disable the LLM tie-breaker (pure local engines)
        #[arg(long)]
        no_llm: bool,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Init) => init::run(&cli.path),

        Some(Commands::Scan {
            count,
            format,
            json,
            no_llm,
        }) => {
            let format = output_format(&format, json)?;
            scan::run(&cli.path, scan::View::Commits, count, format, no_llm)
        }

        Some(Commands::Stats {
            count,
            format,
            json,
            no_llm,
        }) => {
            let format = output_format(&format, json)?;
            scan::run(&cli.path, scan::View::Leaderboard, count, format, no_llm)
        }

        None => scan::run(&cli.path, scan::View::Commits, None, OutputFormat::Text, false),
    }
}

fn output_format(format: &str, json: bool) -> Result<OutputFormat> {
    if json {
        return Ok(OutputFormat::Json);
    }
    format.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_scan_of_cwd() {
        let cli = Cli::try_parse_from(["sniff"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("."));
        assert_eq!(cli.log_level, "warn");
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_scan_flags() {
        let cli =
            Cli::try_parse_from(["sniff", "scan", "/tmp/repo", "--count", "5", "--json", "--no-llm"])
                .unwrap();
        assert_eq!(cli.path, PathBuf::from("/tmp/repo"));
        match cli.command {
            Some(Commands::Scan {
                count,
                format,
                json,
                no_llm,
            }) => {
                assert_eq!(count, Some(5));
                assert_eq!(output_format(&format, json).unwrap(), OutputFormat::Json);
                assert!(no_llm);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_stats_defaults() {
        let cli = Cli::try_parse_from(["sniff", "stats"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Stats {
                count: None,
                json: false,
                no_llm: false,
                ..
            })
        ));
    }

    #[test]
    fn test_format_flag() {
        let cli = Cli::try_parse_from(["sniff", "stats", "-f", "json"]).unwrap();
        let Some(Commands::Stats { format, json, .. }) = cli.command else {
            panic!("expected stats");
        };
        assert_eq!(output_format(&format, json).unwrap(), OutputFormat::Json);
        assert_eq!(output_format("text", false).unwrap(), OutputFormat::Text);
        assert!(Cli::try_parse_from(["sniff", "scan", "--format", "sarif"]).is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        assert!(Cli::try_parse_from(["sniff", "--log-level", "loud"]).is_err());
    }
}
