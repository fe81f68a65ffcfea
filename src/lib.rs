//! sniff - AI-assisted commit detection
//!
//! Scores git commits by how likely they were produced with an AI coding
//! assistant. Local analyzers look at the added lines of each commit, two
//! pluggable collaborators look at the message, and an aggregator turns the
//! six sub-scores into one score, a band and the reasons behind it.
//!
//! ```no_run
//! use sniff::git::GitHistory;
//! use sniff::pipeline::{ScanOptions, Scanner};
//! use std::path::Path;
//!
//! let history = GitHistory::open(Path::new(".")).unwrap();
//! let report = Scanner::new(history, ScanOptions::default()).scan().unwrap();
//! for verdict in &report.commits {
//!     println!("{} {:.2} {}", verdict.short_id, verdict.score, verdict.band);
//! }
//! ```

pub mod ai;
pub mod cli;
pub mod config;
pub mod detectors;
pub mod git;
pub mod models;
pub mod pipeline;
pub mod reporters;
pub mod scoring;
pub mod signals;
