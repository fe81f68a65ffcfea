//! Local commit analyzers
//!
//! Every analyzer turns diff text into a [`DetectorResult`](crate::models::DetectorResult)
//! with a score in [0, 1]. None of them do I/O and none of them fail: empty
//! or degenerate input yields a zero score with a fixed "no signal" reason.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────── per scan ────────────────────────────┐
//! │  AuthorBaselines::build(history)     VelocityReport::analyze(win) │
//! │            │                                   │                  │
//! │            ▼                                   ▼                  │
//! │  ┌──────────── per commit, oldest first ─────────────────────┐    │
//! │  │ code_patterns   structural   NearDuplicateIndex  baseline │    │
//! │  └───────────────────────────────────────────────────────────┘    │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stateless analyzers are plain functions. The two stateful ones are
//! scan-scoped values owned by the pipeline: [`NearDuplicateIndex`] (append
//! only, single writer) and [`AuthorBaselines`] (built once, read-only).

pub mod baseline;
pub mod code_patterns;
pub mod lexical;
pub mod near_duplicate;
pub mod structural;
pub mod velocity;

pub use baseline::{AuthorBaselines, AuthorProfile, MIN_BASELINE_COMMITS};
pub use lexical::NamingConvention;
pub use near_duplicate::{NearDuplicateIndex, SimHash, DEFAULT_SIMILARITY_THRESHOLD};
pub use velocity::{VelocityRecord, VelocityReport};
