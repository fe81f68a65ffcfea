//! Core data models for sniff
//!
//! These models flow between the commit backend, the analyzers, the
//! aggregator and the reporters. Everything that reaches a reporter is
//! `Serialize` with stable camelCase field names.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Fixed reasons that mean "this analyzer saw nothing".
///
/// They always come with a zero score, and the aggregator drops them from the
/// rendered explanation.
pub mod reasons {
    pub const DIFF_TOO_SMALL: &str = "Diff too small for structural analysis";
    pub const ORGANIC_STRUCTURE: &str = "Organic structural variation";
    pub const TOO_FEW_TOKENS: &str = "Too little code content for fingerprinting";
    pub const NO_DUPLICATES: &str = "No near-duplicate commits found";
    pub const WEAK_SIMILARITY: &str = "No strong similarity signals";
    pub const NO_BASELINE: &str = "No baseline available";
    pub const INSUFFICIENT_HISTORY: &str = "Insufficient baseline history";
    pub const CONSISTENT_STYLE: &str = "Style consistent with author baseline";
    pub const IN_BASELINE: &str = "Commit is part of author baseline";
    pub const NO_CODE: &str = "No code added";
    pub const ORGANIC_AST: &str = "Organic AST structural complexity";
    pub const ORGANIC_RAW: &str = "Organic raw complexity";
    pub const EMPTY_MESSAGE: &str = "Empty commit message";
    pub const NO_TEXT_SIGNALS: &str = "No strong text signals";
    pub const MISSING_INPUT: &str = "Missing message or diff";
    pub const TOO_SHORT_SEMANTIC: &str = "Too short for semantic analysis";
    pub const NATURAL_DIVERGENCE: &str = "Natural human-style message-code divergence";
    pub const NO_AI_SIGNALS: &str = "No strong AI signals detected";

    pub const NO_SIGNAL: &[&str] = &[
        "",
        DIFF_TOO_SMALL,
        ORGANIC_STRUCTURE,
        TOO_FEW_TOKENS,
        NO_DUPLICATES,
        WEAK_SIMILARITY,
        NO_BASELINE,
        INSUFFICIENT_HISTORY,
        CONSISTENT_STYLE,
        IN_BASELINE,
        NO_CODE,
        ORGANIC_AST,
        ORGANIC_RAW,
        EMPTY_MESSAGE,
        NO_TEXT_SIGNALS,
        MISSING_INPUT,
        TOO_SHORT_SEMANTIC,
        NATURAL_DIVERGENCE,
        NO_AI_SIGNALS,
    ];

    /// True for the fixed "no signal" reasons.
    pub fn is_no_signal(reason: &str) -> bool {
        NO_SIGNAL.contains(&reason.trim())
    }
}

/// Separator used when an analyzer reports several triggered signals.
pub const REASON_SEPARATOR: &str = "; ";

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// A commit as read from the backend. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Full commit hash
    pub id: String,
    /// Author name
    pub author: String,
    /// Commit time
    pub timestamp: DateTime<Utc>,
    /// Full commit message
    pub message: String,
    /// Added lines only, joined with `\n` in diff order
    pub diff: String,
}

impl Commit {
    pub fn new(
        id: impl Into<String>,
        author: impl Into<String>,
        timestamp: DateTime<Utc>,
        message: impl Into<String>,
        diff: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            timestamp,
            message: message.into(),
            diff: diff.into(),
        }
    }

    /// First 7 characters of the hash.
    pub fn short_id(&self) -> &str {
        self.id.get(..7).unwrap_or(&self.id)
    }

    /// Number of non-blank added lines.
    pub fn lines_added(&self) -> usize {
        self.diff.lines().filter(|l| !l.trim().is_empty()).count()
    }
}

/// Output of every analyzer and collaborator: a score in [0, 1] plus an
/// explanation. Several triggered signals are joined with `"; "`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorResult {
    pub score: f64,
    pub reason: String,
}

impl DetectorResult {
    /// Create a result, clamping the score into [0, 1].
    pub fn new(score: f64, reason: impl Into<String>) -> Self {
        let score = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            score,
            reason: reason.into(),
        }
    }

    /// Zero score with a "no signal" reason.
    pub fn no_signal(reason: impl Into<String>) -> Self {
        Self::new(0.0, reason)
    }

    /// Combine triggered signals. Falls back to `fallback` when none fired.
    pub fn from_reasons(score: f64, reasons: Vec<String>, fallback: &str) -> Self {
        if reasons.is_empty() {
            Self::new(score, fallback)
        } else {
            Self::new(score, reasons.join(REASON_SEPARATOR))
        }
    }

    /// Individual reasons, in the order they were triggered.
    pub fn reasons(&self) -> impl Iterator<Item = &str> {
        self.reason
            .split(REASON_SEPARATOR)
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

impl Default for DetectorResult {
    fn default() -> Self {
        Self::no_signal("")
    }
}

/// Discretized verdict.
///
/// Thresholds: score < 0.20 is human, < 0.50 mixed, otherwise AI-assisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    #[serde(rename = "Likely Human")]
    LikelyHuman,
    #[serde(rename = "Mixed/Uncertain")]
    Mixed,
    #[serde(rename = "Likely AI-assisted")]
    LikelyAi,
}

impl Band {
    pub const HUMAN_BELOW: f64 = 0.20;
    pub const MIXED_BELOW: f64 = 0.50;

    pub fn from_score(score: f64) -> Self {
        match score {
            s if s < Self::HUMAN_BELOW => Band::LikelyHuman,
            s if s < Self::MIXED_BELOW => Band::Mixed,
            _ => Band::LikelyAi,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Band::LikelyHuman => "Likely Human",
            Band::Mixed => "Mixed/Uncertain",
            Band::LikelyAi => "Likely AI-assisted",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw sub-scores behind a verdict.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalBreakdown {
    pub text: f64,
    pub code: f64,
    pub structural: f64,
    pub similarity: f64,
    pub semantic: f64,
    pub baseline: f64,
    pub velocity_lpm: f64,
    pub burst: bool,
}

/// Per-commit result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitVerdict {
    pub commit_id: String,
    pub short_id: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub score: f64,
    pub band: Band,
    pub reasons: Vec<String>,
    /// Score was replaced by the borderline adjudicator
    #[serde(default)]
    pub adjudicated: bool,
    pub signals: SignalBreakdown,
}

/// Leaderboard row for one author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorStats {
    pub author: String,
    pub commits_analyzed: usize,
    pub avg_score: f64,
    #[serde(rename = "highAICommitCount")]
    pub high_ai_commit_count: usize,
}

impl AuthorStats {
    /// Build the per-author leaderboard, highest average first.
    ///
    /// A commit counts as high-AI when its band is `Likely AI-assisted`.
    pub fn leaderboard(verdicts: &[CommitVerdict]) -> Vec<AuthorStats> {
        let mut order: Vec<&str> = Vec::new();
        let mut totals: FxHashMap<&str, (usize, f64, usize)> = FxHashMap::default();

        for v in verdicts {
            let entry = totals.entry(v.author.as_str()).or_insert_with(|| {
                order.push(v.author.as_str());
                (0, 0.0, 0)
            });
            entry.0 += 1;
            entry.1 += v.score;
            if v.band == Band::LikelyAi {
                entry.2 += 1;
            }
        }

        let mut board: Vec<AuthorStats> = order
            .into_iter()
            .filter_map(|author| {
                totals.get(author).map(|(count, sum, high)| AuthorStats {
                    author: author.to_string(),
                    commits_analyzed: *count,
                    avg_score: round_to(sum / *count as f64, 3),
                    high_ai_commit_count: *high,
                })
            })
            .collect();

        board.sort_by(|a, b| {
            b.avg_score
                .partial_cmp(&a.avg_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.author.cmp(&b.author))
        });
        board
    }
}

/// Result of one scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Newest first
    pub commits: Vec<CommitVerdict>,
    /// The scan was stopped early; `commits` holds what finished
    #[serde(default)]
    pub cancelled: bool,
}

impl ScanReport {
    pub fn leaderboard(&self) -> Vec<AuthorStats> {
        AuthorStats::leaderboard(&self.commits)
    }

    /// Mean score over all analyzed commits (0 when empty).
    pub fn mean_score(&self) -> f64 {
        if self.commits.is_empty() {
            return 0.0;
        }
        self.commits.iter().map(|c| c.score).sum::<f64>() / self.commits.len() as f64
    }

    /// Repository-level verdict, anchored towards the worst commits when
    /// AI-assisted commits are dense.
    pub fn summary(&self) -> RepoSummary {
        RepoSummary::of(&self.commits)
    }
}

/// Share of AI-assisted commits above which the overall score follows the
/// top fifth of commits instead of the mean.
const DENSE_AI_SHARE: f64 = 0.15;
/// Share above which the overall score is raised to at least [`DENSE_AI_FLOOR`].
const CRITICAL_AI_SHARE: f64 = 0.25;
const DENSE_AI_FLOOR: f64 = 0.60;

/// Overall verdict for a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSummary {
    pub commits_analyzed: usize,
    pub mean_score: f64,
    pub overall_score: f64,
    pub band: Band,
    #[serde(rename = "highAICommitCount")]
    pub high_ai_commit_count: usize,
    /// The overall score was raised by the density floor
    pub boosted: bool,
}

impl RepoSummary {
    pub fn of(verdicts: &[CommitVerdict]) -> Self {
        if verdicts.is_empty() {
            return Self {
                commits_analyzed: 0,
                mean_score: 0.0,
                overall_score: 0.0,
                band: Band::LikelyHuman,
                high_ai_commit_count: 0,
                boosted: false,
            };
        }

        let n = verdicts.len();
        let mut scores: Vec<f64> = verdicts.iter().map(|v| v.score).collect();
        let mean = scores.iter().sum::<f64>() / n as f64;

        scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let top = &scores[..(n / 5).max(1)];
        let top_mean = top.iter().sum::<f64>() / top.len() as f64;

        let high = verdicts.iter().filter(|v| v.band == Band::LikelyAi).count();
        let density = high as f64 / n as f64;

        let raw = if density >= DENSE_AI_SHARE {
            top_mean
        } else if high > 0 {
            (mean + top_mean) / 2.0
        } else {
            mean
        };
        let overall = if density >= CRITICAL_AI_SHARE {
            raw.max(DENSE_AI_FLOOR)
        } else {
            raw
        };
        let overall_score = round_to(overall, 2);

        Self {
            commits_analyzed: n,
            mean_score: round_to(mean, 3),
            overall_score,
            band: Band::from_score(overall_score),
            high_ai_commit_count: high,
            boosted: overall > raw,
        }
    }
}
