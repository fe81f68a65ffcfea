//! Commit scan pipeline
//!
//! Orchestrates one scan:
//! 1. Fetch the scan window from the commit source
//! 2. Fetch a larger history sample and build author baselines
//! 3. Compute velocity and burst flags for the window
//! 4. Analyze the window oldest first and aggregate every commit
//! 5. Consult the borderline adjudicator where configured
//!
//! The near-duplicate index and the baselines live exactly as long as one
//! call to [`Scanner::scan`].

use crate::detectors::{
    code_patterns, structural, AuthorBaselines, NearDuplicateIndex, VelocityReport,
    DEFAULT_SIMILARITY_THRESHOLD,
};
use crate::git::{CommitSource, GitError};
use crate::models::{Commit, CommitVerdict, ScanReport};
use crate::scoring::{BorderlineBand, ScoreAggregator, ScoringWeights, SignalSet};
use crate::signals::Collaborators;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Scan-level failures. Everything else degrades to a zero signal.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Backend(#[from] GitError),

    #[error("No commits found to analyze")]
    NoCommits,
}

pub type ScanResult<T> = Result<T, ScanError>;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Commits in the scan window
    pub count: usize,
    /// History sample is `count × history_multiplier` ...
    pub history_multiplier: usize,
    /// ... but never fewer than this
    pub min_history: usize,
    pub similarity_threshold: f64,
    pub weights: ScoringWeights,
    pub borderline: BorderlineBand,
    /// Allow the borderline adjudicator to override scores
    pub adjudicate: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            count: 10,
            history_multiplier: 3,
            min_history: 60,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            weights: ScoringWeights::default(),
            borderline: BorderlineBand::default(),
            adjudicate: true,
        }
    }
}

impl ScanOptions {
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn history_size(&self) -> usize {
        self.count
            .saturating_mul(self.history_multiplier)
            .max(self.min_history)
    }
}

/// Cooperative cancellation, checked between commits.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

type ProgressFn = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Runs scans over a commit source.
pub struct Scanner<S> {
    source: S,
    options: ScanOptions,
    collaborators: Collaborators,
    aggregator: ScoreAggregator,
    cancel: CancelToken,
    progress: Option<ProgressFn>,
}

impl<S: CommitSource> Scanner<S> {
    pub fn new(source: S, options: ScanOptions) -> Self {
        let aggregator = ScoreAggregator::new(options.weights.clone());
        Self {
            source,
            options,
            collaborators: Collaborators::default(),
            aggregator,
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Called with `(done, total)` after every analyzed commit.
    pub fn on_progress(mut self, f: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Scan the window. Verdicts come back newest first.
    pub fn scan(&self) -> ScanResult<ScanReport> {
        let window = self.source.fetch_commits(self.options.count)?;
        if window.is_empty() {
            return Err(ScanError::NoCommits);
        }

        let history_size = self.options.history_size();
        let history = self.source.fetch_extended_history(history_size)?;
        let baselines = AuthorBaselines::build(&history);
        info!(
            "Scanning {} commits ({} history commits, {} author baselines)",
            window.len(),
            history.len(),
            baselines.len()
        );

        let velocity = VelocityReport::analyze(&window);
        let mut index = NearDuplicateIndex::new(self.options.similarity_threshold);

        let total = window.len();
        let mut verdicts = Vec::with_capacity(total);
        let mut cancelled = false;

        for commit in window.iter().rev() {
            if self.cancel.is_cancelled() {
                warn!(
                    "Scan cancelled after {} of {} commits",
                    verdicts.len(),
                    total
                );
                cancelled = true;
                break;
            }

            verdicts.push(self.analyze_commit(commit, &baselines, &velocity, &mut index));

            if let Some(progress) = &self.progress {
                progress(verdicts.len(), total);
            }
        }

        verdicts.reverse();
        Ok(ScanReport {
            commits: verdicts,
            cancelled,
        })
    }

    fn analyze_commit(
        &self,
        commit: &Commit,
        baselines: &AuthorBaselines,
        velocity: &VelocityReport,
        index: &mut NearDuplicateIndex,
    ) -> CommitVerdict {
        let diff_lines = commit.lines_added();
        let signals = SignalSet {
            text: self.collaborators.text(&commit.message, diff_lines),
            code: code_patterns::analyze(&commit.diff),
            structural: structural::analyze(&commit.diff),
            similarity: index.analyze(&commit.id, &commit.author, &commit.diff),
            semantic: self.collaborators.semantic(&commit.message, &commit.diff),
            baseline: baselines.deviation(commit),
        };

        let record = velocity.get(&commit.id);
        let mut outcome = self
            .aggregator
            .compute(&signals, record.velocity_lpm, record.burst);

        if self.options.adjudicate
            && self.collaborators.has_adjudicator()
            && self.options.borderline.contains(outcome.score)
        {
            debug!(
                "{} is borderline ({:.2}), asking adjudicator",
                commit.short_id(),
                outcome.score
            );
            let answer = self.collaborators.adjudicate(&commit.diff, &commit.message);
            outcome = outcome.adjudicate(answer);
        }

        debug!(
            "{} by {}: {:.2} ({})",
            commit.short_id(),
            commit.author,
            outcome.score,
            outcome.band
        );

        CommitVerdict {
            commit_id: commit.id.clone(),
            short_id: commit.short_id().to_string(),
            author: commit.author.clone(),
            timestamp: commit.timestamp,
            score: outcome.score,
            band: outcome.band,
            reasons: outcome.reasons,
            adjudicated: outcome.adjudicated,
            signals: signals.breakdown(record.velocity_lpm, record.burst),
        }
    }
}
