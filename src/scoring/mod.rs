//! Commit scoring
//!
//! Six sub-scores are combined into one AI-likelihood score and a verdict
//! band.
//!
//! # Scoring Formula
//!
//! ```text
//! base   = text×0.10 + code×0.50 + structural×0.15
//!        + similarity×0.15 + semantic×0.10 + baseline×0.15
//! score  = base
//!        + velocity bonus   (0.15 above 50 lines/min, 0.09 above 20)
//!        + burst bonus      (0.10)
//!        + amplification    (0.20 if any sub-score ≥ 0.5)
//!        + consensus        (0.25 if ≥ 2 sub-scores ≥ 0.3, else 0.10 if exactly 1)
//! score  = clamp(score, 0, 1), rounded to 2 decimals
//! ```
//!
//! The weights sum to 1.15. The extra 0.15 is deliberate overweighting and
//! is kept as configured.
//!
//! # Bands
//!
//! - below 0.20: Likely Human
//! - below 0.50: Mixed/Uncertain
//! - otherwise: Likely AI-assisted
//!
//! A second threshold set (0.3 / 0.7) exists in older tooling and is not
//! supported.

mod aggregator;

pub use aggregator::{
    AggregateScore, BorderlineBand, ScoreAggregator, ScoringWeights, SignalSet,
};
