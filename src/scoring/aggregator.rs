//! Weighted aggregation with bonuses, amplification and consensus

use crate::ai::DISCLOSURE;
use crate::models::{reasons, round_to, Band, DetectorResult, SignalBreakdown};
use crate::signals::Adjudication;
use serde::{Deserialize, Serialize};

const VELOCITY_WEIGHT: f64 = 0.15;
const BURST_BONUS: f64 = 0.10;
const AMPLIFY_AT: f64 = 0.5;
const AMPLIFY_BONUS: f64 = 0.20;
const SUSPECT_AT: f64 = 0.3;
const CONSENSUS_BONUS: f64 = 0.25;
const SINGLE_SUSPECT_BONUS: f64 = 0.10;

/// Per-engine weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(default = "default_text_weight")]
    pub text: f64,

    /// Code-pattern analysis (the dominant engine)
    #[serde(default = "default_code_weight")]
    pub code: f64,

    #[serde(default = "default_minor_weight")]
    pub structural: f64,

    #[serde(default = "default_minor_weight")]
    pub similarity: f64,

    #[serde(default = "default_text_weight")]
    pub semantic: f64,

    #[serde(default = "default_minor_weight")]
    pub baseline: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            text: default_text_weight(),
            code: default_code_weight(),
            structural: default_minor_weight(),
            similarity: default_minor_weight(),
            semantic: default_text_weight(),
            baseline: default_minor_weight(),
        }
    }
}

fn default_text_weight() -> f64 {
    0.10
}
fn default_code_weight() -> f64 {
    0.50
}
fn default_minor_weight() -> f64 {
    0.15
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.text + self.code + self.structural + self.similarity + self.semantic + self.baseline
    }

    pub fn weighted_sum(&self, signals: &SignalSet) -> f64 {
        signals.text.score * self.text
            + signals.code.score * self.code
            + signals.structural.score * self.structural
            + signals.similarity.score * self.similarity
            + signals.semantic.score * self.semantic
            + signals.baseline.score * self.baseline
    }
}

/// The six sub-results for one commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalSet {
    pub text: DetectorResult,
    pub code: DetectorResult,
    pub structural: DetectorResult,
    pub similarity: DetectorResult,
    pub semantic: DetectorResult,
    pub baseline: DetectorResult,
}

impl SignalSet {
    /// In weight-table order.
    pub fn all(&self) -> [&DetectorResult; 6] {
        [
            &self.text,
            &self.code,
            &self.structural,
            &self.similarity,
            &self.semantic,
            &self.baseline,
        ]
    }

    pub fn breakdown(&self, velocity_lpm: f64, burst: bool) -> SignalBreakdown {
        SignalBreakdown {
            text: round_to(self.text.score, 2),
            code: round_to(self.code.score, 2),
            structural: round_to(self.structural.score, 2),
            similarity: round_to(self.similarity.score, 2),
            semantic: round_to(self.semantic.score, 2),
            baseline: round_to(self.baseline.score, 2),
            velocity_lpm: round_to(velocity_lpm, 2),
            burst,
        }
    }
}

/// Aggregated verdict for one commit.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateScore {
    pub score: f64,
    pub band: Band,
    pub reasons: Vec<String>,
    pub adjudicated: bool,
}

impl AggregateScore {
    /// Apply a second opinion. `NoOpinion` leaves the score untouched.
    pub fn adjudicate(mut self, answer: Adjudication) -> Self {
        if let Adjudication::Verdict { score, reason } = answer {
            self.score = round_to(score.clamp(0.0, 1.0), 2);
            self.band = Band::from_score(self.score);
            if !reason.trim().is_empty() {
                self.reasons.push(reason);
            }
            self.reasons.push(DISCLOSURE.to_string());
            self.adjudicated = true;
        }
        self
    }
}

/// Inclusive score range in which the adjudicator is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorderlineBand {
    pub low: f64,
    pub high: f64,
}

impl Default for BorderlineBand {
    fn default() -> Self {
        Self {
            low: 0.35,
            high: 0.50,
        }
    }
}

impl BorderlineBand {
    pub fn contains(&self, score: f64) -> bool {
        (self.low..=self.high).contains(&score)
    }
}

/// Combines sub-scores into a verdict.
#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    weights: ScoringWeights,
}

impl ScoreAggregator {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn compute(&self, signals: &SignalSet, velocity_lpm: f64, burst: bool) -> AggregateScore {
        let mut score = self.weights.weighted_sum(signals);

        let (velocity_factor, velocity_reason) = velocity_bonus(velocity_lpm);
        score += velocity_factor * VELOCITY_WEIGHT;

        if burst {
            score += BURST_BONUS;
        }

        let scores = signals.all().map(|r| r.score);
        if scores.iter().any(|&s| s >= AMPLIFY_AT) {
            score += AMPLIFY_BONUS;
        }
        match scores.iter().filter(|&&s| s >= SUSPECT_AT).count() {
            0 => {}
            1 => score += SINGLE_SUSPECT_BONUS,
            _ => score += CONSENSUS_BONUS,
        }

        let score = round_to(score.clamp(0.0, 1.0), 2);

        let mut found = collect_reasons(signals);
        found.extend(velocity_reason);
        if burst {
            found.push("Commit-burst: rapid large-diff sequence within 10 min window".to_string());
        }
        if found.is_empty() {
            found.push(reasons::NO_AI_SIGNALS.to_string());
        }

        AggregateScore {
            score,
            band: Band::from_score(score),
            reasons: found,
            adjudicated: false,
        }
    }
}

fn velocity_bonus(velocity_lpm: f64) -> (f64, Option<String>) {
    if velocity_lpm > 50.0 {
        (
            1.0,
            Some(format!(
                "Impossible human typing velocity ({velocity_lpm:.0} Lines/Minute)"
            )),
        )
    } else if velocity_lpm > 20.0 {
        (
            0.6,
            Some(format!(
                "Abnormally high commit velocity ({velocity_lpm:.0} Lines/Minute)"
            )),
        )
    } else {
        (0.0, None)
    }
}

/// Every non-sentinel reason part from sub-results that actually scored.
fn collect_reasons(signals: &SignalSet) -> Vec<String> {
    signals
        .all()
        .into_iter()
        .filter(|r| r.score > 0.0)
        .flat_map(|r| r.reasons())
        .filter(|part| !reasons::is_no_signal(part))
        .map(str::to_string)
        .collect()
}
