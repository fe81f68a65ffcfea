//! Near-duplicate commit detection
//!
//! Assistants reproduce the same scaffolding across commits and across
//! authors. Each diff is reduced to a 64-bit SimHash over its identifier
//! tokens; near-identical token multisets land within a small Hamming
//! distance of each other.
//!
//! The index lives for exactly one scan. It is append-only and a diff is
//! never compared against itself.

use crate::detectors::lexical::code_tokens;
use crate::models::{reasons, DetectorResult};
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.82;
const MIN_TOKENS: usize = 10;
const BITS: usize = 64;

/// Weighted-majority SimHash fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimHash(pub u64);

impl SimHash {
    /// Fingerprint a token sequence. Order does not matter, multiplicity does.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut counters = [0i64; BITS];
        for token in tokens {
            let h = xxh3_64(token.as_ref().as_bytes());
            for (bit, counter) in counters.iter_mut().enumerate() {
                if (h >> bit) & 1 == 1 {
                    *counter += 1;
                } else {
                    *counter -= 1;
                }
            }
        }

        let mut out = 0u64;
        for (bit, counter) in counters.iter().enumerate() {
            if *counter > 0 {
                out |= 1u64 << bit;
            }
        }
        SimHash(out)
    }

    pub fn hamming_distance(&self, other: &SimHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// 1 - hamming / 64
    pub fn similarity(&self, other: &SimHash) -> f64 {
        1.0 - self.hamming_distance(other) as f64 / BITS as f64
    }
}

/// Fingerprint a diff, or `None` when it has too few tokens to be reliable.
pub fn fingerprint(diff: &str) -> Option<SimHash> {
    let tokens = code_tokens(diff);
    if tokens.len() < MIN_TOKENS {
        return None;
    }
    Some(SimHash::from_tokens(&tokens))
}

#[derive(Debug, Clone)]
struct IndexedDiff {
    commit_id: String,
    author: String,
    hash: SimHash,
}

/// Best earlier match for a diff.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatch {
    pub commit_id: String,
    pub author: String,
    pub similarity: f64,
}

/// Scan-scoped SimHash index.
#[derive(Debug, Clone)]
pub struct NearDuplicateIndex {
    threshold: f64,
    entries: Vec<IndexedDiff>,
}

impl Default for NearDuplicateIndex {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl NearDuplicateIndex {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            entries: Vec::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest-similarity indexed diff at or above the threshold, excluding
    /// `commit_id` itself. Ties go to the earliest inserted entry.
    pub fn best_match(&self, commit_id: &str, hash: SimHash) -> Option<DuplicateMatch> {
        let mut best: Option<(&IndexedDiff, f64)> = None;
        for entry in self.entries.iter().filter(|e| e.commit_id != commit_id) {
            let sim = hash.similarity(&entry.hash);
            if sim < self.threshold {
                continue;
            }
            match best {
                Some((_, s)) if sim <= s => {}
                _ => best = Some((entry, sim)),
            }
        }
        best.map(|(e, sim)| DuplicateMatch {
            commit_id: e.commit_id.clone(),
            author: e.author.clone(),
            similarity: sim,
        })
    }

    fn insert(&mut self, commit_id: &str, author: &str, hash: SimHash) {
        if self.entries.iter().any(|e| e.commit_id == commit_id) {
            return;
        }
        self.entries.push(IndexedDiff {
            commit_id: commit_id.to_string(),
            author: author.to_string(),
            hash,
        });
    }

    /// Compare a diff against everything indexed so far, then index it.
    pub fn analyze(&mut self, commit_id: &str, author: &str, diff: &str) -> DetectorResult {
        let Some(hash) = fingerprint(diff) else {
            return DetectorResult::no_signal(reasons::TOO_FEW_TOKENS);
        };

        let found = self.best_match(commit_id, hash);
        self.insert(commit_id, author, hash);

        let Some(found) = found else {
            return DetectorResult::no_signal(reasons::NO_DUPLICATES);
        };

        debug!(
            "{} best match {} ({:.2})",
            commit_id, found.commit_id, found.similarity
        );
        score_match(author, &found)
    }
}

fn short(id: &str) -> &str {
    id.get(..7).unwrap_or(id)
}

fn score_match(author: &str, found: &DuplicateMatch) -> DetectorResult {
    let sim = found.similarity;
    let pct = (sim * 100.0) as u32;
    let other = short(&found.commit_id);

    let (mut score, mut reason) = if sim >= 0.92 {
        (
            0.8,
            format!(
                "Near-identical code to commit {other} by {} ({pct}% token similarity)",
                found.author
            ),
        )
    } else if sim >= 0.85 {
        (
            0.5,
            format!(
                "High code similarity to {other} by {} ({pct}% match), possible template reuse",
                found.author
            ),
        )
    } else if sim >= 0.80 {
        (
            0.25,
            format!("Moderate code similarity to {other} ({pct}% match)"),
        )
    } else {
        return DetectorResult::no_signal(reasons::WEAK_SIMILARITY);
    };

    if found.author != author && sim >= 0.85 {
        score += 0.2;
        reason.push_str(" [cross-author]");
    }

    DetectorResult::new(f64::min(score, 1.0), reason)
}
