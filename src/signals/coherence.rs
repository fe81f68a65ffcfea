//! Lexical message/code coherence
//!
//! People write commit messages from intent; assistants summarize the code
//! they just produced, so their messages reuse the diff's own vocabulary.
//! This measures that overlap as a term-frequency cosine over identifier
//! sub-words. An embedding model can replace it through
//! [`SemanticCoherence`].

use crate::detectors::lexical::{code_tokens, raw_tokens, split_identifier};
use crate::models::{reasons, DetectorResult};
use crate::signals::{SemanticCoherence, SignalResult};
use rustc_hash::FxHashMap;

const MIN_MESSAGE_WORDS: usize = 4;
const MIN_DIFF_TOKENS: usize = 8;
const MAX_DIFF_TOKENS: usize = 200;
const MIN_TERM_LEN: usize = 3;

/// Default offline coherence signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalCoherence;

impl SemanticCoherence for LexicalCoherence {
    fn name(&self) -> &str {
        "lexical-coherence"
    }

    fn score(&self, message: &str, diff: &str) -> SignalResult<DetectorResult> {
        Ok(analyze(message, diff))
    }
}

fn term_frequencies<'a, I>(tokens: I) -> FxHashMap<String, f64>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tf: FxHashMap<String, f64> = FxHashMap::default();
    for token in tokens {
        for word in split_identifier(token) {
            if word.chars().count() >= MIN_TERM_LEN {
                *tf.entry(word).or_insert(0.0) += 1.0;
            }
        }
    }
    tf
}

/// Cosine similarity of two sparse vectors; 0 if either is empty.
pub fn cosine(a: &FxHashMap<String, f64>, b: &FxHashMap<String, f64>) -> f64 {
    let dot: f64 = a
        .iter()
        .filter_map(|(k, va)| b.get(k).map(|vb| va * vb))
        .sum();
    let norm_a = a.values().map(|v| v * v).sum::<f64>().sqrt();
    let norm_b = b.values().map(|v| v * v).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

pub fn analyze(message: &str, diff: &str) -> DetectorResult {
    if message.trim().is_empty() || diff.trim().is_empty() {
        return DetectorResult::no_signal(reasons::MISSING_INPUT);
    }

    let tokens = code_tokens(diff);
    if message.split_whitespace().count() < MIN_MESSAGE_WORDS || tokens.len() < MIN_DIFF_TOKENS {
        return DetectorResult::no_signal(reasons::TOO_SHORT_SEMANTIC);
    }

    let message_tf = term_frequencies(raw_tokens(message));
    let diff_tf = term_frequencies(tokens.iter().take(MAX_DIFF_TOKENS).map(String::as_str));
    let similarity = cosine(&message_tf, &diff_tf);

    if similarity > 0.60 {
        DetectorResult::new(
            0.8,
            format!(
                "Very high message-code coherence ({similarity:.2}), self-summarization pattern"
            ),
        )
    } else if similarity > 0.45 {
        DetectorResult::new(
            0.5,
            format!("High message-code alignment ({similarity:.2}), possible AI narration"),
        )
    } else if similarity > 0.35 {
        DetectorResult::new(0.25, format!("Moderate message-code alignment ({similarity:.2})"))
    } else {
        DetectorResult::no_signal(reasons::NATURAL_DIVERGENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIFF: &str = "def load_user_profile(database):\n    cache = database.load_user_profile_cache()\n    return cache";

    #[test]
    fn test_missing_input() {
        assert_eq!(analyze("", DIFF).reason, reasons::MISSING_INPUT);
        assert_eq!(analyze("some message here ok", "  ").reason, reasons::MISSING_INPUT);
    }

    #[test]
    fn test_too_short() {
        let r = analyze("fix bug", DIFF);
        assert_eq!(r.score, 0.0);
        assert_eq!(r.reason, reasons::TOO_SHORT_SEMANTIC);
        assert_eq!(
            analyze("a long enough message", "x = y").reason,
            reasons::TOO_SHORT_SEMANTIC
        );
    }

    #[test]
    fn test_message_restating_code() {
        let r = analyze("Load user profile cache from database", DIFF);
        assert!((r.score - 0.8).abs() < 1e-9, "{r:?}");
    }

    #[test]
    fn test_divergent_message() {
        let r = analyze("quick fix before the demo tomorrow morning", DIFF);
        assert_eq!(r.score, 0.0);
        assert_eq!(r.reason, reasons::NATURAL_DIVERGENCE);
    }

    #[test]
    fn test_cosine_edges() {
        let empty = FxHashMap::default();
        let mut one = FxHashMap::default();
        one.insert("load".to_string(), 2.0);
        assert_eq!(cosine(&empty, &one), 0.0);
        assert!((cosine(&one, &one) - 1.0).abs() < 1e-12);
    }
}
