//! Rule-based commit message analysis
//!
//! Flags phrasing patterns that assistants produce and people rarely do:
//! conventional-commit prefixes, flawless capitalization, template
//! openers, markdown bullet lists, and message length that does not match
//! the size of the diff.

use crate::models::{reasons, DetectorResult};
use crate::signals::{SignalResult, TextNaturalness};
use regex::Regex;
use std::sync::OnceLock;

static CONVENTIONAL_RE: OnceLock<Regex> = OnceLock::new();

fn conventional_re() -> &'static Regex {
    CONVENTIONAL_RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(feat|fix|chore|refactor|style|docs|test|build|ci|perf|revert)(\([a-z\-]+\))?!?:\s",
        )
        .expect("valid regex")
    })
}

/// Only suspicious in long messages or alongside large diffs.
const TEMPLATE_PHRASES: &[&str] = &[
    "this commit introduces",
    "the following changes were made",
    "this pr adds",
    "this pull request",
    "as part of this change",
    "this change implements",
    "to ensure",
    "in order to",
    "the purpose of this",
];

const INFORMAL_MARKERS: &[&str] = &[
    "dont", "cant", "wont", "gonna", "lol", "tbh", "imo", "nvm", "btw", "!!!", "???", "hmm",
    "oops", "wtf", "asap",
];

/// Count traces of casual human writing: slang, shouting punctuation and a
/// lowercase first letter.
pub fn informal_markers(text: &str) -> usize {
    let lower = text.to_lowercase();
    let mut hits = lower
        .split_whitespace()
        .filter(|w| INFORMAL_MARKERS.contains(w))
        .count();
    if text.chars().next().is_some_and(|c| c.is_lowercase()) {
        hits += 1;
    }
    hits
}

/// Default offline text signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedText;

impl TextNaturalness for RuleBasedText {
    fn name(&self) -> &str {
        "rule-based-text"
    }

    fn score(&self, message: &str, diff_lines: usize) -> SignalResult<DetectorResult> {
        Ok(analyze(message, diff_lines))
    }
}

/// Score a commit message. `diff_lines` is the non-blank added line count.
pub fn analyze(message: &str, diff_lines: usize) -> DetectorResult {
    let text = message.trim();
    if text.chars().count() < 2 {
        return DetectorResult::no_signal(reasons::EMPTY_MESSAGE);
    }

    let mut score = 0.0;
    let mut found = Vec::new();
    let word_count = text.split_whitespace().count();
    let lower = text.to_lowercase();

    if conventional_re().is_match(text) {
        score += 0.5;
        found.push("Conventional commit format (CI tooling or AI assistant)".to_string());
    }

    let title = text.lines().next().unwrap_or_default();
    let is_perfect = title.chars().next().is_some_and(|c| c.is_uppercase())
        && title.ends_with('.')
        && informal_markers(text) == 0;
    if is_perfect && word_count > 4 {
        score += 0.25;
        found.push("Overly perfect grammar with zero informal markers".to_string());
    }

    if word_count <= 2 {
        score += 0.3;
        found.push(format!(
            "Extremely terse message ({word_count} words), boilerplate style"
        ));
    }

    if diff_lines > 50 || word_count > 20 {
        if let Some(phrase) = TEMPLATE_PHRASES.iter().find(|p| lower.contains(*p)) {
            score += 0.4;
            found.push(format!("AI template phrasing detected: '{phrase}'"));
        }
    }

    if diff_lines > 0 {
        if word_count > 50 && diff_lines < 10 {
            score += 0.35;
            found.push(format!(
                "Long commit message ({word_count} words) for tiny diff ({diff_lines} lines)"
            ));
        }
        if word_count < 5 && diff_lines > 100 {
            score += 0.3;
            found.push(format!(
                "Tiny message ({word_count} words) for large diff ({diff_lines} lines)"
            ));
        }
    }

    if message.matches("\n- ").count() >= 2 || message.matches("\n* ").count() >= 2 {
        score += 0.2;
        found.push("Markdown-style bullet list in commit message".to_string());
    }

    DetectorResult::from_reasons(f64::min(score, 1.0), found, reasons::NO_TEXT_SIGNALS)
}
