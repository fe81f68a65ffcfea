//! Line statistics and token extraction shared by every analyzer
//!
//! All helpers are total: empty input, single-element variance and zero
//! denominators resolve to 0 instead of panicking.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static LINE_COMMENT_RE: OnceLock<Regex> = OnceLock::new();
static BLOCK_COMMENT_RE: OnceLock<Regex> = OnceLock::new();
static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
static IDENTIFIER_RE: OnceLock<Regex> = OnceLock::new();
static CAMEL_HUMP_RE: OnceLock<Regex> = OnceLock::new();
static FUNCTION_START_RE: OnceLock<Regex> = OnceLock::new();

fn line_comment_re() -> &'static Regex {
    LINE_COMMENT_RE.get_or_init(|| Regex::new(r"(?m)(//|#).*$").expect("valid regex"))
}

fn block_comment_re() -> &'static Regex {
    BLOCK_COMMENT_RE.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"))
}

fn token_re() -> &'static Regex {
    TOKEN_RE.get_or_init(|| Regex::new(r"\b[a-zA-Z_][a-zA-Z0-9_]+\b").expect("valid regex"))
}

fn identifier_re() -> &'static Regex {
    IDENTIFIER_RE.get_or_init(|| Regex::new(r"\b[a-zA-Z_][a-zA-Z0-9_]{2,}\b").expect("valid regex"))
}

fn camel_hump_re() -> &'static Regex {
    CAMEL_HUMP_RE.get_or_init(|| Regex::new(r"[a-z][A-Z]").expect("valid regex"))
}

fn function_start_re() -> &'static Regex {
    FUNCTION_START_RE.get_or_init(|| {
        Regex::new(
            r"^(def |async def |function |async function |const \w+ = \(|class |fn |pub fn |pub\(crate\) fn |func )",
        )
        .expect("valid regex")
    })
}

/// Lines that contain something other than whitespace.
pub fn non_blank_lines(text: &str) -> Vec<&str> {
    text.split('\n').filter(|l| !l.trim().is_empty()).collect()
}

/// Character length of every non-blank line.
pub fn line_lengths(text: &str) -> Vec<usize> {
    non_blank_lines(text)
        .iter()
        .map(|l| l.chars().count())
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1). Zero for fewer than two values.
pub fn sample_stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Mean, sample standard deviation and coefficient of variation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Spread {
    pub mean: f64,
    pub stdev: f64,
    pub cv: f64,
}

impl Spread {
    pub fn of(values: &[f64]) -> Self {
        let mean = mean(values);
        let stdev = sample_stdev(values);
        let cv = if mean > 0.0 { stdev / mean } else { 0.0 };
        Self { mean, stdev, cv }
    }
}

pub fn as_f64(values: &[usize]) -> Vec<f64> {
    values.iter().map(|&v| v as f64).collect()
}

/// Value at `floor(len * fraction)` of an ascending-sorted slice.
pub fn percentile(sorted: &[usize], fraction: f64) -> usize {
    if sorted.is_empty() {
        return 0;
    }
    let idx = ((sorted.len() as f64 * fraction) as usize).min(sorted.len() - 1);
    sorted[idx]
}

/// Run lengths of consecutive blank lines that are followed by content.
pub fn blank_line_gaps(text: &str) -> Vec<usize> {
    let mut gaps = Vec::new();
    let mut gap = 0usize;
    for line in text.split('\n') {
        if line.trim().is_empty() {
            gap += 1;
        } else {
            if gap > 0 {
                gaps.push(gap);
            }
            gap = 0;
        }
    }
    gaps
}

/// Remove `//` and `#` line comments and `/* */` block comments.
pub fn strip_comments(text: &str) -> String {
    let without_blocks = block_comment_re().replace_all(text, "");
    line_comment_re()
        .replace_all(&without_blocks, "")
        .into_owned()
}

/// Identifier and keyword tokens (`[A-Za-z_][A-Za-z0-9_]+`) after comment
/// stripping.
pub fn code_tokens(text: &str) -> Vec<String> {
    let stripped = strip_comments(text);
    token_re()
        .find_iter(&stripped)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Tokens of the raw text, comments included.
pub fn raw_tokens(text: &str) -> Vec<&str> {
    token_re().find_iter(text).map(|m| m.as_str()).collect()
}

/// Fraction of non-blank lines that start like a comment.
pub fn comment_ratio(text: &str) -> f64 {
    let lines = non_blank_lines(text);
    if lines.is_empty() {
        return 0.0;
    }
    let comments = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| {
            l.starts_with('#')
                || l.starts_with("//")
                || l.starts_with("/*")
                || l.starts_with('*')
                || l.starts_with("<!--")
        })
        .count();
    comments as f64 / lines.len() as f64
}

/// Dominant identifier naming style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamingConvention {
    #[serde(rename = "snake_case")]
    SnakeCase,
    #[serde(rename = "camelCase")]
    CamelCase,
    #[serde(rename = "mixed")]
    Mixed,
}

impl std::fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NamingConvention::SnakeCase => write!(f, "snake_case"),
            NamingConvention::CamelCase => write!(f, "camelCase"),
            NamingConvention::Mixed => write!(f, "mixed"),
        }
    }
}

fn is_snake(ident: &str) -> bool {
    ident.contains('_')
        && ident.chars().any(|c| c.is_ascii_lowercase())
        && !ident.chars().any(|c| c.is_ascii_uppercase())
}

/// Classify by counting snake_case vs camelCase identifiers (3+ chars).
/// One style must outnumber the other 1.5:1 to win.
pub fn naming_convention(text: &str) -> NamingConvention {
    let mut snake = 0usize;
    let mut camel = 0usize;
    for m in identifier_re().find_iter(text) {
        let ident = m.as_str();
        if is_snake(ident) {
            snake += 1;
        }
        if camel_hump_re().is_match(ident) {
            camel += 1;
        }
    }
    let (snake, camel) = (snake as f64, camel as f64);
    if snake > camel * 1.5 {
        NamingConvention::SnakeCase
    } else if camel > snake * 1.5 {
        NamingConvention::CamelCase
    } else {
        NamingConvention::Mixed
    }
}

/// Rough function sizes: a function runs from a definition line up to the
/// next definition or the end of the diff.
pub fn function_lengths(text: &str) -> Vec<usize> {
    let mut lengths = Vec::new();
    let mut current = 0usize;
    let mut in_function = false;

    for line in text.split('\n') {
        if function_start_re().is_match(line.trim()) {
            if in_function && current > 0 {
                lengths.push(current);
            }
            in_function = true;
            current = 1;
        } else if in_function {
            current += 1;
        }
    }
    if in_function && current > 0 {
        lengths.push(current);
    }
    lengths
}

/// Split an identifier into lower-cased words on `_` and camel humps.
pub fn split_identifier(ident: &str) -> Vec<String> {
    let mut words = Vec::new();
    for part in ident.split('_').filter(|p| !p.is_empty()) {
        let mut current = String::new();
        let mut prev_lower = false;
        for c in part.chars() {
            if c.is_ascii_uppercase() && prev_lower && !current.is_empty() {
                words.push(std::mem::take(&mut current).to_lowercase());
            }
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            current.push(c);
        }
        if !current.is_empty() {
            words.push(current.to_lowercase());
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank_lines() {
        assert_eq!(non_blank_lines("a\n\n  \nb"), vec!["a", "b"]);
        assert!(non_blank_lines("").is_empty());
    }

    #[test]
    fn test_spread_edge_cases() {
        assert_eq!(Spread::of(&[]), Spread::default());
        let one = Spread::of(&[5.0]);
        assert_eq!(one.stdev, 0.0);
        assert_eq!(one.cv, 0.0);
        let zeros = Spread::of(&[0.0, 0.0]);
        assert_eq!(zeros.cv, 0.0);
    }

    #[test]
    fn test_sample_stdev() {
        // 2, 4, 4, 4, 5, 5, 7, 9 -> sample stdev ~2.138
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((sample_stdev(&v) - 2.138).abs() < 0.001);
    }

    #[test]
    fn test_percentile() {
        let sorted: Vec<usize> = (1..=10).collect();
        assert_eq!(percentile(&sorted, 0.1), 2);
        assert_eq!(percentile(&sorted, 0.9), 10);
        assert_eq!(percentile(&[], 0.5), 0);
    }

    #[test]
    fn test_blank_line_gaps() {
        assert_eq!(blank_line_gaps("a\n\nb\n\n\nc\n\n"), vec![1, 2]);
        assert!(blank_line_gaps("a\nb").is_empty());
    }

    #[test]
    fn test_strip_comments() {
        let src = "let a = 1; // note\n# shell\n/* block\n comment */let b = 2;";
        let out = strip_comments(src);
        assert!(!out.contains("note"));
        assert!(!out.contains("shell"));
        assert!(!out.contains("block"));
        assert!(out.contains("let b = 2;"));
    }

    #[test]
    fn test_code_tokens_min_length() {
        let tokens = code_tokens("x = foo_bar(a1, bb) // trailing");
        assert_eq!(tokens, vec!["foo_bar", "a1", "bb"]);
    }

    #[test]
    fn test_comment_ratio() {
        assert_eq!(comment_ratio(""), 0.0);
        assert!((comment_ratio("# a\ncode\n// b\nmore") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_naming_convention() {
        assert_eq!(
            naming_convention("user_name = load_user(user_id)"),
            NamingConvention::SnakeCase
        );
        assert_eq!(
            naming_convention("const userName = loadUser(userId)"),
            NamingConvention::CamelCase
        );
        assert_eq!(naming_convention("plain words here"), NamingConvention::Mixed);
        assert_eq!(
            naming_convention("user_name userName"),
            NamingConvention::Mixed
        );
    }

    #[test]
    fn test_function_lengths() {
        let src = "def a():\n    x = 1\n    return x\ndef b():\n    pass";
        assert_eq!(function_lengths(src), vec![3, 2]);
        assert!(function_lengths("x = 1\ny = 2").is_empty());
        assert_eq!(function_lengths("fn main() {\n}\n"), vec![3]);
    }

    #[test]
    fn test_split_identifier() {
        assert_eq!(split_identifier("loadUserName"), vec!["load", "user", "name"]);
        assert_eq!(split_identifier("parse_http_header"), vec!["parse", "http", "header"]);
        assert_eq!(split_identifier("HTTPServer"), vec!["httpserver"]);
    }
}
