//! Structural regularity analyzer
//!
//! Generated code tends to have a tight line-length distribution (most lines
//! 60-80 chars) and perfectly regular blank-line spacing. Hand-written code
//! has fat tails: short one-liners next to long, dense lines.
//!
//! Signals:
//! - coefficient of variation (CV) of non-blank line lengths
//! - narrow P10..P90 inter-decile range
//! - constant run length of blank-line gaps

use crate::detectors::lexical::{as_f64, blank_line_gaps, line_lengths, percentile, Spread};
use crate::models::{reasons, DetectorResult};

const MIN_LINES: usize = 8;
const UNIFORM_CV: f64 = 0.25;
const UNIFORM_MIN_LINES: usize = 15;
const REGULAR_CV: f64 = 0.35;
const REGULAR_MIN_LINES: usize = 20;
const NARROW_RANGE_RATIO: f64 = 0.5;
const MIN_BLANK_GAPS: usize = 3;
const REGULAR_GAP_CV: f64 = 0.3;

/// Score how uniform the layout of a diff is.
pub fn analyze(diff: &str) -> DetectorResult {
    let lengths = line_lengths(diff);
    let n = lengths.len();
    if n < MIN_LINES {
        return DetectorResult::no_signal(reasons::DIFF_TOO_SMALL);
    }

    let spread = Spread::of(&as_f64(&lengths));
    let mut score = 0.0;
    let mut found = Vec::new();

    if spread.cv < UNIFORM_CV && n > UNIFORM_MIN_LINES {
        score += 0.5;
        found.push(format!(
            "Abnormally uniform line lengths (CV={:.2}), typical of generated code",
            spread.cv
        ));
    } else if spread.cv < REGULAR_CV && n > REGULAR_MIN_LINES {
        score += 0.25;
        found.push(format!(
            "Suspicious line length regularity (CV={:.2})",
            spread.cv
        ));
    }

    let mut sorted = lengths;
    sorted.sort_unstable();
    let p10 = percentile(&sorted, 0.1);
    let p90 = percentile(&sorted, 0.9);
    let range_ratio = (p90 - p10) as f64 / (spread.mean + 1.0);
    if range_ratio < NARROW_RANGE_RATIO && n > REGULAR_MIN_LINES {
        score += 0.2;
        found.push(format!(
            "Narrow line length range (P10={p10}, P90={p90}), uniform formatting"
        ));
    }

    let gaps = blank_line_gaps(diff);
    if gaps.len() >= MIN_BLANK_GAPS {
        let gap_spread = Spread::of(&as_f64(&gaps));
        // Offset keeps an all-equal gap list well-defined.
        let gap_cv = gap_spread.stdev / (gap_spread.mean + 0.001);
        if gap_cv < REGULAR_GAP_CV {
            score += 0.15;
            found.push("Perfectly regular blank-line spacing".to_string());
        }
    }

    DetectorResult::from_reasons(f64::min(score, 1.0), found, reasons::ORGANIC_STRUCTURE)
}
