//! Author style baselines
//!
//! Each author's oldest commits are treated as a pre-assistant fingerprint.
//! A new commit is scored by how far it strays from that fingerprint:
//! size, comment density, line-length regularity, naming convention and
//! function length.
//!
//! Profiles are built once per scan from a wider history sample and are
//! read-only afterwards. Commits that went into a profile are never scored
//! against it.

use crate::detectors::lexical::{
    as_f64, comment_ratio, function_lengths, line_lengths, mean, naming_convention,
    sample_stdev, NamingConvention, Spread,
};
use crate::models::{reasons, Commit, DetectorResult};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use tracing::debug;

/// Profiles built from fewer baseline commits than this are not trusted.
pub const MIN_BASELINE_COMMITS: usize = 5;

/// Style features of a single diff.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitStyle {
    pub lines: usize,
    pub comment_ratio: f64,
    pub avg_line_length: f64,
    /// Sample standard deviation of line lengths
    pub line_variance: f64,
    pub function_lengths: Vec<usize>,
    pub naming: NamingConvention,
}

impl CommitStyle {
    pub fn of(diff: &str) -> Self {
        let lengths = as_f64(&line_lengths(diff));
        Self {
            lines: lengths.len(),
            comment_ratio: comment_ratio(diff),
            avg_line_length: mean(&lengths),
            line_variance: sample_stdev(&lengths),
            function_lengths: function_lengths(diff),
            naming: naming_convention(diff),
        }
    }

    fn avg_function_length(&self) -> f64 {
        mean(&as_f64(&self.function_lengths))
    }
}

/// Fixed-shape style record for one author.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorProfile {
    pub avg_commit_size: f64,
    pub commit_size_stdev: f64,
    pub avg_comment_ratio: f64,
    pub avg_line_length: f64,
    pub avg_line_variance: f64,
    pub dominant_naming: NamingConvention,
    pub avg_function_length: f64,
    pub baseline_commits: usize,
    /// Ids of the commits the profile was built from
    #[serde(skip)]
    pub members: FxHashSet<String>,
}

impl AuthorProfile {
    /// Aggregate a chronologically ordered baseline slice.
    fn from_styles(members: &[&Commit], styles: &[CommitStyle]) -> Self {
        let sizes: Vec<f64> = styles.iter().map(|s| s.lines as f64).collect();
        let size = Spread::of(&sizes);
        let fn_lengths: Vec<f64> = styles
            .iter()
            .flat_map(|s| s.function_lengths.iter().map(|&l| l as f64))
            .collect();

        Self {
            avg_commit_size: size.mean,
            commit_size_stdev: size.stdev,
            avg_comment_ratio: mean(&styles.iter().map(|s| s.comment_ratio).collect::<Vec<_>>()),
            avg_line_length: mean(&styles.iter().map(|s| s.avg_line_length).collect::<Vec<_>>()),
            avg_line_variance: mean(&styles.iter().map(|s| s.line_variance).collect::<Vec<_>>()),
            dominant_naming: dominant_naming(styles),
            avg_function_length: mean(&fn_lengths),
            baseline_commits: styles.len(),
            members: members.iter().map(|c| c.id.clone()).collect(),
        }
    }

    pub fn contains(&self, commit_id: &str) -> bool {
        self.members.contains(commit_id)
    }

    pub fn is_reliable(&self) -> bool {
        self.baseline_commits >= MIN_BASELINE_COMMITS
    }
}

/// Most common naming convention; ties go to the one seen first.
fn dominant_naming(styles: &[CommitStyle]) -> NamingConvention {
    let mut counts: Vec<(NamingConvention, usize)> = Vec::new();
    for style in styles {
        match counts.iter_mut().find(|(n, _)| *n == style.naming) {
            Some((_, c)) => *c += 1,
            None => counts.push((style.naming, 1)),
        }
    }
    let mut best: Option<(NamingConvention, usize)> = None;
    for (naming, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((naming, count));
        }
    }
    best.map(|(n, _)| n).unwrap_or(NamingConvention::Mixed)
}

/// Author name to profile, built once per scan.
#[derive(Debug, Clone, Default)]
pub struct AuthorBaselines {
    profiles: FxHashMap<String, AuthorProfile>,
}

impl AuthorBaselines {
    /// Build profiles from a history sample in backend order (newest first).
    ///
    /// Blank diffs are ignored. Each author's history is walked oldest-first
    /// and only the older half (at least one commit) feeds the profile.
    pub fn build(history: &[Commit]) -> Self {
        let chronological: Vec<&Commit> = history
            .iter()
            .rev()
            .filter(|c| !c.diff.trim().is_empty())
            .collect();

        // Feature extraction is independent per commit; collect() keeps order.
        let styles: Vec<CommitStyle> = chronological
            .par_iter()
            .map(|c| CommitStyle::of(&c.diff))
            .collect();

        let mut per_author: FxHashMap<&str, (Vec<&Commit>, Vec<CommitStyle>)> =
            FxHashMap::default();
        for (&commit, style) in chronological.iter().zip(styles) {
            let (commits, styles) = per_author.entry(commit.author.as_str()).or_default();
            commits.push(commit);
            styles.push(style);
        }

        let profiles: FxHashMap<String, AuthorProfile> = per_author
            .into_iter()
            .map(|(author, (commits, styles))| {
                let cut = usize::max(1, styles.len() / 2);
                let profile = AuthorProfile::from_styles(&commits[..cut], &styles[..cut]);
                (author.to_string(), profile)
            })
            .collect();

        debug!("Built {} author baselines", profiles.len());
        Self { profiles }
    }

    pub fn get(&self, author: &str) -> Option<&AuthorProfile> {
        self.profiles.get(author)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Score how much `commit` deviates from its author's baseline.
    ///
    /// A commit that is itself a baseline member gets no signal.
    pub fn deviation(&self, commit: &Commit) -> DetectorResult {
        let Some(profile) = self.profiles.get(&commit.author) else {
            return DetectorResult::no_signal(reasons::NO_BASELINE);
        };
        if commit.diff.trim().is_empty() {
            return DetectorResult::no_signal(reasons::NO_BASELINE);
        }
        if profile.contains(&commit.id) {
            return DetectorResult::no_signal(reasons::IN_BASELINE);
        }
        if !profile.is_reliable() {
            return DetectorResult::no_signal(reasons::INSUFFICIENT_HISTORY);
        }
        score_deviation(profile, &CommitStyle::of(&commit.diff))
    }
}

fn score_deviation(profile: &AuthorProfile, current: &CommitStyle) -> DetectorResult {
    let mut score = 0.0;
    let mut found = Vec::new();
    let size = current.lines;

    // Identical-size baselines have zero stdev; the +1 keeps z finite.
    if profile.avg_commit_size > 0.0 {
        let z = (size as f64 - profile.avg_commit_size).abs() / (profile.commit_size_stdev + 1.0);
        if z > 2.0 {
            score += 0.4;
            found.push(format!(
                "Commit size extreme outlier (z={z:.1} from author baseline of {:.0} lines)",
                profile.avg_commit_size
            ));
        } else if z > 1.2 {
            score += 0.2;
            found.push(format!("Unusual commit size (z={z:.1} from author baseline)"));
        }
    }

    let comment_increase = current.comment_ratio - profile.avg_comment_ratio;
    if comment_increase > 0.10 && size > 15 {
        score += 0.25;
        found.push(format!(
            "Comment density spike (+{:.0}% above author baseline)",
            comment_increase * 100.0
        ));
    }

    let baseline_var = profile.avg_line_variance;
    if baseline_var > 4.0 && current.line_variance < baseline_var * 0.5 && size > 20 {
        score += 0.3;
        found.push(format!(
            "Abnormally regular line lengths (variance {:.1} vs author baseline {:.1})",
            current.line_variance, baseline_var
        ));
    }

    if current.naming != profile.dominant_naming
        && current.naming != NamingConvention::Mixed
        && size > 15
    {
        score += 0.2;
        found.push(format!(
            "Naming style shift ({} -> {})",
            profile.dominant_naming, current.naming
        ));
    }

    let current_fn = current.avg_function_length();
    if profile.avg_function_length > 0.0 && current_fn > 0.0 {
        let ratio = current_fn / profile.avg_function_length;
        if ratio > 1.8 {
            score += 0.25;
            found.push(format!(
                "Functions {ratio:.1}x longer than author historical average"
            ));
        }
    }

    DetectorResult::from_reasons(f64::min(score, 1.0), found, reasons::CONSISTENT_STYLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn small_diff() -> String {
        "user_count = load_users(db)\nactive_users = filter_active(user_count)\nreturn active_users"
            .to_string()
    }

    /// A commit that is not in any history built below.
    fn candidate(author: &str, diff: &str) -> Commit {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        Commit::new("candidate", author, at, "update", diff)
    }

    /// Newest-first history of `n` commits by `author`, all with `diff`.
    fn history(author: &str, n: usize, diff: &str) -> Vec<Commit> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut commits: Vec<Commit> = (0..n)
            .map(|i| {
                Commit::new(
                    format!("{author}-{i:02}"),
                    author,
                    base + Duration::hours(i as i64),
                    "update",
                    diff,
                )
            })
            .collect();
        commits.reverse();
        commits
    }

    #[test]
    fn test_unknown_author() {
        let baselines = AuthorBaselines::build(&history("alice", 10, &small_diff()));
        let r = baselines.deviation(&candidate("bob", &small_diff()));
        assert_eq!(r.score, 0.0);
        assert_eq!(r.reason, reasons::NO_BASELINE);
    }

    #[test]
    fn test_insufficient_history_distinct_reason() {
        // 6 commits -> 3 baseline commits
        let baselines = AuthorBaselines::build(&history("alice", 6, &small_diff()));
        assert_eq!(baselines.get("alice").unwrap().baseline_commits, 3);
        let r = baselines.deviation(&candidate("alice", &"x = 1\n".repeat(100)));
        assert_eq!(r.score, 0.0);
        assert_eq!(r.reason, reasons::INSUFFICIENT_HISTORY);
    }

    #[test]
    fn test_baseline_uses_oldest_half() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut commits: Vec<Commit> = (0..10)
            .map(|i| {
                let diff = if i < 5 {
                    "a_line\n".repeat(4)
                } else {
                    "a_line\n".repeat(40)
                };
                Commit::new(format!("c{i}"), "alice", base + Duration::hours(i), "m", diff)
            })
            .collect();
        commits.reverse();
        let baselines = AuthorBaselines::build(&commits);
        let profile = baselines.get("alice").unwrap();
        assert_eq!(profile.baseline_commits, 5);
        assert!((profile.avg_commit_size - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_blank_diffs_ignored() {
        let mut commits = history("alice", 10, &small_diff());
        commits.extend(history("alice", 10, "  \n"));
        let baselines = AuthorBaselines::build(&commits);
        assert_eq!(baselines.get("alice").unwrap().baseline_commits, 5);
    }

    #[test]
    fn test_ten_times_larger_commit_flags_size() {
        // 20 identical commits -> 10 baseline commits of 3 lines
        let baselines = AuthorBaselines::build(&history("alice", 20, &small_diff()));
        let huge = vec![small_diff(); 10].join("\n");
        let r = baselines.deviation(&candidate("alice", &huge));
        assert!(r.score >= 0.4, "score {} reason {}", r.score, r.reason);
        assert!(r.reason.contains("extreme outlier"));
    }

    #[test]
    fn test_consistent_commit_no_signal() {
        let baselines = AuthorBaselines::build(&history("alice", 20, &small_diff()));
        let r = baselines.deviation(&candidate("alice", &small_diff()));
        assert_eq!(r.score, 0.0);
        assert_eq!(r.reason, reasons::CONSISTENT_STYLE);
    }

    #[test]
    fn test_naming_shift_and_comment_spike() {
        let snake = "user_name = get_user_name(user_id)\n".repeat(3);
        let baselines = AuthorBaselines::build(&history("alice", 10, &snake));
        let mut camel = String::new();
        for i in 0..16 {
            if i % 3 == 0 {
                camel.push_str("// fetch the user record\n");
            } else {
                camel.push_str("const userName = getUserName(userId);\n");
            }
        }
        let r = baselines.deviation(&candidate("alice", &camel));
        assert!(r.reason.contains("Naming style shift (snake_case -> camelCase)"));
        assert!(r.reason.contains("Comment density spike"));
        assert!(r.score <= 1.0);
    }

    #[test]
    fn test_function_length_ratio() {
        let short_fns = "def a():\n    return 1\ndef b():\n    return 2";
        let baselines = AuthorBaselines::build(&history("alice", 10, short_fns));
        let long_fn = format!("def big():\n{}", "    step()\n".repeat(8));
        let r = baselines.deviation(&candidate("alice", &long_fn));
        assert!(r.reason.contains("longer than author historical average"));
    }

    #[test]
    fn test_baseline_members_not_scored_against_themselves() {
        // Oldest commit is 100 lines, the rest are 3 lines each.
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut commits: Vec<Commit> = (0..10)
            .map(|i| {
                let diff = if i == 0 {
                    "value = compute()\n".repeat(100)
                } else {
                    small_diff()
                };
                Commit::new(format!("c{i}"), "alice", base + Duration::hours(i), "m", diff)
            })
            .collect();
        commits.reverse();
        let baselines = AuthorBaselines::build(&commits);
        let profile = baselines.get("alice").unwrap();
        assert_eq!(profile.baseline_commits, 5);
        assert!(profile.contains("c0"));
        assert!(!profile.contains("c5"));

        let oldest = commits.last().unwrap();
        let r = baselines.deviation(oldest);
        assert_eq!(r.score, 0.0);
        assert_eq!(r.reason, reasons::IN_BASELINE);

        // Newer commits are still scored.
        let newest = &commits[0];
        assert_eq!(baselines.deviation(newest).reason, reasons::CONSISTENT_STYLE);
    }

    #[test]
    fn test_dominant_naming_tie_goes_to_first_seen() {
        let styles = vec![
            CommitStyle::of("const userName = getUser(userId)"),
            CommitStyle::of("user_name = get_user(user_id)"),
        ];
        assert_eq!(dominant_naming(&styles), NamingConvention::CamelCase);
        assert_eq!(dominant_naming(&[]), NamingConvention::Mixed);
    }
}
