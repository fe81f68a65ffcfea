//! Commit velocity and burst detection
//!
//! Velocity is lines added per minute since the same author's previous
//! commit. A burst is a 10-minute window holding at least five commits by one
//! author, three or more of them large.
//!
//! Authors are independent, so each author's stream is processed on its own
//! rayon task. Within an author, commits are always walked oldest first.

use crate::models::Commit;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::debug;

pub const BURST_WINDOW_SECS: i64 = 600;
pub const BURST_MIN_COMMITS: usize = 5;
pub const BURST_MIN_LARGE: usize = 3;
/// A commit is "large" above this many added lines.
pub const LARGE_COMMIT_LINES: usize = 20;

/// Throughput of one commit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityRecord {
    pub lines_added: usize,
    /// 0 for an author's first commit in the window
    pub velocity_lpm: f64,
    pub burst: bool,
}

/// Velocity and burst flags for every commit in a scan window.
#[derive(Debug, Clone, Default)]
pub struct VelocityReport {
    records: FxHashMap<String, VelocityRecord>,
}

impl VelocityReport {
    /// Analyze a scan window. Input order does not matter.
    pub fn analyze(commits: &[Commit]) -> Self {
        let mut per_author: FxHashMap<&str, Vec<&Commit>> = FxHashMap::default();
        // Backend order is newest first; reversing keeps equal timestamps
        // in commit order after the stable sort below.
        for commit in commits.iter().rev() {
            per_author
                .entry(commit.author.as_str())
                .or_default()
                .push(commit);
        }

        let streams: Vec<Vec<&Commit>> = per_author
            .into_values()
            .map(|mut stream| {
                stream.sort_by_key(|c| c.timestamp);
                stream
            })
            .collect();

        let records: FxHashMap<String, VelocityRecord> = streams
            .par_iter()
            .flat_map_iter(|stream| author_records(stream))
            .collect();

        let bursts = records.values().filter(|r| r.burst).count();
        if bursts > 0 {
            debug!("{} commits inside commit bursts", bursts);
        }
        Self { records }
    }

    pub fn get(&self, commit_id: &str) -> VelocityRecord {
        self.records.get(commit_id).copied().unwrap_or_default()
    }

    pub fn velocity(&self, commit_id: &str) -> f64 {
        self.get(commit_id).velocity_lpm
    }

    pub fn is_burst(&self, commit_id: &str) -> bool {
        self.get(commit_id).burst
    }
}

/// Records for one author's chronologically sorted stream.
fn author_records(stream: &[&Commit]) -> Vec<(String, VelocityRecord)> {
    let lines: Vec<usize> = stream.iter().map(|c| c.lines_added()).collect();
    let burst = burst_flags(stream, &lines);

    stream
        .iter()
        .enumerate()
        .map(|(i, commit)| {
            let velocity_lpm = match i.checked_sub(1).map(|p| stream[p]) {
                None => 0.0,
                Some(prev) => {
                    let minutes = (commit.timestamp - prev.timestamp).num_seconds() as f64 / 60.0;
                    if minutes > 0.0 {
                        lines[i] as f64 / minutes
                    } else {
                        // Same-second commits: no elapsed time to divide by.
                        lines[i] as f64
                    }
                }
            };
            (
                commit.id.clone(),
                VelocityRecord {
                    lines_added: lines[i],
                    velocity_lpm,
                    burst: burst[i],
                },
            )
        })
        .collect()
}

/// Slide a window forward from every commit and mark each qualifying one.
fn burst_flags(stream: &[&Commit], lines: &[usize]) -> Vec<bool> {
    let mut flags = vec![false; stream.len()];
    for start in 0..stream.len() {
        let origin = stream[start].timestamp;
        let end = stream[start..]
            .iter()
            .position(|c| (c.timestamp - origin).num_seconds() > BURST_WINDOW_SECS)
            .map_or(stream.len(), |offset| start + offset);

        let window = start..end;
        let large = lines[window.clone()]
            .iter()
            .filter(|&&l| l > LARGE_COMMIT_LINES)
            .count();
        if window.len() >= BURST_MIN_COMMITS && large >= BURST_MIN_LARGE {
            for flag in &mut flags[window] {
                *flag = true;
            }
        }
    }
    flags
}
