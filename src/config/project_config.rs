//! Project-level configuration
//!
//! Loaded from `sniff.toml` at the repository root, with `.sniffrc.json` as
//! a fallback. Every field has a default, so a partial file (or none) is
//! fine.
//!
//! # Example
//!
//! ```toml
//! [scan]
//! count = 25
//! similarity_threshold = 0.85
//!
//! [scoring.weights]
//! code = 0.40
//! baseline = 0.25
//!
//! [adjudicator]
//! enabled = true
//! borderline_low = 0.30
//! borderline_high = 0.55
//! backend = "ollama"
//! ```

use crate::detectors::DEFAULT_SIMILARITY_THRESHOLD;
use crate::pipeline::ScanOptions;
use crate::scoring::{BorderlineBand, ScoringWeights};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

pub const TOML_CONFIG_FILE: &str = "sniff.toml";
pub const JSON_CONFIG_FILE: &str = ".sniffrc.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub adjudicator: AdjudicatorConfig,

    #[serde(default)]
    pub signals: SignalsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Commits analyzed by `scan`
    #[serde(default = "default_scan_count")]
    pub count: usize,

    /// Commits analyzed by `stats`
    #[serde(default = "default_stats_count")]
    pub stats_count: usize,

    #[serde(default = "default_history_multiplier")]
    pub history_multiplier: usize,

    #[serde(default = "default_min_history")]
    pub min_history: usize,

    /// SimHash similarity at which two diffs count as near duplicates
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            count: default_scan_count(),
            stats_count: default_stats_count(),
            history_multiplier: default_history_multiplier(),
            min_history: default_min_history(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

fn default_scan_count() -> usize {
    10
}
fn default_stats_count() -> usize {
    50
}
fn default_history_multiplier() -> usize {
    3
}
fn default_min_history() -> usize {
    60
}
fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: ScoringWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjudicatorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_borderline_low")]
    pub borderline_low: f64,

    #[serde(default = "default_borderline_high")]
    pub borderline_high: f64,

    #[serde(default = "default_adjudicator_timeout")]
    pub timeout_secs: u64,

    /// LLM backend name; falls back to the user config
    #[serde(default)]
    pub backend: Option<String>,

    #[serde(default)]
    pub model: Option<String>,
}

impl Default for AdjudicatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            borderline_low: default_borderline_low(),
            borderline_high: default_borderline_high(),
            timeout_secs: default_adjudicator_timeout(),
            backend: None,
            model: None,
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_borderline_low() -> f64 {
    0.35
}
fn default_borderline_high() -> f64 {
    0.50
}
fn default_adjudicator_timeout() -> u64 {
    60
}

impl AdjudicatorConfig {
    pub fn band(&self) -> BorderlineBand {
        BorderlineBand {
            low: self.borderline_low,
            high: self.borderline_high,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalsConfig {
    /// Upper bound on every text/semantic collaborator call
    #[serde(default = "default_signal_timeout")]
    pub timeout_secs: u64,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_signal_timeout(),
        }
    }
}

fn default_signal_timeout() -> u64 {
    10
}

impl SignalsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ProjectConfig {
    /// Scan options for a window of `count` commits.
    pub fn scan_options(&self, count: usize) -> ScanOptions {
        ScanOptions {
            count,
            history_multiplier: self.scan.history_multiplier.max(1),
            min_history: self.scan.min_history,
            similarity_threshold: self.scan.similarity_threshold,
            weights: self.scoring.weights.clone(),
            borderline: self.adjudicator.band(),
            adjudicate: self.adjudicator.enabled,
        }
    }

    /// Replace out-of-range values with defaults, logging each fix.
    pub fn sanitized(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.scan.similarity_threshold) {
            warn!(
                "similarity_threshold {} out of range, using {}",
                self.scan.similarity_threshold, DEFAULT_SIMILARITY_THRESHOLD
            );
            self.scan.similarity_threshold = DEFAULT_SIMILARITY_THRESHOLD;
        }
        if self.adjudicator.borderline_low > self.adjudicator.borderline_high {
            warn!(
                "borderline_low {} is above borderline_high {}, using defaults",
                self.adjudicator.borderline_low, self.adjudicator.borderline_high
            );
            self.adjudicator.borderline_low = default_borderline_low();
            self.adjudicator.borderline_high = default_borderline_high();
        }
        if self.signals.timeout_secs == 0 {
            warn!("signals.timeout_secs must be at least 1, using {}", default_signal_timeout());
            self.signals.timeout_secs = default_signal_timeout();
        }
        if self.adjudicator.timeout_secs == 0 {
            warn!(
                "adjudicator.timeout_secs must be at least 1, using {}",
                default_adjudicator_timeout()
            );
            self.adjudicator.timeout_secs = default_adjudicator_timeout();
        }
        let weights = &self.scoring.weights;
        let all = [
            weights.text,
            weights.code,
            weights.structural,
            weights.similarity,
            weights.semantic,
            weights.baseline,
        ];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            warn!("Negative or invalid scoring weight, using default weights");
            self.scoring.weights = ScoringWeights::default();
        }
        self
    }
}

/// Load project configuration from the repository root.
///
/// Tries `sniff.toml`, then `.sniffrc.json`. A file that fails to parse is
/// reported and skipped.
pub fn load_project_config(repo_path: &Path) -> ProjectConfig {
    let toml_path = repo_path.join(TOML_CONFIG_FILE);
    if toml_path.exists() {
        match load_toml_config(&toml_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", toml_path.display());
                return config.sanitized();
            }
            Err(e) => {
                warn!("Failed to load {}: {}", toml_path.display(), e);
            }
        }
    }

    let json_path = repo_path.join(JSON_CONFIG_FILE);
    if json_path.exists() {
        match load_json_config(&json_path) {
            Ok(config) => {
                debug!("Loaded project config from {}", json_path.display());
                return config.sanitized();
            }
            Err(e) => {
                warn!("Failed to load {}: {}", json_path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    ProjectConfig::default()
}

fn load_toml_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn load_json_config(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let config = load_project_config(dir.path());
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.scan.count, 10);
        assert_eq!(config.scan.stats_count, 50);
        assert!(config.adjudicator.enabled);
    }

    #[test]
    fn test_partial_toml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(TOML_CONFIG_FILE),
            r#"
[scan]
count = 25

[scoring.weights]
code = 0.40

[adjudicator]
enabled = false
backend = "ollama"
"#,
        )
        .unwrap();

        let config = load_project_config(dir.path());
        assert_eq!(config.scan.count, 25);
        assert_eq!(config.scan.min_history, 60);
        assert_eq!(config.scoring.weights.code, 0.40);
        assert_eq!(config.scoring.weights.text, 0.10);
        assert!(!config.adjudicator.enabled);
        assert_eq!(config.adjudicator.backend.as_deref(), Some("ollama"));

        let options = config.scan_options(7);
        assert_eq!(options.count, 7);
        assert!(!options.adjudicate);
        assert_eq!(options.weights.code, 0.40);
    }

    #[test]
    fn test_json_fallback() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(JSON_CONFIG_FILE),
            r#"{"scan": {"similarity_threshold": 0.9}, "signals": {"timeout_secs": 3}}"#,
        )
        .unwrap();
        let config = load_project_config(dir.path());
        assert_eq!(config.scan.similarity_threshold, 0.9);
        assert_eq!(config.signals.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_toml_falls_back() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(TOML_CONFIG_FILE), "[scan\ncount = ").unwrap();
        assert_eq!(load_project_config(dir.path()), ProjectConfig::default());
    }

    #[test]
    fn test_sanitized() {
        let mut config = ProjectConfig::default();
        config.scan.similarity_threshold = 3.0;
        config.adjudicator.borderline_low = 0.8;
        config.scoring.weights.code = -1.0;

        let config = config.sanitized();
        assert_eq!(config.scan.similarity_threshold, DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(config.adjudicator.band(), BorderlineBand::default());
        assert_eq!(config.scoring.weights, ScoringWeights::default());
    }

    #[test]
    fn test_zero_timeouts_replaced() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(TOML_CONFIG_FILE),
            "[signals]\ntimeout_secs = 0\n\n[adjudicator]\ntimeout_secs = 0\n",
        )
        .unwrap();
        let config = load_project_config(dir.path());
        assert_eq!(config.signals.timeout(), Duration::from_secs(10));
        assert_eq!(config.adjudicator.timeout(), Duration::from_secs(60));
    }
}
