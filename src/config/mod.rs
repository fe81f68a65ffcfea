//! Configuration module for sniff
//!
//! This module handles:
//! - Project-level configuration (sniff.toml)
//! - User-level LLM settings (~/.config/sniff/config.toml)

mod project_config;
mod user_config;

pub use project_config::{
    load_project_config, AdjudicatorConfig, ProjectConfig, ScanConfig, ScoringConfig,
    SignalsConfig, JSON_CONFIG_FILE, TOML_CONFIG_FILE,
};
pub use user_config::{AiSettings, UserConfig};
