//! Init command - write example configuration

use crate::config::{UserConfig, TOML_CONFIG_FILE};
use anyhow::{Context, Result};
use console::style;
use std::path::Path;

const EXAMPLE_CONFIG: &str = r#"# sniff configuration
# Every value below is the default; delete what you don't change.

[scan]
# Commits scored by `sniff scan` / `sniff stats`
count = 10
stats_count = 50
# Author baselines come from max(count × history_multiplier, min_history) commits
history_multiplier = 3
min_history = 60
# SimHash similarity for near-duplicate diffs
similarity_threshold = 0.82

[scoring.weights]
text = 0.10
code = 0.50
structural = 0.15
similarity = 0.15
semantic = 0.10
baseline = 0.15

[adjudicator]
# Ask an LLM when the local score is borderline (disable with --no-llm)
enabled = true
borderline_low = 0.35
borderline_high = 0.50
timeout_secs = 60
# backend = "ollama"
# model = "qwen2.5-coder:7b"

[signals]
timeout_secs = 10
"#;

/// Run the init command
pub fn run(path: &Path) -> Result<()> {
    let repo_path = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;

    if !repo_path.is_dir() {
        anyhow::bail!("Path is not a directory: {}", repo_path.display());
    }

    println!("\n{} Initializing sniff\n", style("🐽").bold());

    let config_path = repo_path.join(TOML_CONFIG_FILE);
    if config_path.exists() {
        println!(
            "{} Already initialized at {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
    } else {
        std::fs::write(&config_path, EXAMPLE_CONFIG)
            .with_context(|| format!("Failed to create {}", config_path.display()))?;
        println!(
            "{} Created {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
    }

    match UserConfig::init_user_config() {
        Ok(user_path) => println!(
            "{} User config at {}",
            style("✓").green(),
            style(user_path.display()).cyan()
        ),
        Err(e) => println!(
            "{} Could not create user config: {}",
            style("!").yellow(),
            e
        ),
    }

    println!("\nNext steps:");
    println!("  {} Score recent commits", style("sniff scan .").cyan());
    println!("  {} Author leaderboard", style("sniff stats .").cyan());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;

    #[test]
    fn test_example_config_is_the_default() {
        let parsed: ProjectConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(parsed, ProjectConfig::default());
    }
}
