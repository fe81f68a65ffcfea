//! User-level configuration for sniff
//!
//! Supports loading config from:
//! - Environment variables
//! - ~/.config/sniff/config.toml

use crate::ai::{AiConfig, AiResult, LlmBackend};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub ai: AiSettings,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct AiSettings {
    /// LLM backend: "anthropic" (default), "openai", "ollama", "openrouter", "deepinfra"
    pub backend: Option<String>,

    /// Model override for the chosen backend
    pub model: Option<String>,

    pub anthropic_api_key: Option<String>,

    pub openai_api_key: Option<String>,

    pub openrouter_api_key: Option<String>,

    pub deepinfra_api_key: Option<String>,
}

impl UserConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/sniff/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = UserConfig::default();

        if let Some(user_config) = Self::user_config_path()
            .filter(|p| p.exists())
            .and_then(|p| std::fs::read_to_string(&p).ok())
            .and_then(|content| toml::from_str::<UserConfig>(&content).ok())
        {
            config.merge(user_config);
        }

        // Environment variables override everything
        let ai = &mut config.ai;
        for (var, slot) in [
            ("ANTHROPIC_API_KEY", &mut ai.anthropic_api_key),
            ("OPENAI_API_KEY", &mut ai.openai_api_key),
            ("OPENROUTER_API_KEY", &mut ai.openrouter_api_key),
            ("DEEPINFRA_API_KEY", &mut ai.deepinfra_api_key),
        ] {
            if let Ok(key) = std::env::var(var) {
                if !key.trim().is_empty() {
                    *slot = Some(key);
                }
            }
        }
        if let Ok(backend) = std::env::var("SNIFF_LLM_BACKEND") {
            config.ai.backend = Some(backend);
        }

        Ok(config)
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sniff").join("config.toml"))
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        let ai = other.ai;
        if ai.backend.is_some() {
            self.ai.backend = ai.backend;
        }
        if ai.model.is_some() {
            self.ai.model = ai.model;
        }
        if ai.anthropic_api_key.is_some() {
            self.ai.anthropic_api_key = ai.anthropic_api_key;
        }
        if ai.openai_api_key.is_some() {
            self.ai.openai_api_key = ai.openai_api_key;
        }
        if ai.openrouter_api_key.is_some() {
            self.ai.openrouter_api_key = ai.openrouter_api_key;
        }
        if ai.deepinfra_api_key.is_some() {
            self.ai.deepinfra_api_key = ai.deepinfra_api_key;
        }
    }

    /// Get the API key configured for `backend`, if any
    pub fn api_key(&self, backend: LlmBackend) -> Option<&str> {
        match backend {
            LlmBackend::Anthropic => self.ai.anthropic_api_key.as_deref(),
            LlmBackend::OpenAi => self.ai.openai_api_key.as_deref(),
            LlmBackend::OpenRouter => self.ai.openrouter_api_key.as_deref(),
            LlmBackend::Deepinfra => self.ai.deepinfra_api_key.as_deref(),
            LlmBackend::Ollama => None,
        }
    }

    /// The configured backend, defaulting to Anthropic
    pub fn backend(&self) -> AiResult<LlmBackend> {
        self.ai
            .backend
            .as_deref()
            .map_or(Ok(LlmBackend::default()), str::parse)
    }

    /// Client settings, with optional project-level overrides.
    pub fn ai_config(&self, backend: Option<&str>, model: Option<&str>) -> AiResult<AiConfig> {
        let backend_explicit = backend.is_some() || self.ai.backend.is_some();
        let backend = match backend {
            Some(name) => name.parse()?,
            None => self.backend()?,
        };
        Ok(AiConfig {
            backend,
            backend_explicit,
            model: model.map(str::to_string).or_else(|| self.ai.model.clone()),
            api_key: self.api_key(backend).map(str::to_string),
            ..AiConfig::default()
        })
    }

    /// Initialize user config directory and create example config
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if !config_path.exists() {
            let example = r#"# sniff user configuration

[ai]
# Backend for borderline adjudication:
# "anthropic" (default), "openai", "openrouter", "deepinfra" or "ollama" (free, local)
# backend = "anthropic"
# model = "claude-3-5-haiku-latest"

# Keys can also come from ANTHROPIC_API_KEY, OPENAI_API_KEY, ...
# anthropic_api_key = "sk-ant-..."
# openai_api_key = "sk-..."
"#;
            std::fs::write(&config_path, example)?;
        }

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UserConfig::default();
        assert_eq!(config.backend().unwrap(), LlmBackend::Anthropic);
        assert!(config.api_key(LlmBackend::Anthropic).is_none());
        assert!(config.api_key(LlmBackend::Ollama).is_none());
        assert!(!config.ai_config(None, None).unwrap().backend_explicit);
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
[ai]
backend = "openai"
model = "gpt-4o"
openai_api_key = "sk-test-123"
"#;
        let config: UserConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend().unwrap(), LlmBackend::OpenAi);
        assert_eq!(config.api_key(LlmBackend::OpenAi), Some("sk-test-123"));

        let ai = config.ai_config(None, None).unwrap();
        assert_eq!(ai.backend, LlmBackend::OpenAi);
        assert!(ai.backend_explicit);
        assert_eq!(ai.model(), "gpt-4o");
        assert_eq!(ai.api_key.as_deref(), Some("sk-test-123"));
    }

    #[test]
    fn test_project_overrides_win() {
        let config: UserConfig = toml::from_str("[ai]\nbackend = \"openai\"\n").unwrap();
        let ai = config.ai_config(Some("ollama"), Some("llama3")).unwrap();
        assert_eq!(ai.backend, LlmBackend::Ollama);
        assert_eq!(ai.model(), "llama3");
    }

    #[test]
    fn test_unknown_backend_is_error() {
        let config: UserConfig = toml::from_str("[ai]\nbackend = \"gemini\"\n").unwrap();
        assert!(config.backend().is_err());
    }

    #[test]
    fn test_minimal_and_invalid() {
        assert!(toml::from_str::<UserConfig>("").is_ok());
        assert!(toml::from_str::<UserConfig>("this is [[ not valid toml").is_err());
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut base = UserConfig {
            ai: AiSettings {
                anthropic_api_key: Some("sk-original".to_string()),
                ..Default::default()
            },
        };
        base.merge(UserConfig {
            ai: AiSettings {
                model: Some("claude-3-5-sonnet-latest".to_string()),
                ..Default::default()
            },
        });
        assert_eq!(base.api_key(LlmBackend::Anthropic), Some("sk-original"));
        assert_eq!(base.ai.model.as_deref(), Some("claude-3-5-sonnet-latest"));
    }

    #[test]
    fn test_user_config_path() {
        if let Some(p) = UserConfig::user_config_path() {
            assert!(p.ends_with("sniff/config.toml"));
        }
    }
}
