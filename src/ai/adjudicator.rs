//! LLM-backed borderline adjudication
//!
//! The model sees the commit message and a bounded slice of the diff and must
//! answer on one line: `SCORE: <0..1> | <reason>`. Anything else, and any
//! transport failure, is "no opinion" and the local score stands.

use crate::ai::client::{AiClient, LlmBackend};
use crate::ai::{AiConfig, AiResult};
use crate::signals::{Adjudication, BorderlineAdjudicator, SignalError, SignalResult};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Appended to the reasons of every adjudicated verdict.
pub const DISCLOSURE: &str =
    "Local engines returned borderline score. Final score was determined by LLM.";

/// Diff characters sent to the model.
const MAX_DIFF_CHARS: usize = 6000;

static SCORE_RE: OnceLock<Regex> = OnceLock::new();

fn score_re() -> &'static Regex {
    SCORE_RE.get_or_init(|| {
        Regex::new(r"(?im)^\s*SCORE:\s*(-?[0-9]*\.?[0-9]+)\s*(?:\|\s*(.*))?$").expect("valid regex")
    })
}

const SYSTEM_PROMPT: &str = "You are a code forensics expert who judges whether a git commit \
was written with an AI coding assistant. You answer with a single line.";

/// LLM-based borderline adjudicator
pub struct LlmAdjudicator {
    client: AiClient,
}

impl LlmAdjudicator {
    pub fn new(client: AiClient) -> Self {
        Self { client }
    }

    /// Connect to the configured backend.
    ///
    /// When no backend was named, a local Ollama server with a usable model
    /// installed is preferred over the hosted default.
    pub fn detect(config: AiConfig) -> AiResult<Self> {
        let installed = if config.backend_explicit || config.backend == LlmBackend::Ollama {
            None
        } else {
            AiClient::ollama_models()
        };
        let preferred = std::env::var("OLLAMA_MODEL")
            .unwrap_or_else(|_| LlmBackend::Ollama.default_model().to_string());
        let config = prefer_local(config, installed.as_deref(), &preferred);
        if config.backend == LlmBackend::Ollama {
            info!("Using local Ollama ({}) for borderline adjudication", config.model());
        }
        Ok(Self::new(AiClient::connect(config)?))
    }

    fn prompt(diff: &str, message: &str) -> String {
        let mut end = diff.len().min(MAX_DIFF_CHARS);
        while !diff.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            r#"Estimate how likely this commit was produced with an AI coding assistant.

COMMIT MESSAGE:
{message}

ADDED LINES:
```
{}
```

Consider phrasing of the message, uniformity of the code, boilerplate comments,
generic naming and whether the message reads like a summary of the code.

Reply with exactly one line:
SCORE: <number between 0 and 1> | <brief reason>"#,
            &diff[..end]
        )
    }
}

/// Switch an implicitly chosen hosted backend to a local Ollama model.
///
/// The model is the configured one if installed, else `preferred` if
/// installed, else the first installed model. An explicit backend, or no
/// installed models, leaves `config` untouched.
fn prefer_local(config: AiConfig, installed: Option<&[String]>, preferred: &str) -> AiConfig {
    if config.backend_explicit || config.backend == LlmBackend::Ollama {
        return config;
    }
    let Some(installed) = installed.filter(|models| !models.is_empty()) else {
        return config;
    };
    let has = |wanted: &str| {
        installed
            .iter()
            .any(|m| m == wanted || m.strip_suffix(":latest") == Some(wanted))
    };
    let model = match config.model.as_deref() {
        Some(configured) if has(configured) => configured.to_string(),
        _ if has(preferred) => preferred.to_string(),
        _ => installed[0].clone(),
    };
    AiConfig {
        backend: LlmBackend::Ollama,
        model: Some(model),
        ..config
    }
}

/// Parse `SCORE: <n> | <reason>` anywhere in the reply.
///
/// Negative scores are the "no opinion" sentinel; scores above 1 are clamped.
pub fn parse_response(response: &str) -> Adjudication {
    let Some(caps) = score_re().captures(response) else {
        return Adjudication::NoOpinion;
    };
    let Some(score) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) else {
        return Adjudication::NoOpinion;
    };
    let reason = caps
        .get(2)
        .map(|m| m.as_str().trim())
        .filter(|r| !r.is_empty())
        .unwrap_or("No reason given");
    Adjudication::from_raw(score, format!("LLM: {reason}"))
}

impl BorderlineAdjudicator for LlmAdjudicator {
    fn name(&self) -> &str {
        "llm-adjudicator"
    }

    fn adjudicate(&self, diff: &str, message: &str) -> SignalResult<Adjudication> {
        let response = self
            .client
            .ask(SYSTEM_PROMPT, &Self::prompt(diff, message))
            .map_err(|e| SignalError::unavailable(self.name(), e.to_string()))?;
        debug!("{} replied: {}", self.client.model(), response.trim());
        Ok(parse_response(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed() {
        assert_eq!(
            parse_response("SCORE: 0.82 | uniform docstrings on every helper"),
            Adjudication::Verdict {
                score: 0.82,
                reason: "LLM: uniform docstrings on every helper".into()
            }
        );
    }

    #[test]
    fn test_parse_with_preamble_and_case() {
        let reply = "Sure, here is my answer.\nscore: .3 | looks hand written";
        assert!(matches!(
            parse_response(reply),
            Adjudication::Verdict { score, .. } if (score - 0.3).abs() < 1e-9
        ));
    }

    #[test]
    fn test_parse_without_reason() {
        assert_eq!(
            parse_response("SCORE: 1"),
            Adjudication::Verdict {
                score: 1.0,
                reason: "LLM: No reason given".into()
            }
        );
    }

    #[test]
    fn test_parse_sentinel_and_garbage() {
        assert_eq!(parse_response("SCORE: -1 | cannot tell"), Adjudication::NoOpinion);
        assert_eq!(parse_response("I think it is human."), Adjudication::NoOpinion);
        assert_eq!(parse_response(""), Adjudication::NoOpinion);
    }

    #[test]
    fn test_parse_clamps_high_scores() {
        assert!(matches!(
            parse_response("SCORE: 7 | very sure"),
            Adjudication::Verdict { score, .. } if score == 1.0
        ));
    }

    fn installed(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_explicit_backend_never_switched() {
        let models = installed(&["qwen2.5-coder:7b"]);
        let config = AiConfig {
            backend: LlmBackend::Anthropic,
            backend_explicit: true,
            ..Default::default()
        };
        let out = prefer_local(config, Some(models.as_slice()), "qwen2.5-coder:7b");
        assert_eq!(out.backend, LlmBackend::Anthropic);
        assert_eq!(out.model, None);
    }

    #[test]
    fn test_configured_ollama_model_survives() {
        let config = AiConfig {
            backend: LlmBackend::Ollama,
            backend_explicit: true,
            model: Some("llama3:8b".into()),
            ..Default::default()
        };
        let models = installed(&["qwen2.5-coder:7b"]);
        let out = prefer_local(config, Some(models.as_slice()), "qwen2.5-coder:7b");
        assert_eq!(out.backend, LlmBackend::Ollama);
        assert_eq!(out.model(), "llama3:8b");
    }

    #[test]
    fn test_default_backend_prefers_installed_local_model() {
        let models = installed(&["mistral:latest", "llama3:8b"]);

        let out = prefer_local(AiConfig::default(), Some(models.as_slice()), "llama3:8b");
        assert_eq!(out.backend, LlmBackend::Ollama);
        assert_eq!(out.model(), "llama3:8b");

        // Preferred model missing: first installed one
        let out = prefer_local(AiConfig::default(), Some(models.as_slice()), "qwen2.5-coder:7b");
        assert_eq!(out.model(), "mistral:latest");

        // A configured model that is installed wins, `:latest` implied
        let config = AiConfig {
            model: Some("mistral".into()),
            ..Default::default()
        };
        assert_eq!(prefer_local(config, Some(models.as_slice()), "llama3:8b").model(), "mistral");
    }

    #[test]
    fn test_no_local_models_keeps_hosted() {
        let out = prefer_local(AiConfig::default(), None, "qwen2.5-coder:7b");
        assert_eq!(out.backend, LlmBackend::Anthropic);
        let out = prefer_local(AiConfig::default(), Some(&[][..]), "qwen2.5-coder:7b");
        assert_eq!(out.backend, LlmBackend::Anthropic);
    }

    #[test]
    fn test_prompt_truncates_on_char_boundary() {
        let diff = "é".repeat(MAX_DIFF_CHARS);
        let prompt = LlmAdjudicator::prompt(&diff, "msg");
        assert!(prompt.contains("SCORE:"));
        assert!(prompt.len() < diff.len() + 1000);
    }
}
