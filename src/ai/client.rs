//! Single-prompt chat client for the adjudicator
//!
//! One system prompt in, one text reply out. Anthropic speaks its own
//! messages API; every other backend speaks the OpenAI chat format. Requests
//! go through a sync ureq agent with a global timeout.

use crate::ai::{AiError, AiResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::{SocketAddr, TcpStream};
use std::str::FromStr;
use std::time::Duration;

const OLLAMA_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 11434);
const OLLAMA_TAGS_URL: &str = "http://localhost:11434/api/tags";

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmBackend {
    #[default]
    Anthropic,
    OpenAi,
    Deepinfra,
    OpenRouter,
    Ollama,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Anthropic,
    OpenAi,
}

/// Static facts about one backend.
struct Endpoint {
    url: &'static str,
    dialect: Dialect,
    /// `None` for keyless local servers
    key_var: Option<&'static str>,
    signup_url: &'static str,
    default_model: &'static str,
}

impl LlmBackend {
    fn endpoint(self) -> Endpoint {
        match self {
            LlmBackend::Anthropic => Endpoint {
                url: "https://api.anthropic.com/v1/messages",
                dialect: Dialect::Anthropic,
                key_var: Some("ANTHROPIC_API_KEY"),
                signup_url: "https://console.anthropic.com/settings/keys",
                default_model: "claude-3-5-haiku-latest",
            },
            LlmBackend::OpenAi => Endpoint {
                url: "https://api.openai.com/v1/chat/completions",
                dialect: Dialect::OpenAi,
                key_var: Some("OPENAI_API_KEY"),
                signup_url: "https://platform.openai.com/api-keys",
                default_model: "gpt-4o-mini",
            },
            LlmBackend::Deepinfra => Endpoint {
                url: "https://api.deepinfra.com/v1/openai/chat/completions",
                dialect: Dialect::OpenAi,
                key_var: Some("DEEPINFRA_API_KEY"),
                signup_url: "https://deepinfra.com/dash/api_keys",
                default_model: "meta-llama/Llama-3.3-70B-Instruct",
            },
            LlmBackend::OpenRouter => Endpoint {
                url: "https://openrouter.ai/api/v1/chat/completions",
                dialect: Dialect::OpenAi,
                key_var: Some("OPENROUTER_API_KEY"),
                signup_url: "https://openrouter.ai/keys",
                default_model: "anthropic/claude-3.5-haiku",
            },
            LlmBackend::Ollama => Endpoint {
                url: "http://localhost:11434/v1/chat/completions",
                dialect: Dialect::OpenAi,
                key_var: None,
                signup_url: "https://ollama.ai",
                default_model: "qwen2.5-coder:7b",
            },
        }
    }

    /// Environment variable holding the API key, if the backend needs one.
    pub fn key_var(self) -> Option<&'static str> {
        self.endpoint().key_var
    }

    pub fn default_model(self) -> &'static str {
        self.endpoint().default_model
    }
}

impl FromStr for LlmBackend {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(LlmBackend::Anthropic),
            "openai" => Ok(LlmBackend::OpenAi),
            "deepinfra" => Ok(LlmBackend::Deepinfra),
            "openrouter" => Ok(LlmBackend::OpenRouter),
            "ollama" => Ok(LlmBackend::Ollama),
            other => Err(AiError::ConfigError(format!("unknown LLM backend '{other}'"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub backend: LlmBackend,
    /// The backend was named by the user rather than defaulted
    pub backend_explicit: bool,
    pub model: Option<String>,
    /// Used when the backend's environment variable is unset
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::default(),
            backend_explicit: false,
            model: None,
            api_key: None,
            max_tokens: 256,
            temperature: 0.0,
            timeout: Duration::from_secs(60),
        }
    }
}

impl AiConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }
}

/// LLM client bound to one backend and model
pub struct AiClient {
    config: AiConfig,
    api_key: Option<String>,
    agent: ureq::Agent,
}

fn make_agent(timeout: Duration) -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // status codes are mapped to AiError in `send`
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

impl AiClient {
    /// Resolve credentials and build the client.
    ///
    /// Keys come from the backend's environment variable, then from
    /// `config.api_key`. Ollama takes its model from `OLLAMA_MODEL` when none
    /// is configured.
    pub fn connect(mut config: AiConfig) -> AiResult<Self> {
        let endpoint = config.backend.endpoint();
        let api_key = match endpoint.key_var {
            None => {
                if config.model.is_none() {
                    config.model = env::var("OLLAMA_MODEL").ok().filter(|m| !m.trim().is_empty());
                }
                None
            }
            Some(var) => Some(
                env::var(var)
                    .ok()
                    .filter(|k| !k.trim().is_empty())
                    .or_else(|| config.api_key.clone())
                    .ok_or_else(|| AiError::MissingApiKey {
                        env_var: var.to_string(),
                        signup_url: endpoint.signup_url.to_string(),
                    })?,
            ),
        };

        Ok(Self {
            agent: make_agent(config.timeout),
            config,
            api_key,
        })
    }

    /// Names of the models installed on a local Ollama server, or `None` when
    /// no server answers.
    pub fn ollama_models() -> Option<Vec<String>> {
        TcpStream::connect_timeout(&SocketAddr::from(OLLAMA_ADDR), Duration::from_millis(300))
            .ok()?;
        let tags: OllamaTags = make_agent(Duration::from_secs(2))
            .get(OLLAMA_TAGS_URL)
            .call()
            .ok()?
            .into_body()
            .read_json()
            .ok()?;
        Some(tags.models.into_iter().map(|m| m.name).collect())
    }

    pub fn backend(&self) -> LlmBackend {
        self.config.backend
    }

    pub fn model(&self) -> &str {
        self.config.model()
    }

    /// Send one system prompt and one user prompt, return the text reply.
    pub fn ask(&self, system: &str, prompt: &str) -> AiResult<String> {
        let endpoint = self.config.backend.endpoint();
        let mut req = self
            .agent
            .post(endpoint.url)
            .header("Content-Type", "application/json");

        match endpoint.dialect {
            Dialect::Anthropic => {
                if let Some(key) = &self.api_key {
                    req = req.header("x-api-key", key.as_str());
                }
                let body = AnthropicRequest {
                    model: self.model(),
                    max_tokens: self.config.max_tokens,
                    system,
                    messages: [Turn::user(prompt)],
                    temperature: self.config.temperature,
                };
                let reply: AnthropicReply =
                    send(req.header("anthropic-version", "2023-06-01"), &body)?;
                reply
                    .content
                    .into_iter()
                    .find(|c| c.kind == "text")
                    .map(|c| c.text)
                    .ok_or_else(|| AiError::ParseError("No text content in response".to_string()))
            }
            Dialect::OpenAi => {
                if let Some(key) = &self.api_key {
                    req = req.header("Authorization", format!("Bearer {key}").as_str());
                }
                let body = OpenAiRequest {
                    model: self.model(),
                    messages: [
                        Turn {
                            role: "system",
                            content: system,
                        },
                        Turn::user(prompt),
                    ],
                    max_tokens: self.config.max_tokens,
                    temperature: self.config.temperature,
                };
                let reply: OpenAiReply = send(req, &body)?;
                reply
                    .choices
                    .into_iter()
                    .next()
                    .map(|c| c.message.content)
                    .ok_or_else(|| AiError::ParseError("No response choices".to_string()))
            }
        }
    }
}

fn send<B: Serialize, R: DeserializeOwned>(
    req: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: &B,
) -> AiResult<R> {
    let response = req.send_json(body)?;
    let status = response.status().as_u16();
    if status >= 400 {
        let message = response.into_body().read_to_string().unwrap_or_default();
        return Err(AiError::ApiError { status, message });
    }
    response
        .into_body()
        .read_json()
        .map_err(|e| AiError::ParseError(e.to_string()))
}

#[derive(Serialize)]
struct Turn<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> Turn<'a> {
    fn user(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Turn<'a>; 1],
    temperature: f32,
}

#[derive(Deserialize)]
struct AnthropicReply {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: [Turn<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiReply {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiText,
}

#[derive(Deserialize)]
struct OpenAiText {
    content: String,
}

#[derive(Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}
