//! LLM second opinion for borderline commits
//!
//! When the local engines land in the uncertain band, an LLM is asked to
//! read the diff and message and give its own score. Supports several
//! backends with bring-your-own-key: API keys come from environment
//! variables or the user config file.
//!
//! # Environment Variables
//!
//! - `ANTHROPIC_API_KEY`: Anthropic backend (default)
//! - `OPENAI_API_KEY`: OpenAI backend
//! - `OPENROUTER_API_KEY`, `DEEPINFRA_API_KEY`: hosted open models
//! - `OLLAMA_MODEL`: model name for a local Ollama server (no key)
//!
//! # Example
//!
//! ```rust,ignore
//! use sniff::ai::{AiConfig, LlmAdjudicator};
//!
//! let adjudicator = LlmAdjudicator::detect(AiConfig::default())?;
//! let answer = adjudicator.adjudicate(&diff, &message)?;
//! ```

mod adjudicator;
mod client;

pub use adjudicator::{parse_response, LlmAdjudicator, DISCLOSURE};
pub use client::{AiClient, AiConfig, LlmBackend};

use thiserror::Error;

/// Errors that can occur in the AI module
#[derive(Error, Debug)]
pub enum AiError {
    #[error("Missing API key: {env_var} not set. Get your key at {signup_url}")]
    MissingApiKey { env_var: String, signup_url: String },

    #[error("API request failed: {0}")]
    RequestFailed(#[from] ureq::Error),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type AiResult<T> = Result<T, AiError>;
