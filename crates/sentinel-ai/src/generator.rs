//! The text-generation capability, as seen by the rest of the engine.
//!
//! Implementations make one round trip per call and hold no conversation
//! state. Callers bound each call with their own timeout.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Fixed instructions, sent ahead of the prompt.
    pub system: String,
    pub prompt: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl GenerateRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            max_output_tokens: 1024,
            temperature: 0.2,
        }
    }

    pub fn with_limits(mut self, max_output_tokens: u32, temperature: f32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self.temperature = temperature;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub text: String,
    pub model: String,
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[cfg(feature = "http")]
    #[error("request to the language model failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("the language model returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("the language model did not answer within {0:?}")]
    Timeout(Duration),

    #[error("every configured API key has exhausted its quota")]
    QuotaExhausted,

    #[error("the language model returned an unusable response: {0}")]
    Malformed(String),

    #[error("the language model is unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Generator: Send + Sync {
    /// Model identifier, for logging and display.
    fn model(&self) -> &str;

    async fn generate(&self, request: &GenerateRequest) -> Result<Generated, GenerateError>;
}
