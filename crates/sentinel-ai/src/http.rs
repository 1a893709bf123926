//! Gemini-style `generateContent` client with API key rotation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sentinel_core::config::GeneratorConfig;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::generator::{GenerateError, GenerateRequest, Generated, Generator};

/// HTTP generator for `{endpoint}/v1beta/models/{model}:generateContent`.
///
/// Keys are used round-robin. A quota error moves on to the next key; once
/// every key has refused, the call fails with `QuotaExhausted`.
pub struct GeminiGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    keys: Vec<String>,
    next: AtomicUsize,
    timeout: Duration,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiGenerator {
    /// Build a client for `config`. Blank keys are ignored; at least one must
    /// remain.
    pub fn new(config: &GeneratorConfig, keys: Vec<String>) -> Result<Self, GenerateError> {
        let keys: Vec<String> = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() {
            return Err(GenerateError::Unavailable("no API keys configured".into()));
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        info!(model = %config.model, keys = keys.len(), "language model client ready");

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            keys,
            next: AtomicUsize::new(0),
            timeout,
        })
    }

    fn url(&self, key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={key}",
            self.endpoint, self.model
        )
    }

    async fn send(&self, key: &str, body: &serde_json::Value) -> Result<(u16, String), GenerateError> {
        let resp = self
            .client
            .post(self.url(key))
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = resp.status().as_u16();
        let text = resp.text().await.map_err(|e| self.transport_error(e))?;
        Ok((status, text))
    }

    /// Drops the URL from transport errors so the key never reaches a log.
    fn transport_error(&self, err: reqwest::Error) -> GenerateError {
        if err.is_timeout() {
            GenerateError::Timeout(self.timeout)
        } else {
            GenerateError::Http(err.without_url())
        }
    }
}

pub fn request_body(request: &GenerateRequest) -> serde_json::Value {
    json!({
        "systemInstruction": { "parts": [{ "text": request.system }] },
        "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
        "generationConfig": {
            "maxOutputTokens": request.max_output_tokens,
            "temperature": request.temperature,
        },
    })
}

/// Concatenated text parts of the first candidate.
pub fn parse_response(body: &str) -> Result<String, GenerateError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| GenerateError::Malformed(e.to_string()))?;
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(GenerateError::Malformed("response has no text".into()));
    }
    Ok(text)
}

pub fn is_quota_error(status: u16, body: &str) -> bool {
    status == 429 || body.contains("RESOURCE_EXHAUSTED") || body.to_lowercase().contains("quota")
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<Generated, GenerateError> {
        let body = request_body(request);
        let n = self.keys.len();
        let start = self.next.fetch_add(1, Ordering::Relaxed) % n;

        for attempt in 0..n {
            let ordinal = (start + attempt) % n;
            let (status, text) = self.send(&self.keys[ordinal], &body).await?;

            if is_quota_error(status, &text) {
                warn!(key = ordinal + 1, status, "API key quota exhausted, rotating");
                self.next.store(ordinal + 1, Ordering::Relaxed);
                continue;
            }
            if !(200..300).contains(&status) {
                return Err(GenerateError::Server { status, body: text });
            }

            return Ok(Generated {
                text: parse_response(&text)?,
                model: self.model.clone(),
            });
        }

        Err(GenerateError::QuotaExhausted)
    }
}
