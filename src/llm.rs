//! Hosted LLM provider abstraction.
//!
//! Defines the [`ChatProvider`] trait and two implementations:
//! - **[`DisabledChat`]** returns errors; used when no provider is configured.
//! - **[`OpenAiCompatProvider`]** calls an OpenAI-compatible
//!   `POST {base_url}/chat/completions` endpoint (Groq, OpenAI, OpenRouter,
//!   or a self-hosted server) and returns the first choice's text verbatim.
//!
//! # Provider Selection
//!
//! Use [`create_provider`] to instantiate the appropriate provider based on
//! the `[llm]` section of the configuration:
//!
//! ```rust
//! # use libra_ai::config::LlmConfig;
//! # use libra_ai::llm::create_provider;
//! let config = LlmConfig::default(); // provider = "disabled"
//! let provider = create_provider(&config).unwrap();
//! assert!(!provider.is_enabled());
//! ```
//!
//! # Retry Strategy
//!
//! Off by default (`max_retries = 0`). When enabled:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;

/// Text-in / text-out completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"llama-3.3-70b-versatile"`).
    fn model_name(&self) -> &str;

    /// Whether calls can succeed at all. The assistant skips disabled
    /// providers instead of surfacing their error.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Send a single user prompt and return the completion text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Build the provider described by `config`.
///
/// # Errors
///
/// Returns an error if the provider needs an API key and the configured
/// environment variable is unset, or if the HTTP client cannot be built.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn ChatProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledChat)),
        "groq" | "openai" | "openrouter" | "custom" => {
            Ok(Arc::new(OpenAiCompatProvider::new(config)?))
        }
        other => bail!("Unknown llm provider: {}", other),
    }
}

// ============ Disabled Provider ============

/// A no-op provider that always returns errors.
pub struct DisabledChat;

#[async_trait]
impl ChatProvider for DisabledChat {
    fn model_name(&self) -> &str {
        "disabled"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        bail!("LLM provider is disabled")
    }
}

// ============ OpenAI-compatible Provider ============

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f64,
    system_prompt: Option<String>,
    max_retries: u32,
}

impl OpenAiCompatProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let model = config
            .model_or_default()
            .ok_or_else(|| anyhow::anyhow!("llm.model required for provider '{}'", config.provider))?;
        let base = config.base_url_or_default().ok_or_else(|| {
            anyhow::anyhow!("llm.base_url required for provider '{}'", config.provider)
        })?;

        let api_key = match config.api_key_env_or_default() {
            Some(var) => match std::env::var(&var) {
                Ok(key) => Some(key),
                Err(_) if config.provider == "custom" => None,
                Err(_) => bail!("{} environment variable not set", var),
            },
            None => None,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base.trim_end_matches('/')),
            model,
            api_key,
            temperature: config.temperature,
            system_prompt: config.system_prompt.clone(),
            max_retries: config.max_retries,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn messages(&self, prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(prompt));
        messages
    }

    fn request<'a>(&'a self, prompt: &str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: self.messages(prompt),
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = self.request(prompt);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let mut req = self.client.post(&self.endpoint).json(&body);
            if let Some(key) = &self.api_key {
                req = req.header("Authorization", format!("Bearer {}", key));
            }

            tracing::debug!(model = %self.model, attempt, "sending chat completion request");

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_completion(&json);
                    }

                    // Rate limited or server error, retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        tracing::warn!(%status, attempt, "chat completion failed");
                        last_err = Some(anyhow::anyhow!("LLM API error {}: {}", status, body_text));
                        continue;
                    }

                    // Client error (not 429), no retry
                    let body_text = response.text().await.unwrap_or_default();
                    bail!("LLM API error {}: {}", status, body_text);
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "chat completion request failed");
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("LLM request failed after retries")))
    }
}

/// Extract `choices[0].message.content` from a chat completion response.
fn parse_completion(json: &serde_json::Value) -> Result<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid LLM response: missing choices[0].message.content"))
}
