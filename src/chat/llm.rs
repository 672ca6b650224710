//! Hosted LLM client
//!
//! Speaks the OpenAI-compatible chat completions protocol (Groq, OpenAI,
//! local gateways). One blocking request per prompt, no streaming.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::ChatConfig;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("no API key configured (set {0})")]
    MissingCredential(String),

    #[error("chat request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("chat API error: HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("chat API returned no completion")]
    EmptyCompletion,
}

/// Generates text for a prompt
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ChatError>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct HostedChatModel {
    base_url: String,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
    temperature: Option<f32>,
    client: reqwest::Client,
}

impl HostedChatModel {
    pub fn new(
        base_url: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("gridcast/0.1"));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            base_url,
            model,
            api_key,
            api_key_env: "API key".to_string(),
            temperature: None,
            client,
        })
    }

    /// Build from configuration, reading the key from the configured env var.
    ///
    /// A missing key is not an error here; each call then fails and the
    /// responder answers with its apology.
    pub fn from_config(cfg: &ChatConfig) -> Result<Self, ChatError> {
        let mut model = Self::new(
            cfg.base_url.clone(),
            cfg.model.clone(),
            cfg.api_key(),
            Duration::from_secs(cfg.http_timeout_seconds),
        )?;
        model.api_key_env = cfg.api_key_env.clone();
        model.temperature = cfg.temperature;
        Ok(model)
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatModel for HostedChatModel {
    async fn complete(&self, prompt: &str) -> Result<String, ChatError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ChatError::MissingCredential(self.api_key_env.clone()))?;

        let body = CompletionRequest {
            model: &self.model,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "chat completion request");
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ChatError::EmptyCompletion)
    }
}
