//! LLM client for OpenAI-compatible chat completions (Gemini, OpenRouter, custom)

use anyhow::{Result, Context, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::config::{LlmSettings, Provider};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

// ============ Provider Configuration ============

/// Endpoint and credential for one chat-completions provider
#[derive(Clone)]
pub struct ProviderConfig {
    /// Base URL for the API (e.g., "https://openrouter.ai/api/v1")
    pub base_url: String,
    /// API key for authentication
    pub api_key: String,
    /// Extra headers to include in requests (e.g., X-Title, HTTP-Referer)
    pub extra_headers: Vec<(String, String)>,
}

impl ProviderConfig {
    /// Google Gemini through its OpenAI-compatible endpoint
    pub fn gemini(api_key: String) -> Self {
        Self {
            base_url: GEMINI_BASE_URL.to_string(),
            api_key,
            extra_headers: Vec::new(),
        }
    }

    pub fn openrouter(api_key: String) -> Self {
        Self {
            base_url: OPENROUTER_BASE_URL.to_string(),
            api_key,
            extra_headers: vec![
                ("HTTP-Referer".to_string(), "https://github.com/clinical-panel".to_string()),
                ("X-Title".to_string(), "Clinical Panel".to_string()),
            ],
        }
    }

    pub fn custom(api_key: String, base_url: String) -> Self {
        Self {
            base_url,
            api_key,
            extra_headers: Vec::new(),
        }
    }

    /// Build the provider for a run from configured settings and the caller's key
    pub fn from_settings(settings: &LlmSettings, api_key: String) -> Result<Self> {
        let mut provider = match settings.provider {
            Provider::Gemini => Self::gemini(api_key),
            Provider::OpenRouter => Self::openrouter(api_key),
            Provider::Custom => {
                let base_url = settings.base_url.clone()
                    .context("llm.base_url is required for the custom provider")?;
                Self::custom(api_key, base_url)
            }
        };
        if let Some(url) = &settings.base_url {
            provider.base_url = url.clone();
        }
        provider.base_url = provider.base_url.trim_end_matches('/').to_string();
        Ok(provider)
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("extra_headers", &self.extra_headers)
            .finish()
    }
}

// ============ Messages ============

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    /// String content, or an array of content parts on some providers
    #[serde(default)]
    pub content: Option<Value>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(Value::String(content.into())),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: Some(Value::String(content.into())),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(Value::String(content.into())),
        }
    }

    /// Extract content as plain text, handling both string and array-of-content-parts formats.
    pub fn content_as_text(&self) -> Option<String> {
        self.content.as_ref().and_then(value_as_text)
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => {
            let texts: Vec<&str> = parts.iter().filter_map(|part| {
                if part.get("type").and_then(|t| t.as_str()) == Some("text") {
                    part.get("text").and_then(|t| t.as_str())
                } else {
                    None
                }
            }).collect();
            if texts.is_empty() { None } else { Some(texts.concat()) }
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// One chat-completions call
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(settings: &LlmSettings, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: settings.model.clone(),
            messages,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }
}

/// Anything that can answer a chat-completions request
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

// ============ Client ============

/// Chat-completions client bound to one provider and credential
#[derive(Clone, Debug)]
pub struct LlmClient {
    client: Arc<Client>,
    provider: ProviderConfig,
}

impl LlmClient {
    /// Share an existing reqwest connection pool
    pub fn with_http_client(client: Client, provider: ProviderConfig) -> Self {
        Self {
            client: Arc::new(client),
            provider,
        }
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        tracing::debug!(
            "LLM request: model={} messages={} temperature={}",
            request.model, request.messages.len(), request.temperature
        );

        let mut req_builder = self.client
            .post(format!("{}/chat/completions", self.provider.base_url))
            .bearer_auth(&self.provider.api_key);
        for (key, value) in &self.provider.extra_headers {
            req_builder = req_builder.header(key.as_str(), value.as_str());
        }
        let response = req_builder
            .json(&request)
            .send()
            .await
            .context("Failed to send request to LLM provider")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("LLM API error ({}): {}", status, crate::truncate_safe(&body, 1000));
        }

        let body = response.text().await.context("Failed to read response body")?;
        parse_completion_body(&body)
    }
}

/// Extract the first choice's message text from a chat-completions response body
pub fn parse_completion_body(body: &str) -> Result<String> {
    let raw: Value = serde_json::from_str(body.trim()).map_err(|e| {
        anyhow::anyhow!("Failed to parse JSON response: {} (body: {})",
            e, crate::truncate_safe(body, 500))
    })?;

    if let Some(error) = raw.get("error") {
        bail!("LLM provider returned an error: {}", error);
    }

    let message = raw
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .with_context(|| format!("No message in response (body: {})", crate::truncate_safe(body, 500)))?;

    Ok(message.get("content").and_then(value_as_text).unwrap_or_default())
}
