//! OpenAI-compatible `/chat/completions` client.
//!
//! Credentials come from the environment: `OPENAI_API_KEY` (required),
//! `OPENAI_BASE_URL` and `OPENAI_MODEL` (optional).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LlmError, LlmResult};
use crate::generator::{ChatRole, GenerationRequest, TextGenerator};

pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const OPENAI_MODEL_VAR: &str = "OPENAI_MODEL";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Connection settings for an OpenAI-compatible API.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Client-side ceiling on a single HTTP exchange
    pub timeout: Duration,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiConfig {
    /// Config for the public API with the given key.
    pub fn new(api_key: &str) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.trim().to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Read the config from process environment variables.
    ///
    /// `default_model` applies when `OPENAI_MODEL` is unset.
    pub fn from_env(default_model: &str) -> LlmResult<Self> {
        Self::from_lookup(default_model, |key| std::env::var(key).ok())
    }

    /// Read the config through an arbitrary variable lookup.
    pub fn from_lookup<F>(default_model: &str, lookup: F) -> LlmResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = non_blank(OPENAI_API_KEY_VAR)
            .ok_or_else(|| LlmError::MissingApiKey(OPENAI_API_KEY_VAR.to_string()))?;

        let mut config = Self::new(&api_key).with_model(default_model);
        if let Some(base_url) = non_blank(OPENAI_BASE_URL_VAR) {
            config = config.with_base_url(&base_url);
        }
        if let Some(model) = non_blank(OPENAI_MODEL_VAR) {
            config = config.with_model(&model);
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Chat-completions client implementing [`TextGenerator`].
pub struct OpenAiClient {
    config: OpenAiConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> LlmResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Client(e.to_string()))?;
        Ok(Self { config, http })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, request: GenerationRequest) -> LlmResult<String> {
        let body = wire_request(&self.config.model, &request);
        debug!(
            model = %self.config.model,
            messages = body.messages.len(),
            max_tokens = request.max_tokens,
            "sending chat completion"
        );

        let response = self
            .http
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        parse_completion(&text)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: ChatRole,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireReply,
}

#[derive(Debug, Deserialize)]
struct WireReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    error: WireErrorDetail,
}

#[derive(Debug, Deserialize)]
struct WireErrorDetail {
    message: String,
}

/// System instruction first, then the conversation.
fn wire_request<'a>(model: &'a str, request: &'a GenerationRequest) -> WireRequest<'a> {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if !request.system.is_empty() {
        messages.push(WireMessage {
            role: ChatRole::System,
            content: &request.system,
        });
    }
    messages.extend(request.messages.iter().map(|m| WireMessage {
        role: m.role,
        content: &m.content,
    }));

    WireRequest {
        model,
        messages,
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    }
}

fn parse_completion(body: &str) -> LlmResult<String> {
    let response: WireResponse = serde_json::from_str(body)?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyResponse)?;
    Ok(choice.message.content.unwrap_or_default())
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<WireErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.chars().take(200).collect(),
    }
}
