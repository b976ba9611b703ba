use anyhow::{Context, Result, anyhow};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::{Config, config::DEFAULT_LOCATION, model::AllWeather, tools::FunctionTool};

pub mod fallback;

const REFERER: &str = "http://localhost:8000";
const TITLE: &str = "Weather LLM Demo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [FunctionTool]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a str>,
}

/// Chat-completion client with a local fallback.
///
/// Without a credential no request is made. With one, a single POST is sent;
/// a non-200 status, a transport error or an unreadable body all end in a
/// synthesized reply shaped like a real completion.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    /// Named by fallback greetings.
    location: String,
}

impl CompletionClient {
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build completion HTTP client")?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            location: DEFAULT_LOCATION.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut client = Self::new(
            config.api_key().map(str::to_string),
            &config.llm.base_url,
            &config.llm.model,
            Duration::from_secs(config.llm.timeout_secs),
        )?;
        client.temperature = config.llm.temperature;
        client.max_tokens = config.llm.max_tokens;
        client.location = config.location.clone();
        Ok(client)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_demo(&self) -> bool {
        self.api_key.is_none()
    }

    /// Complete `messages`. Never fails: every error path returns a fallback
    /// reply grounded on `weather`.
    pub async fn create_completion(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[FunctionTool]>,
        weather: Option<&AllWeather>,
    ) -> Value {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!("no API key configured, answering in demo mode");
            return fallback::demo_response(messages, weather, &self.location);
        };

        match self.request(api_key, messages, tools).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!("Using demo mode due to: {err:#}");
                fallback::demo_response(messages, weather, &self.location)
            }
        }
    }

    async fn request(
        &self,
        api_key: &str,
        messages: &[ChatMessage],
        tools: Option<&[FunctionTool]>,
    ) -> Result<Value> {
        let payload = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools,
            tool_choice: tools.map(|_| "auto"),
        };

        let res = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&payload)
            .send()
            .await
            .context("Failed to send chat completion request")?;

        let status = res.status();
        if status != StatusCode::OK {
            return Err(anyhow!("chat completion request failed with status {status}"));
        }

        res.json::<Value>()
            .await
            .context("Failed to parse chat completion JSON")
    }
}

/// Text of the first choice, if the response carries one.
pub fn completion_text(response: &Value) -> Option<&str> {
    response
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .filter(|s| !s.trim().is_empty())
}
