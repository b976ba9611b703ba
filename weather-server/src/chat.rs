use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use weather_core::{
    AllWeather, CompletionClient, Config, ToolDispatcher,
    llm::{completion_text, fallback},
    prompt,
    tools::GET_ALL_WEATHER,
};

use crate::error::ApiError;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_include_forecast")]
    pub include_forecast: bool,
}

fn default_include_forecast() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_data: Option<AllWeather>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<String>>,
}

/// Read-only state shared by every request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: ToolDispatcher,
    pub llm: CompletionClient,
}

impl AppState {
    pub fn new(config: Config, dispatcher: ToolDispatcher, llm: CompletionClient) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher,
            llm,
        }
    }

    /// Answer one question: fetch all weather, assemble the prompt, complete.
    pub async fn answer(&self, request: &ChatRequest) -> Result<ChatResponse, ApiError> {
        let envelope = self.dispatcher.call_tool(GET_ALL_WEATHER, None).await;
        let weather = envelope
            .result
            .as_all_weather()
            .ok_or_else(|| ApiError::UnexpectedToolResult {
                tool: envelope.tool_name.clone(),
            })?;

        let messages = prompt::build_messages(
            self.config.system_prompt(),
            &request.message,
            weather,
            request.include_forecast,
            Local::now().time(),
        );

        let completion = self.llm.create_completion(&messages, None, Some(weather)).await;

        let response = match completion_text(&completion) {
            Some(text) => text.to_string(),
            None => {
                tracing::warn!("completion carried no text, answering locally");
                fallback::reply(&messages, Some(weather), &self.config.location)
            }
        };

        Ok(ChatResponse {
            response,
            weather_data: Some(weather.clone()),
            tool_calls: Some(vec![envelope.tool_name]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_forecast_defaults_to_true() {
        let request: ChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert!(request.include_forecast);

        let request: ChatRequest =
            serde_json::from_str(r#"{"message":"hi","include_forecast":false}"#).unwrap();
        assert!(!request.include_forecast);
    }

    #[test]
    fn optional_fields_are_omitted() {
        let response = ChatResponse {
            response: "ok".into(),
            weather_data: None,
            tool_calls: None,
        };

        assert_eq!(serde_json::to_string(&response).unwrap(), r#"{"response":"ok"}"#);
    }
}
