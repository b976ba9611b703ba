//! Fixed registry of weather tools and the dispatcher that runs them.
//!
//! [`TOOLS`] is the only list of tools. The protocol-schema form served at
//! `/api/mcp/tools` and the function-calling form sent to an LLM are both
//! rendered from it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{
    model::{AllWeather, Forecast, WeatherSnapshot},
    provider::WeatherAgent,
};

pub const TOOLS_VERSION: &str = "1.0";

pub const GET_CURRENT_WEATHER: &str = "get_current_weather";
pub const GET_WEATHER_FORECAST: &str = "get_weather_forecast";
pub const GET_ALL_WEATHER: &str = "get_all_weather";

/// A named, zero-argument tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
}

pub static TOOLS: [ToolDescriptor; 3] = [
    ToolDescriptor {
        name: GET_CURRENT_WEATHER,
        description: "Get current weather conditions from the configured weather station",
    },
    ToolDescriptor {
        name: GET_WEATHER_FORECAST,
        description: "Get the weather forecast for the station's location",
    },
    ToolDescriptor {
        name: GET_ALL_WEATHER,
        description: "Get both current conditions and forecast",
    },
];

impl ToolDescriptor {
    pub fn find(name: &str) -> Option<&'static ToolDescriptor> {
        TOOLS.iter().find(|t| t.name == name)
    }

    /// Every tool is nullary, so the schema is always the empty object.
    pub fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {}, "required": [] })
    }

    pub fn to_mcp(&self) -> McpTool {
        McpTool {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema: self.parameters(),
        }
    }

    pub fn to_function(&self) -> FunctionTool {
        FunctionTool {
            kind: "function".to_string(),
            function: FunctionSpec {
                name: self.name.to_string(),
                description: self.description.to_string(),
                parameters: self.parameters(),
            },
        }
    }
}

/// Schema-only rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Function-calling rendering, as chat-completion APIs expect in `tools`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTool {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsDefinition {
    pub version: String,
    pub tools: Vec<McpTool>,
}

pub fn mcp_tools() -> Vec<McpTool> {
    TOOLS.iter().map(ToolDescriptor::to_mcp).collect()
}

pub fn function_tools() -> Vec<FunctionTool> {
    TOOLS.iter().map(ToolDescriptor::to_function).collect()
}

pub fn tools_definition() -> ToolsDefinition {
    ToolsDefinition {
        version: TOOLS_VERSION.to_string(),
        tools: mcp_tools(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResult {
    All(AllWeather),
    Forecast(Forecast),
    Current(WeatherSnapshot),
    Error { error: String },
}

impl ToolResult {
    pub fn as_all_weather(&self) -> Option<&AllWeather> {
        match self {
            ToolResult::All(all) => Some(all),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ToolResult::Error { error } => Some(error),
            _ => None,
        }
    }
}

/// Result of one dispatch, correlated to the tool that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallEnvelope {
    pub tool_call_id: String,
    pub tool_name: String,
    pub result: ToolResult,
}

#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    agent: WeatherAgent,
}

impl ToolDispatcher {
    pub fn new(agent: WeatherAgent) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &WeatherAgent {
        &self.agent
    }

    /// Run a tool by name. Unknown names give an `{error}` result.
    ///
    /// `_args` is accepted for forward compatibility; every tool is nullary.
    pub async fn call_tool(&self, name: &str, _args: Option<&Map<String, Value>>) -> ToolCallEnvelope {
        tracing::debug!("dispatching tool {name}");

        let result = match ToolDescriptor::find(name).map(|tool| tool.name) {
            Some(GET_CURRENT_WEATHER) => ToolResult::Current(self.agent.get_current_conditions().await),
            Some(GET_WEATHER_FORECAST) => ToolResult::Forecast(self.agent.get_forecast().await),
            Some(GET_ALL_WEATHER) => ToolResult::All(self.agent.get_all_weather_data().await),
            _ => {
                tracing::warn!("unknown tool requested: {name}");
                ToolResult::Error {
                    error: format!("Unknown tool: {name}"),
                }
            }
        };

        ToolCallEnvelope {
            tool_call_id: format!("{name}_response"),
            tool_name: name.to_string(),
            result,
        }
    }
}
