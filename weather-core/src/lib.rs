//! Core library for the weather LLM demo.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Station data sources and the fallback-producing weather agent
//! - The weather tool registry and dispatcher
//! - Prompt assembly and the chat-completion client with its local fallback
//!
//! It is used by the `weather-llm` server, but can also be reused by other binaries.

pub mod config;
pub mod error;
pub mod llm;
pub mod model;
pub mod prompt;
pub mod provider;
pub mod tools;

pub use config::{Config, LlmConfig, StationConfig};
pub use error::{ConfigError, ScrapeError};
pub use llm::{ChatMessage, CompletionClient, Role};
pub use model::{AllWeather, DayForecast, ExtendedDay, Forecast, WeatherSnapshot};
pub use provider::{WeatherAgent, WeatherSource};
pub use tools::{ToolCallEnvelope, ToolDescriptor, ToolDispatcher, ToolResult};
