use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::ConfigError;

pub const DEFAULT_STATION_ID: &str = "IROME8278";
pub const DEFAULT_LOCATION: &str = "Rome, Italy";
pub const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";
pub const DEFAULT_LLM_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://www.wunderground.com";

/// Credential value that means "no real key, run in demo mode".
pub const DEMO_API_KEY: &str = "demo_key";

/// File in the working directory that may hold the API key.
pub const API_KEY_FILE: &str = ".openrouter_api_key";

/// Chat-completion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Overrides the built-in system prompt when set.
    pub system_prompt: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            timeout_secs: 30,
            system_prompt: None,
        }
    }
}

/// Where station data is scraped from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    pub base_url: String,
    /// Path of the forecast page, the station id is appended to it.
    pub forecast_path: String,
    pub timeout_secs: u64,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
            forecast_path: "/weather/it/rome".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Top-level configuration.
///
/// Example TOML:
/// station_id = "IROME8278"
/// location = "Rome, Italy"
///
/// [llm]
/// model = "openai/gpt-3.5-turbo"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub station_id: String,
    pub location: String,
    pub llm: LlmConfig,
    pub station: StationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            station_id: DEFAULT_STATION_ID.to_string(),
            location: DEFAULT_LOCATION.to_string(),
            llm: LlmConfig::default(),
            station: StationConfig::default(),
        }
    }
}

impl Config {
    /// Load the config file (if any), then apply the API key file and
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_overrides(Path::new(API_KEY_FILE), |name| std::env::var(name).ok());

        Ok(cfg)
    }

    /// Fill a missing key from `key_file`, apply env overrides, then report
    /// whether the result runs in demo mode.
    fn apply_overrides<F>(&mut self, key_file: &Path, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.llm.api_key.is_none() {
            self.llm.api_key = read_key_file(key_file);
        }
        self.apply_env(lookup);

        if self.is_demo_mode() {
            tracing::warn!(
                "no API key in config, {} or OPENROUTER_API_KEY, running in demo mode",
                key_file.display()
            );
        }
    }

    /// Read a TOML config file, or return defaults if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Override fields from environment-style variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("STATION_ID") {
            self.station_id = v;
        }
        if let Some(v) = non_empty("LOCATION") {
            self.location = v;
        }
        if let Some(v) = non_empty("TOOL_CALLING_OPENROUTER_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = non_empty("OPENROUTER_API_KEY") {
            self.llm.api_key = Some(v.trim().to_string());
        }
        if let Some(v) = non_empty("OPENROUTER_BASE_URL") {
            self.llm.base_url = v;
        }
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let toml = toml::to_string_pretty(self)?;

        fs::write(path, toml).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("dev", "weather-llm", "weather-llm")
            .ok_or(ConfigError::NoConfigDir)?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// True when no usable credential is configured.
    pub fn is_demo_mode(&self) -> bool {
        self.api_key().is_none()
    }

    /// The API key, unless it is absent, blank or the demo marker.
    pub fn api_key(&self) -> Option<&str> {
        self.llm
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && *k != DEMO_API_KEY)
    }

    pub fn system_prompt(&self) -> &str {
        self.llm
            .system_prompt
            .as_deref()
            .unwrap_or(crate::prompt::DEFAULT_SYSTEM_PROMPT)
    }

    /// Copy of the config that is safe to print.
    pub fn redacted(&self) -> Self {
        let mut cfg = self.clone();
        if cfg.llm.api_key.is_some() {
            cfg.llm.api_key = Some("***".to_string());
        }
        cfg
    }
}

fn read_key_file(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let key = contents.trim();
            (!key.is_empty()).then(|| key.to_string())
        }
        Err(err) => {
            tracing::debug!("{} not read: {err}", path.display());
            None
        }
    }
}
