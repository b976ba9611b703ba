use thiserror::Error;

/// Failures while extracting data from a scraped station page.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("page has no embedded application state")]
    MissingState,

    #[error("embedded application state is not valid JSON: {0}")]
    InvalidState(#[from] serde_json::Error),

    #[error("no {0} found in application state")]
    MissingSection(&'static str),

    #[error("field '{0}' missing or not a number")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine platform config directory")]
    NoConfigDir,

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize configuration to TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}
