use std::env;
use thiserror::Error;

pub const DEFAULT_API_VERSION: &str = "2023-05-15";

/// Every secret the app needs, in the order the debug report shows them.
pub const REQUIRED_KEYS: [&str; 7] = [
    "AZURE_OPENAI_ENDPOINT",
    "AZURE_OPENAI_KEY",
    "AZURE_EMBEDDING_DEPLOYMENT",
    "AZURE_CHAT_DEPLOYMENT",
    "AZURE_SEARCH_ENDPOINT",
    "AZURE_SEARCH_KEY",
    "AZURE_SEARCH_INDEX_NAME",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing secrets: {}", .0.join(", "))]
    MissingSecrets(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_endpoint: String,
    pub openai_key: String,
    pub openai_api_version: String,
    pub embedding_deployment: String,
    pub chat_deployment: String,
    pub search_endpoint: String,
    pub search_key: String,
    pub search_index: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Validates the whole configuration in one pass so a broken deployment
    /// reports every absent key at once instead of one per restart.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut require = |key: &str| -> String {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => value,
                _ => {
                    missing.push(key.to_string());
                    String::new()
                }
            }
        };

        let config = Self {
            openai_endpoint: require("AZURE_OPENAI_ENDPOINT"),
            openai_key: require("AZURE_OPENAI_KEY"),
            embedding_deployment: require("AZURE_EMBEDDING_DEPLOYMENT"),
            chat_deployment: require("AZURE_CHAT_DEPLOYMENT"),
            search_endpoint: require("AZURE_SEARCH_ENDPOINT"),
            search_key: require("AZURE_SEARCH_KEY"),
            search_index: require("AZURE_SEARCH_INDEX_NAME"),
            openai_api_version: lookup("AZURE_OPENAI_API_VERSION")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        };

        if missing.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::MissingSecrets(missing))
        }
    }
}
