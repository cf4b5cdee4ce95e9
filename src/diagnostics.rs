use std::env;

use anyhow::Result;

use crate::config::{DEFAULT_API_VERSION, REQUIRED_KEYS};
use crate::database::search_index::{SearchError, SearchIndexClient};
use crate::llm::history::Turn;
use crate::providers::traits::CompletionProvider;

const PROBE_PROMPT: &str = "Hello, are you working?";
const PROBE_MAX_TOKENS: u16 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretStatus {
    /// Value is set. Key-bearing secrets are masked, everything else is
    /// shown as-is.
    Present(String),
    Missing,
}

/// Presence report over every required configuration value, for the debug
/// command. Never exposes secret values.
#[derive(Debug)]
pub struct ConfigReport {
    pub entries: Vec<(String, SecretStatus)>,
}

impl ConfigReport {
    pub fn from_env() -> Self {
        Self::collect(|key| env::var(key).ok())
    }

    pub fn collect<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut entries = Vec::with_capacity(REQUIRED_KEYS.len() + 1);

        for key in REQUIRED_KEYS {
            let status = match lookup(key) {
                Some(value) if !value.trim().is_empty() => {
                    if is_secret(key) {
                        SecretStatus::Present("found (hidden)".to_string())
                    } else {
                        SecretStatus::Present(value)
                    }
                }
                _ => SecretStatus::Missing,
            };
            entries.push((key.to_string(), status));
        }

        let api_version = lookup("AZURE_OPENAI_API_VERSION")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| format!("{DEFAULT_API_VERSION} (default)"));
        entries.push((
            "AZURE_OPENAI_API_VERSION".to_string(),
            SecretStatus::Present(api_version),
        ));

        Self { entries }
    }

    pub fn all_present(&self) -> bool {
        self.entries
            .iter()
            .all(|(_, status)| !matches!(status, SecretStatus::Missing))
    }

    pub fn missing_keys(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, status)| matches!(status, SecretStatus::Missing))
            .map(|(key, _)| key.as_str())
            .collect()
    }
}

fn is_secret(key: &str) -> bool {
    key.ends_with("_KEY")
}

/// One tiny completion round-trip. Returns the model's reply so the user can
/// see the endpoint actually answered.
pub async fn probe_chat(provider: &dyn CompletionProvider) -> Result<String> {
    provider
        .complete(&[Turn::user(PROBE_PROMPT)], 0.0, PROBE_MAX_TOKENS)
        .await
}

/// One keyword search round-trip against the index.
pub async fn probe_search(client: &SearchIndexClient) -> Result<(), SearchError> {
    client.ping().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_with_all_keys() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com"),
            ("AZURE_OPENAI_KEY", "super-secret"),
            ("AZURE_EMBEDDING_DEPLOYMENT", "text-embedding-ada-002"),
            ("AZURE_CHAT_DEPLOYMENT", "gpt-35-turbo"),
            ("AZURE_SEARCH_ENDPOINT", "https://example.search.windows.net"),
            ("AZURE_SEARCH_KEY", "also-secret"),
            ("AZURE_SEARCH_INDEX_NAME", "hydrotest-docs"),
        ])
    }

    #[test]
    fn masks_key_bearing_values() {
        let env = env_with_all_keys();
        let report = ConfigReport::collect(|k| env.get(k).map(|v| v.to_string()));

        let openai_key = report
            .entries
            .iter()
            .find(|(key, _)| key == "AZURE_OPENAI_KEY")
            .unwrap();
        assert_eq!(
            openai_key.1,
            SecretStatus::Present("found (hidden)".to_string())
        );

        let endpoint = report
            .entries
            .iter()
            .find(|(key, _)| key == "AZURE_OPENAI_ENDPOINT")
            .unwrap();
        assert_eq!(
            endpoint.1,
            SecretStatus::Present("https://example.openai.azure.com".to_string())
        );
    }

    #[test]
    fn reports_missing_keys() {
        let mut env = env_with_all_keys();
        env.remove("AZURE_SEARCH_KEY");

        let report = ConfigReport::collect(|k| env.get(k).map(|v| v.to_string()));
        assert!(!report.all_present());
        assert_eq!(report.missing_keys(), vec!["AZURE_SEARCH_KEY"]);
    }

    #[test]
    fn api_version_falls_back_to_default() {
        let env = env_with_all_keys();
        let report = ConfigReport::collect(|k| env.get(k).map(|v| v.to_string()));

        let version = report
            .entries
            .iter()
            .find(|(key, _)| key == "AZURE_OPENAI_API_VERSION")
            .unwrap();
        assert_eq!(
            version.1,
            SecretStatus::Present("2023-05-15 (default)".to_string())
        );
        assert!(report.all_present());
    }
}
