// Configuration for the model client, the generation adapters and the server

use std::env;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

// Looked up in order when no key is given explicitly
pub const API_KEY_ENV_VARS: [&str; 3] = ["GEMINI_API_KEY", "GOOGLE_AI_API_KEY", "API_KEY"];

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_ms: 60_000,
        }
    }
}

/// Per-flow model settings.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub model: String,
    pub itinerary_temperature: f32,
    pub search_temperature: f32,
    pub markdown_temperature: f32,
    pub markdown_max_output_tokens: u32,
    pub max_search_results: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            itinerary_temperature: 0.3,
            search_temperature: 0.5,
            markdown_temperature: 0.8,
            markdown_max_output_tokens: 2048,
            max_search_results: 12,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub client: ClientConfig,
    pub generation: GenerationConfig,
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            client: ClientConfig::default(),
            generation: GenerationConfig::default(),
            log_json: false,
        }
    }
}

/// Picks the explicit key if present, otherwise the first non-empty
/// variable from [`API_KEY_ENV_VARS`].
pub fn resolve_api_key(explicit: Option<String>) -> Option<String> {
    first_non_empty(
        explicit
            .into_iter()
            .chain(API_KEY_ENV_VARS.iter().filter_map(|name| env::var(name).ok())),
    )
}

fn first_non_empty(candidates: impl IntoIterator<Item = String>) -> Option<String> {
    candidates
        .into_iter()
        .map(|candidate| candidate.trim().to_string())
        .find(|candidate| !candidate.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_non_empty_skips_blank_values() {
        let picked = first_non_empty(vec![
            "".to_string(),
            "   ".to_string(),
            " key-2 ".to_string(),
            "key-3".to_string(),
        ]);
        assert_eq!(picked.as_deref(), Some("key-2"));
        assert_eq!(first_non_empty(Vec::<String>::new()), None);
    }

    #[test]
    fn test_explicit_key_wins() {
        assert_eq!(
            resolve_api_key(Some("explicit".to_string())).as_deref(),
            Some("explicit")
        );
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.generation.model, "gemini-2.5-flash");
        assert_eq!(config.generation.max_search_results, 12);
        assert!(config.client.api_key.is_none());
    }
}
