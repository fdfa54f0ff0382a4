//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults. A `.env` file is loaded by the binaries before
//! [`Config::from_env`] runs.

use crate::orchestrator::config::ResearchConfig;
use serde::Serialize;
use std::env;

/// Default DeepSeek API base URL (the client appends `/chat/completions`)
pub const DEEPSEEK_DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";

/// Default Tavily API base URL
pub const TAVILY_DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Default SerpAPI base URL
pub const SERPAPI_DEFAULT_BASE_URL: &str = "https://serpapi.com";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Generative backend configuration
    pub deepseek: DeepSeekConfig,
    /// Retrieval backend configuration
    pub search: SearchConfig,
    /// Research pipeline budgets
    pub research: ResearchConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// DeepSeek chat completions client configuration
#[derive(Debug, Clone)]
pub struct DeepSeekConfig {
    /// API key; `None` when unset or blank
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after a timeout or connection failure
    pub max_retries: u32,
    /// Delay between retries in milliseconds
    pub retry_delay_ms: u64,
    /// Prompts longer than this are cut before sending
    pub max_prompt_chars: usize,
    /// Hard cap applied to every request's max_tokens
    pub max_output_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEEPSEEK_DEFAULT_BASE_URL.to_string(),
            model: "deepseek-chat".to_string(),
            timeout_secs: 90,
            max_retries: 2,
            retry_delay_ms: 2000,
            max_prompt_chars: 4000,
            max_output_tokens: 2000,
            temperature: 0.7,
        }
    }
}

/// Search providers configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Tavily API key
    pub tavily_api_key: Option<String>,
    /// SerpAPI key
    pub serpapi_api_key: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Include encyclopedic results in comprehensive searches
    pub wikipedia_enabled: bool,
    /// Wikipedia language subdomain
    pub wikipedia_lang: String,
    /// Tavily base URL
    pub tavily_base_url: String,
    /// SerpAPI base URL
    pub serpapi_base_url: String,
    /// Wikipedia base URL; derived from the language when unset
    pub wikipedia_base_url: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tavily_api_key: None,
            serpapi_api_key: None,
            timeout_secs: 10,
            wikipedia_enabled: false,
            wikipedia_lang: "en".to_string(),
            tavily_base_url: TAVILY_DEFAULT_BASE_URL.to_string(),
            serpapi_base_url: SERPAPI_DEFAULT_BASE_URL.to_string(),
            wikipedia_base_url: None,
        }
    }
}

impl SearchConfig {
    /// Wikipedia base URL for the configured language
    pub fn wikipedia_url(&self) -> String {
        self.wikipedia_base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}.wikipedia.org", self.wikipedia_lang))
    }
}

/// Which external services have credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigReadiness {
    /// DeepSeek API key present
    pub deepseek: bool,
    /// Tavily API key present
    pub tavily: bool,
    /// SerpAPI key present
    pub serpapi: bool,
    /// Encyclopedic search enabled
    pub wikipedia: bool,
}

impl ConfigReadiness {
    /// At least one web search provider is configured
    pub fn has_web_search(&self) -> bool {
        self.tavily || self.serpapi
    }
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let deepseek_defaults = DeepSeekConfig::default();
        let search_defaults = SearchConfig::default();

        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8000),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            deepseek: DeepSeekConfig {
                api_key: env_api_key("DEEPSEEK_API_KEY"),
                base_url: env_non_empty("DEEPSEEK_BASE_URL")
                    .unwrap_or(deepseek_defaults.base_url),
                model: env_non_empty("DEEPSEEK_MODEL").unwrap_or(deepseek_defaults.model),
                timeout_secs: env_parse("DEEPSEEK_TIMEOUT_SECS")
                    .unwrap_or(deepseek_defaults.timeout_secs),
                max_retries: env_parse("DEEPSEEK_MAX_RETRIES")
                    .unwrap_or(deepseek_defaults.max_retries),
                retry_delay_ms: env_parse("DEEPSEEK_RETRY_DELAY_MS")
                    .unwrap_or(deepseek_defaults.retry_delay_ms),
                max_prompt_chars: env_parse("DEEPSEEK_MAX_PROMPT_CHARS")
                    .unwrap_or(deepseek_defaults.max_prompt_chars),
                max_output_tokens: deepseek_defaults.max_output_tokens,
                temperature: env_parse("DEEPSEEK_TEMPERATURE")
                    .unwrap_or(deepseek_defaults.temperature),
            },
            search: SearchConfig {
                tavily_api_key: env_api_key("TAVILY_API_KEY"),
                serpapi_api_key: env_api_key("SERPAPI_API_KEY"),
                timeout_secs: env_parse("SEARCH_TIMEOUT_SECS")
                    .unwrap_or(search_defaults.timeout_secs),
                wikipedia_enabled: env_flag("WIKIPEDIA_ENABLED")
                    .unwrap_or(search_defaults.wikipedia_enabled),
                wikipedia_lang: env_non_empty("WIKIPEDIA_LANG")
                    .unwrap_or(search_defaults.wikipedia_lang),
                ..search_defaults
            },
            research: ResearchConfig::from_env(),
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Credential status of the external services
    pub fn readiness(&self) -> ConfigReadiness {
        ConfigReadiness {
            deepseek: self.deepseek.api_key.is_some(),
            tavily: self.search.tavily_api_key.is_some(),
            serpapi: self.search.serpapi_api_key.is_some(),
            wikipedia: self.search.wikipedia_enabled,
        }
    }
}

/// Trimmed value of `key`; blank values count as unset
fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// API key from `key`; blank values and `.env` template placeholders
/// (`your_..._here`) count as unset
fn env_api_key(key: &str) -> Option<String> {
    env_non_empty(key).filter(|v| !is_placeholder_key(v))
}

fn is_placeholder_key(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("your_") && lower.ends_with("_here")
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_non_empty(key).and_then(|v| v.parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    env_non_empty(key).and_then(|v| match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}
