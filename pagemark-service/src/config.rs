//! Service configuration, loaded once at startup from an optional config
//! file plus `PAGEMARK`-prefixed environment variables.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::error::{ServiceError, ServiceResult};

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Chat-completion backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_chat_url")]
    pub base_url: String,

    /// API credential, normally supplied via `PAGEMARK__CHAT__API_KEY`.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on generated answer length, in tokens.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// How many characters of extracted text are sent with a question.
    /// Text past the budget is not visible to the model, so answers about
    /// the tail of a long document will miss context. Raise this to trade
    /// cost and latency for completeness.
    #[serde(default = "default_context_char_budget")]
    pub context_char_budget: usize,
}

impl ChatConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Size and retention limits
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_bytes: u64,

    /// How long highlighted PDFs stay available for download, in seconds.
    #[serde(default = "default_download_ttl_secs")]
    pub download_ttl_secs: u64,
}

/// Load configuration from file and env vars
pub fn load() -> ServiceResult<StaticConfig> {
    Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(
            Environment::with_prefix("PAGEMARK")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| ServiceError::Config {
            message: format!("Failed to build config: {}", e),
        })?
        .try_deserialize()
        .map_err(|e| ServiceError::Config {
            message: format!("Failed to deserialize config: {}", e),
        })
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_chat_url(),
            api_key: String::new(),
            model: default_model(),
            request_timeout_secs: default_request_timeout_secs(),
            max_output_tokens: default_max_output_tokens(),
            context_char_budget: default_context_char_budget(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_size_bytes: default_max_upload_size(),
            download_ttl_secs: default_download_ttl_secs(),
        }
    }
}

// ==================== Default Value Functions ====================

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_chat_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_max_output_tokens() -> u32 {
    300
}

fn default_context_char_budget() -> usize {
    3000
}

fn default_max_upload_size() -> u64 {
    52_428_800 // 50MB
}

fn default_download_ttl_secs() -> u64 {
    3600
}
