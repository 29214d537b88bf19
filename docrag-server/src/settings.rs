//! Environment-driven configuration.
//!
//! Settings are loaded once at startup and passed by reference into every
//! component; nothing reads the environment after this point.

use docrag_core::{RagError, Result};

/// Application settings. Every field has a default except the OpenAI API
/// key, whose absence is a fatal startup error.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: String,
    pub openai_embed_model: String,
    pub openai_embed_dim: usize,
    pub openai_chat_model: String,
    /// Override for the OpenAI API base URL (self-hosted gateways).
    pub openai_base_url: Option<String>,
    pub qdrant_url: String,
    pub qdrant_collection: String,
    pub qdrant_timeout_secs: u64,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub app_name: String,
    /// Identifier reported to orchestration tooling and used as the logging
    /// service name.
    pub app_id: String,
    /// development, staging, or production; production switches logs to JSON.
    pub app_env: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

impl Settings {
    /// Load and validate settings from the environment. The caller is
    /// expected to have merged `.env` beforehand.
    pub fn from_env() -> Result<Self> {
        let settings = Self {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_embed_model: env_or("OPENAI_EMBED_MODEL", "text-embedding-3-large"),
            openai_embed_dim: parse_env("OPENAI_EMBED_DIM", 3072)?,
            openai_chat_model: env_or("OPENAI_CHAT_MODEL", "gpt-4o-mini"),
            openai_base_url: optional_env("OPENAI_BASE_URL"),
            qdrant_url: env_or("QDRANT_URL", "http://localhost:6334"),
            qdrant_collection: env_or("QDRANT_COLLECTION", "docs"),
            qdrant_timeout_secs: parse_env("QDRANT_TIMEOUT_SECS", 30)?,
            chunk_size: parse_env("CHUNK_SIZE", 1000)?,
            chunk_overlap: parse_env("CHUNK_OVERLAP", 200)?,
            app_name: env_or("APP_NAME", "docrag"),
            app_id: env_or("APP_ID", "docrag"),
            app_env: env_or("APP_ENV", "development"),
            log_level: env_or("LOG_LEVEL", "info"),
            host: env_or("HOST", "127.0.0.1"),
            port: parse_env("PORT", 8000)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Reject value combinations that would otherwise fail later in
    /// confusing ways.
    pub fn validate(&self) -> Result<()> {
        if self.openai_api_key.trim().is_empty() {
            return Err(config_error("OPENAI_API_KEY must not be empty"));
        }
        if self.openai_embed_dim == 0 {
            return Err(config_error("OPENAI_EMBED_DIM must be positive"));
        }
        if self.chunk_size == 0 {
            return Err(config_error("CHUNK_SIZE must be positive"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(config_error("CHUNK_OVERLAP must be smaller than CHUNK_SIZE"));
        }
        if self.qdrant_collection.trim().is_empty() {
            return Err(config_error("QDRANT_COLLECTION must not be empty"));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}

fn config_error(message: &str) -> RagError {
    RagError::Configuration {
        message: message.to_owned(),
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_owned())
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| RagError::Configuration {
            message: format!("{key} is required"),
        })
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.is_empty() => raw.parse().map_err(|e| RagError::Configuration {
            message: format!("{key} has an invalid value: {e}"),
        }),
        _ => Ok(default),
    }
}
