// src/config.rs
//! Startup configuration, read once from the environment and passed down explicitly.

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_GROQ_TIMEOUT_SECS: u64 = 120;
const DEFAULT_SUPABASE_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Zero disables retries.
    pub retry_max_elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreConfig {
    Memory,
    Postgres { database_url: String },
    Supabase { url: String, key: String, timeout: Duration },
    Disabled,
}

impl StoreConfig {
    pub fn name(&self) -> &'static str {
        match self {
            StoreConfig::Memory => "memory",
            StoreConfig::Postgres { .. } => "postgres",
            StoreConfig::Supabase { .. } => "supabase",
            StoreConfig::Disabled => "disabled",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub groq: Option<GroqConfig>,
    pub store: StoreConfig,
    pub json_logs: bool,
    /// `RUST_LOG` directives; `None` selects the build-dependent default.
    pub log_filter: Option<String>,
}

impl Config {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values behave like unset ones
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let groq = match get("GROQ_API_KEY") {
            Some(api_key) => Some(GroqConfig {
                api_key,
                model: get("GROQ_MODEL").unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string()),
                base_url: get("GROQ_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                timeout: Duration::from_secs(parse_secs(
                    "GROQ_TIMEOUT_SECS",
                    get("GROQ_TIMEOUT_SECS"),
                    DEFAULT_GROQ_TIMEOUT_SECS,
                )?),
                retry_max_elapsed: Duration::from_secs(parse_secs(
                    "GROQ_RETRY_MAX_ELAPSED_SECS",
                    get("GROQ_RETRY_MAX_ELAPSED_SECS"),
                    0,
                )?),
            }),
            None => None,
        };

        let store = if get("CHAT_STORE").as_deref() == Some("memory") {
            StoreConfig::Memory
        } else if let Some(database_url) = get("DATABASE_URL") {
            StoreConfig::Postgres { database_url }
        } else {
            match (get("SUPABASE_URL"), get("SUPABASE_KEY")) {
                (Some(url), Some(key)) => StoreConfig::Supabase {
                    url: url.trim_end_matches('/').to_string(),
                    key,
                    timeout: Duration::from_secs(parse_secs(
                        "SUPABASE_TIMEOUT_SECS",
                        get("SUPABASE_TIMEOUT_SECS"),
                        DEFAULT_SUPABASE_TIMEOUT_SECS,
                    )?),
                },
                _ => StoreConfig::Disabled,
            }
        };

        Ok(Self {
            bind_addr,
            groq,
            store,
            json_logs: get("LOG_FORMAT").as_deref() == Some("json"),
            log_filter: get("RUST_LOG"),
        })
    }
}

fn parse_secs(key: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
