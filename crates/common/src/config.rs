//! Configuration management following 12-factor app principles
//!
//! Runtime configuration is loaded from environment variables to ensure
//! clean separation between code and config. Service-specific settings
//! (Slack, OpenAI, Salesforce) live next to their clients.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_RUST_LOG: &str = "thread2task=debug,tower_http=info";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Port for the local HTTP server
    pub port: u16,

    /// Tracing filter directive
    pub rust_log: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid port number, got '{}'", raw))?,
            None => 3000,
        };

        Ok(Self {
            port,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_RUST_LOG.to_string()),
        })
    }
}

/// Parse a boolean environment flag (`true/false`, `1/0`, `yes/no`)
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a comma-separated list, dropping empty entries
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
