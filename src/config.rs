//! Configuration management for the Azure Pricing MCP Server
//!
//! Handles environment variables, defaults, and pricing API constants.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Configuration for the Azure Pricing MCP Server
#[derive(Debug, Clone)]
pub struct Config {
    /// Azure Retail Prices API endpoint
    pub api_base_url: String,

    /// Value sent as the `api-version` query parameter
    pub api_version: String,

    /// Timeout for a single upstream HTTP request
    pub request_timeout: Duration,

    /// Upper bound on one tool invocation inside a session
    pub tool_timeout: Duration,

    /// Maximum rendered length of a tool response, in characters
    pub character_limit: usize,

    /// Bind address for the WebSocket server
    pub host: String,

    /// Bind port for the WebSocket server
    pub port: u16,
}

impl Config {
    /// Create a new configuration from the process environment
    pub fn new() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Create a configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url =
            lookup("AZURE_PRICING_API_URL").unwrap_or_else(|| pricing::API_BASE_URL.to_string());

        let api_version =
            lookup("AZURE_PRICING_API_VERSION").unwrap_or_else(|| pricing::API_VERSION.to_string());

        let request_timeout_secs: u64 = parse_var(&lookup, "AZURE_PRICING_TIMEOUT_SECS", 30)?;
        let tool_timeout_secs: u64 = parse_var(&lookup, "AZURE_PRICING_TOOL_TIMEOUT_SECS", 45)?;

        let character_limit: usize = parse_var(
            &lookup,
            "AZURE_PRICING_CHARACTER_LIMIT",
            pricing::CHARACTER_LIMIT,
        )?;

        let host = lookup("AZURE_PRICING_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_var(&lookup, "PORT", 8000)?;

        let config = Self {
            api_base_url,
            api_version,
            request_timeout: Duration::from_secs(request_timeout_secs),
            tool_timeout: Duration::from_secs(tool_timeout_secs),
            character_limit,
            host,
            port,
        };
        config.check()?;

        Ok(config)
    }

    /// Reject settings the server cannot run with
    pub fn check(&self) -> Result<()> {
        if self.character_limit == 0 {
            return Err(ConfigError::InvalidConfig {
                message: "character limit must be greater than zero".to_string(),
            }
            .into());
        }

        if self.request_timeout.is_zero() || self.tool_timeout.is_zero() {
            return Err(ConfigError::InvalidConfig {
                message: "timeouts must be greater than zero".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Socket address string for the WebSocket server
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, var: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|_| {
                ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    value: value.clone(),
                }
                .into()
            })
        }
        None => Ok(default),
    }
}

/// Azure Retail Prices API constants
pub mod pricing {
    /// Base URL for the Azure Retail Prices API
    pub const API_BASE_URL: &str = "https://prices.azure.com/api/retail/prices";

    /// API version sent with every request
    pub const API_VERSION: &str = "2023-01-01-preview";

    /// Default response budget in characters
    pub const CHARACTER_LIMIT: usize = 25_000;

    /// Default number of records requested by list-style tools
    pub const DEFAULT_LIMIT: u32 = 100;

    /// Largest `$top` the API accepts
    pub const MAX_LIMIT: u32 = 1000;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_base_url, pricing::API_BASE_URL);
        assert_eq!(config.api_version, "2023-01-01-preview");
        assert_eq!(config.character_limit, 25_000);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("AZURE_PRICING_CHARACTER_LIMIT", "5000"),
            ("PORT", "9100"),
            ("AZURE_PRICING_HOST", "127.0.0.1"),
        ]))
        .unwrap();
        assert_eq!(config.character_limit, 5000);
        assert_eq!(config.bind_addr(), "127.0.0.1:9100");
    }

    #[test]
    fn test_config_rejects_bad_number() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_config_rejects_zero_limit() {
        let result = Config::from_lookup(lookup_from(&[("AZURE_PRICING_CHARACTER_LIMIT", "0")]));
        assert!(result.is_err());
    }
}
