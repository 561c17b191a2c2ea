// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Environment-based configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// How requests to the upstream API are authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthScheme {
    Bearer,
    ApiKey,
}

impl FromStr for AuthScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bearer" => Ok(AuthScheme::Bearer),
            "api-key" | "x-api-key" | "apikey" => Ok(AuthScheme::ApiKey),
            other => Err(anyhow::anyhow!(
                "Unknown auth scheme: {other}. Supported: bearer, api-key"
            )),
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthScheme::Bearer => write!(f, "bearer"),
            AuthScheme::ApiKey => write!(f, "api-key"),
        }
    }
}

/// Upstream (Hevy) API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HevyConfig {
    /// Base URL of the upstream API
    pub base_url: String,
    /// Credential framing to try first
    pub auth_scheme: AuthScheme,
    /// API key, for the api-key scheme
    pub api_key: Option<String>,
    /// Bearer token, for the bearer scheme
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Database URL (SQLite path)
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Upstream API configuration
    pub hevy: HevyConfig,
    /// Default background sync interval in minutes; the persisted settings
    /// record overrides this at runtime
    pub sync_interval_minutes: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        // Load .env file if it exists
        if let Err(e) = dotenv::dotenv() {
            warn!("No .env file found or failed to load: {}", e);
        }

        let config = ServerConfig {
            http_port: env_var_or("HTTP_PORT", "8081")?
                .parse()
                .context("Invalid HTTP_PORT value")?,
            database_url: env_var_or("DATABASE_URL", "sqlite:./hevy.db")?,
            log_level: env_var_or("RUST_LOG", "info")?,
            hevy: HevyConfig {
                base_url: env_var_or("HEVY_BASE_URL", "https://api.hevyapp.com")?,
                auth_scheme: env_var_or("HEVY_AUTH_SCHEME", "bearer")?
                    .parse()
                    .context("Invalid HEVY_AUTH_SCHEME value")?,
                api_key: env::var("HEVY_API_KEY").ok().filter(|s| !s.is_empty()),
                token: env::var("HEVY_TOKEN").ok().filter(|s| !s.is_empty()),
            },
            sync_interval_minutes: env_var_or("SYNC_INTERVAL_MINUTES", "15")?
                .parse()
                .context("Invalid SYNC_INTERVAL_MINUTES value")?,
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.database_url.is_empty() {
            return Err(anyhow::anyhow!("DATABASE_URL cannot be empty"));
        }

        url::Url::parse(&self.hevy.base_url).context("Invalid HEVY_BASE_URL")?;

        if self.sync_interval_minutes == 0 {
            return Err(anyhow::anyhow!("SYNC_INTERVAL_MINUTES must be at least 1"));
        }

        if self.hevy.api_key.is_none() && self.hevy.token.is_none() {
            warn!("No HEVY_API_KEY or HEVY_TOKEN configured; upstream syncs will fail with 401");
        }

        Ok(())
    }

    /// Configuration summary for logging (without secrets)
    pub fn summary(&self) -> String {
        format!(
            "Hevy Dashboard Server Configuration:\n\
             - HTTP Port: {}\n\
             - Database: {}\n\
             - Upstream: {}\n\
             - Auth Scheme: {}\n\
             - Has API Key: {}\n\
             - Has Token: {}\n\
             - Sync Interval: {} min",
            self.http_port,
            if self.database_url.starts_with("sqlite:") {
                "SQLite"
            } else {
                "External DB"
            },
            self.hevy.base_url,
            self.hevy.auth_scheme,
            self.hevy.api_key.is_some(),
            self.hevy.token.is_some(),
            self.sync_interval_minutes
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> Result<String> {
    Ok(env::var(key).unwrap_or_else(|_| default.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ServerConfig {
        ServerConfig {
            http_port: 8081,
            database_url: "sqlite::memory:".to_string(),
            log_level: "info".to_string(),
            hevy: HevyConfig {
                base_url: "https://api.hevyapp.com".to_string(),
                auth_scheme: AuthScheme::Bearer,
                api_key: None,
                token: Some("tok".to_string()),
            },
            sync_interval_minutes: 15,
        }
    }

    #[test]
    fn test_auth_scheme_parsing() {
        assert_eq!("bearer".parse::<AuthScheme>().unwrap(), AuthScheme::Bearer);
        assert_eq!("api-key".parse::<AuthScheme>().unwrap(), AuthScheme::ApiKey);
        assert_eq!("X-API-KEY".parse::<AuthScheme>().unwrap(), AuthScheme::ApiKey);
        assert!("oauth2".parse::<AuthScheme>().is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = base_config();
        assert!(config.validate().is_ok());

        config.hevy.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.hevy.base_url = "https://api.hevyapp.com".to_string();
        config.sync_interval_minutes = 0;
        assert!(config.validate().is_err());

        config.sync_interval_minutes = 5;
        config.database_url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_summary_redacts_credentials() {
        let config = base_config();
        let summary = config.summary();
        assert!(!summary.contains("tok"));
        assert!(summary.contains("Has Token: true"));
    }
}
