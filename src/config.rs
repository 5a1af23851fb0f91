//! Configuration management for the Ethos relay.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables (`RELAY_` for server settings, `ETHOS_` for upstream settings)
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use ethos_relay::config::Config;
//!
//! // Parse from command line and environment
//! let config = Config::parse();
//! config.validate()?;
//!
//! println!("Listening on {}", config.bind_address());
//! ```
//!
//! # Environment Variables
//!
//! - `RELAY_HOST` - Server bind address (default: 0.0.0.0)
//! - `RELAY_PORT` - Server port (default: 8787)
//! - `ETHOS_APP_SECRET` - Application API key exchanged for bearer tokens (required)
//! - `ETHOS_AUTH_URL` - Authentication endpoint
//! - `ETHOS_API_BASE` - Base URL of the data API
//! - `RELAY_UPSTREAM_TIMEOUT` - Per-call timeout in seconds (default: 30)
//! - `RELAY_CONNECT_TIMEOUT` - Connect timeout in seconds (default: 10)
//! - `RELAY_REDACT_ERRORS` - Hide transport error details from callers (default: false)

use std::fmt;
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::io::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_UPSTREAM_TIMEOUT};
use crate::relay::{RelaySettings, DEFAULT_API_BASE, DEFAULT_AUTH_URL};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8787;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Ethos Relay - read-only HTTP relay for the Ethos Integration API.
///
/// Accepts browser GET requests on /ethos/<model>[/<id>], exchanges the
/// application secret for a bearer token, and forwards the read upstream with
/// CORS headers attached to the answer.
#[derive(Parser, Clone)]
#[command(name = "ethos-relay")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "RELAY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "RELAY_PORT")]
    pub port: u16,

    // =========================================================================
    // Upstream Configuration
    // =========================================================================
    /// Application secret exchanged for a bearer token on every request.
    #[arg(long, env = "ETHOS_APP_SECRET", hide_env_values = true)]
    pub app_secret: Option<String>,

    /// Authentication endpoint the secret is exchanged at.
    #[arg(long, default_value = DEFAULT_AUTH_URL, env = "ETHOS_AUTH_URL")]
    pub auth_url: String,

    /// Base URL the requested resource path is appended to.
    #[arg(long, default_value = DEFAULT_API_BASE, env = "ETHOS_API_BASE")]
    pub api_base: String,

    /// Timeout in seconds for each outbound call (auth and data read).
    #[arg(long, default_value_t = DEFAULT_UPSTREAM_TIMEOUT.as_secs(), env = "RELAY_UPSTREAM_TIMEOUT")]
    pub upstream_timeout: u64,

    /// Timeout in seconds for establishing an upstream connection.
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT.as_secs(), env = "RELAY_CONNECT_TIMEOUT")]
    pub connect_timeout: u64,

    /// Replace transport error details with a generic message in responses.
    #[arg(long, default_value_t = false, env = "RELAY_REDACT_ERRORS")]
    pub redact_errors: bool,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        match self.app_secret.as_deref() {
            None => {
                return Err(
                    "No application secret provided. Set --app-secret or ETHOS_APP_SECRET"
                        .to_string(),
                )
            }
            Some(secret) if secret.trim().is_empty() => {
                return Err("Application secret must not be empty".to_string())
            }
            Some(_) => {}
        }

        parse_http_url("auth_url", &self.auth_url)?;
        parse_api_base(&self.api_base)?;

        if self.upstream_timeout == 0 {
            return Err("upstream_timeout must be greater than 0".to_string());
        }
        if self.connect_timeout == 0 {
            return Err("connect_timeout must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Build the relay settings (validates URLs again; call `validate()` first
    /// for a complete report).
    pub fn relay_settings(&self) -> Result<RelaySettings, String> {
        let auth_url = parse_http_url("auth_url", &self.auth_url)?;
        let api_base = parse_api_base(&self.api_base)?;
        let secret = self
            .app_secret
            .clone()
            .ok_or_else(|| "No application secret provided".to_string())?;

        Ok(RelaySettings::new(auth_url, api_base, secret).with_redact_errors(self.redact_errors))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field(
                "app_secret",
                &self.app_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("auth_url", &self.auth_url)
            .field("api_base", &self.api_base)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("redact_errors", &self.redact_errors)
            .field("verbose", &self.verbose)
            .field("no_tracing", &self.no_tracing)
            .finish()
    }
}

fn parse_http_url(name: &str, value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|e| format!("{} is not a valid URL: {}", name, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!(
            "{} must use http or https, got scheme '{}'",
            name, other
        )),
    }
}

/// The resource path is appended to the base, so a query or fragment on it
/// would swallow the path.
fn parse_api_base(value: &str) -> Result<Url, String> {
    let url = parse_http_url("api_base", value)?;
    if url.query().is_some() || url.fragment().is_some() {
        return Err("api_base must not carry a query string or fragment".to_string());
    }
    Ok(url)
}

// =============================================================================
// Tests
// =============================================================================
