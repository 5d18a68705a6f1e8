//! Service configuration loaded from the environment.

use std::str::FromStr;
use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_STORE_URL: &str = "memory";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for a service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name reported in logs and health checks.
    pub service_name: String,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Credential store backend: `memory` or a `sqlite:` URL.
    pub credential_store_url: String,
    /// Upper bound for a single connection attempt to a target database.
    pub connect_timeout_secs: u64,
    /// Upper bound for a single catalog query.
    pub query_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "schema-service".to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            credential_store_url: DEFAULT_STORE_URL.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Loads configuration for the named service.
    ///
    /// A `.env` file in the working directory is read first (if present);
    /// variables already set in the environment win.
    pub fn load_with_service(service_name: &str) -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(service_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            service_name: service_name.to_string(),
            host: lookup("SERVER_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "SERVER_PORT", defaults.port),
            credential_store_url: lookup("CREDENTIAL_STORE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.credential_store_url),
            connect_timeout_secs: parse_or(
                &lookup,
                "CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            ),
            query_timeout_secs: parse_or(&lookup, "QUERY_TIMEOUT_SECS", defaults.query_timeout_secs),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, fallback = %default, "ignoring unparseable config value");
            default
        }),
        None => default,
    }
}
