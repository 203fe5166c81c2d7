use std::env;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_MAX_BODY_BYTES, DEFAULT_RATE_LIMIT_REQUESTS, DEFAULT_RATE_LIMIT_WINDOW_SECS,
    MAX_EVENT_RETENTION_SECS,
};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    /// PostgreSQL URL; `None` selects the in-memory store
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub environment: String,
    pub rate_limit_requests: u64,
    pub rate_limit_window_secs: u64,
    /// Take the client address from X-Forwarded-For / X-Real-IP
    pub trust_forwarded_headers: bool,
    pub max_body_bytes: usize,
    pub password_hash_memory_kib: u32,
    pub password_hash_iterations: u32,
    pub password_hash_parallelism: u32,
    /// Delete rate-limit events older than this; `None` keeps them forever
    pub event_retention_secs: Option<u64>,
    pub event_prune_interval_secs: u64,
}

/// Read an environment variable, falling back to `default` when unset
fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T, String> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|_| format!("Invalid {}", name))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = parse_var("SERVER_PORT", "8080")?;

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        let database_max_connections = parse_var("DATABASE_MAX_CONNECTIONS", "10")?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let rate_limit_requests =
            parse_var("RATE_LIMIT_REQUESTS", &DEFAULT_RATE_LIMIT_REQUESTS.to_string())?;
        let rate_limit_window_secs: u64 =
            parse_var("RATE_LIMIT_WINDOW_SECS", &DEFAULT_RATE_LIMIT_WINDOW_SECS.to_string())?;

        let trust_forwarded_headers = parse_var("TRUST_FORWARDED_HEADERS", "true")?;
        let max_body_bytes = parse_var("MAX_BODY_BYTES", &DEFAULT_MAX_BODY_BYTES.to_string())?;

        let password_hash_memory_kib = parse_var(
            "PASSWORD_HASH_MEMORY_KIB",
            &argon2::Params::DEFAULT_M_COST.to_string(),
        )?;
        let password_hash_iterations = parse_var(
            "PASSWORD_HASH_ITERATIONS",
            &argon2::Params::DEFAULT_T_COST.to_string(),
        )?;
        let password_hash_parallelism = parse_var(
            "PASSWORD_HASH_PARALLELISM",
            &argon2::Params::DEFAULT_P_COST.to_string(),
        )?;

        let event_retention_secs = match env::var("EVENT_RETENTION_SECS") {
            Ok(value) if !value.trim().is_empty() => Some(
                value
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| "Invalid EVENT_RETENTION_SECS")?,
            ),
            _ => None,
        };
        let event_prune_interval_secs: u64 = parse_var("EVENT_PRUNE_INTERVAL_SECS", "3600")?;

        if rate_limit_window_secs == 0 {
            return Err("RATE_LIMIT_WINDOW_SECS must be greater than zero".to_string());
        }
        if event_prune_interval_secs == 0 {
            return Err("EVENT_PRUNE_INTERVAL_SECS must be greater than zero".to_string());
        }

        Ok(Config {
            server_host,
            server_port,
            database_url,
            database_max_connections,
            environment,
            rate_limit_requests,
            rate_limit_window_secs,
            trust_forwarded_headers,
            max_body_bytes,
            password_hash_memory_kib,
            password_hash_iterations,
            password_hash_parallelism,
            event_retention_secs,
            event_prune_interval_secs,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Retention for rate-limit events, never shorter than the limiter window
    /// and capped at about a century
    pub fn effective_event_retention_secs(&self) -> Option<u64> {
        self.event_retention_secs
            .map(|retention| {
                retention
                    .max(self.rate_limit_window_secs)
                    .min(MAX_EVENT_RETENTION_SECS)
            })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            database_url: None,
            database_max_connections: 10,
            environment: "development".to_string(),
            rate_limit_requests: DEFAULT_RATE_LIMIT_REQUESTS,
            rate_limit_window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
            trust_forwarded_headers: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            password_hash_memory_kib: argon2::Params::DEFAULT_M_COST,
            password_hash_iterations: argon2::Params::DEFAULT_T_COST,
            password_hash_parallelism: argon2::Params::DEFAULT_P_COST,
            event_retention_secs: None,
            event_prune_interval_secs: 3600,
        }
    }
}
