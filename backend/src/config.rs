//! Runtime configuration read from the environment.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::domain::account_service::DEFAULT_ALLOCATION_ATTEMPTS;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:accounts.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cors_origin: String,
    pub max_connections: u32,
    pub allocation_attempts: u32,
}

impl AppConfig {
    /// Build the configuration from `ACCOUNTS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("ACCOUNTS_DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let cors_origin = lookup("ACCOUNTS_CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());

        let bind_addr = parse_or(&lookup, "ACCOUNTS_BIND_ADDR", DEFAULT_BIND_ADDR.parse::<SocketAddr>()?)?;
        let max_connections = parse_or(&lookup, "ACCOUNTS_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let allocation_attempts = parse_or(&lookup, "ACCOUNTS_ALLOCATION_ATTEMPTS", DEFAULT_ALLOCATION_ATTEMPTS)?;

        Ok(Self {
            database_url,
            bind_addr,
            cors_origin,
            max_connections: max_connections.max(1),
            allocation_attempts: allocation_attempts.max(1),
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            allocation_attempts: DEFAULT_ALLOCATION_ATTEMPTS,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
