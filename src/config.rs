// src/config.rs

use std::env;
use std::time::Duration;

use anyhow::Context;

/// Server settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .context("DATABASE_URL must be set in the environment or .env")?;

        Ok(Self {
            port: parse_or("PORT", 8080)?,
            database_url,
            max_connections: parse_or("DB_MAX_CONNECTIONS", 10)?,
            run_migrations: parse_or("RUN_MIGRATIONS", true)?,
        })
    }
}

/// Where the workflow's HTTP gateway sends its requests.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    pub timeout: Option<Duration>, // None: reqwest default (no timeout)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { api_base: "http://127.0.0.1:8080".into(), timeout: None }
    }
}

impl ClientConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_base = env::var("TARGETS_API_BASE")
            .unwrap_or_else(|_| Self::default().api_base);
        let timeout = match env::var("TARGETS_HTTP_TIMEOUT_SECS") {
            Ok(s) => Some(Duration::from_secs(
                s.parse().with_context(|| format!("invalid TARGETS_HTTP_TIMEOUT_SECS '{s}'"))?,
            )),
            Err(_) => None,
        };
        Ok(Self { api_base, timeout })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key} '{raw}': {e}")),
        Err(_) => Ok(default),
    }
}
