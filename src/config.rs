//! Application configuration loaded from environment variables
//!
//! `.env` is honored through dotenvy before this is read.
//!
//! - `PORT` - Server port number (default: 8080)
//! - `DATABASE_URL` - Path to database file (default: "data.db")
//! - `BASE_URL` - Public origin used to build short URLs (default: `http://localhost:{PORT}`)
//! - `AUTHORIZATION` - Optional shared key required on `/api/*` when set
//! - `RATE_LIMIT_PER_MINUTE` - Requests per client per minute on `/api/*` (default: 100)
//! - `SHORTEN_LIMIT_PER_MINUTE` - Create requests per client per minute (default: 10)

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub base_url: String,
    /// Shared key for the API; `None` disables the check
    pub api_key: Option<String>,
    pub rate_limit_per_minute: u32,
    pub shorten_limit_per_minute: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            database_path: "data.db".to_string(),
            base_url: "http://localhost:8080".to_string(),
            api_key: None,
            rate_limit_per_minute: 100,
            shorten_limit_per_minute: 10,
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = parse_var("PORT")?.unwrap_or(defaults.port);
        let database_path = env::var("DATABASE_URL").unwrap_or(defaults.database_path);
        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://localhost:{}", port));
        let api_key = env::var("AUTHORIZATION").ok().filter(|key| !key.is_empty());

        let rate_limit_per_minute =
            parse_var("RATE_LIMIT_PER_MINUTE")?.unwrap_or(defaults.rate_limit_per_minute);
        let shorten_limit_per_minute =
            parse_var("SHORTEN_LIMIT_PER_MINUTE")?.unwrap_or(defaults.shorten_limit_per_minute);

        Ok(Self {
            port,
            database_path,
            base_url,
            api_key,
            rate_limit_per_minute,
            shorten_limit_per_minute,
        })
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a valid number, got '{}'", name, raw)),
        Err(_) => Ok(None),
    }
}
