use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Process-wide configuration, read once at startup and injected into every component.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub redis_url: String,
    pub server_port: u16,
    pub server_host: String,
    /// `None` allows any origin.
    pub allowed_origin: Option<String>,
    pub token_lifetime: Duration,
    pub token_leeway: Duration,
    pub revocation_ttl: Duration,
    pub revocation_covers_token_lifetime: bool,
    pub bcrypt_cost: u32,
    pub store_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            redis_url: redis_url_from_env()?,
            server_port: parsed("SERVER_PORT", 5005)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            allowed_origin: optional("ALLOWED_ORIGIN"),
            token_lifetime: Duration::from_secs(parsed("TOKEN_LIFETIME_SECS", 4 * 60 * 60)?),
            token_leeway: Duration::from_secs(parsed("TOKEN_LEEWAY_SECS", 15)?),
            revocation_ttl: Duration::from_secs(parsed("REVOCATION_TTL_SECS", 3600)?),
            revocation_covers_token_lifetime: parsed("REVOCATION_COVERS_TOKEN_LIFETIME", false)?,
            bcrypt_cost: parsed("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            store_timeout: Duration::from_secs(parsed("STORE_TIMEOUT_SECS", 5)?),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

/// `REDIS_URL` wins; otherwise the URL is assembled from host, port and password.
fn redis_url_from_env() -> Result<String, ConfigError> {
    if let Some(url) = optional("REDIS_URL") {
        return Ok(url);
    }
    let host = optional("REDIS_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let port: u16 = parsed("REDIS_PORT", 6379)?;
    Ok(match optional("REDIS_PASSWORD") {
        Some(password) => format!("redis://:{}@{}:{}/", password, host, port),
        None => format!("redis://{}:{}/", host, port),
    })
}
