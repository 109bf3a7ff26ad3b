//! Process configuration, read once from the environment at startup.

use chrono::Duration;
use inkpost_auth::password::DEFAULT_COST;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
const BCRYPT_COSTS: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive number of seconds, got {value:?}")]
    InvalidTtl { name: &'static str, value: String },

    #[error("{name} must be a bcrypt cost between 4 and 31, got {value:?}")]
    InvalidCost { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// Postgres URL. `None` selects the in-memory stores.
    pub database_url: Option<String>,
    /// bcrypt work factor for newly hashed passwords.
    pub bcrypt_cost: u32,
}

impl ApiConfig {
    /// In-memory configuration with defaults around the given secret.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            jwt_secret: jwt_secret.into(),
            token_ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            database_url: None,
            bcrypt_cost: DEFAULT_COST,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let token_ttl = match var("TOKEN_TTL_SECS") {
            None => Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(secs) if secs > 0 => Duration::seconds(secs),
                _ => {
                    return Err(ConfigError::InvalidTtl {
                        name: "TOKEN_TTL_SECS",
                        value: raw,
                    });
                }
            },
        };

        let bcrypt_cost = match var("BCRYPT_COST") {
            None => DEFAULT_COST,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(cost) if BCRYPT_COSTS.contains(&cost) => cost,
                _ => {
                    return Err(ConfigError::InvalidCost {
                        name: "BCRYPT_COST",
                        value: raw,
                    });
                }
            },
        };

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            jwt_secret,
            token_ttl,
            database_url: var("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            bcrypt_cost,
        })
    }
}
