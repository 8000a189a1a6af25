//! Service configuration read from the environment.
//!
//! `main` loads `.env` through dotenvy first; everything here only reads keys.

use std::str::FromStr;
use validator::Validate;

pub const DEFAULT_PORT: u16 = 8083;
pub const DEFAULT_MAX_COMBINATIONS: usize = 10_000;
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Clone, Debug, PartialEq, Eq, Validate)]
pub struct ServiceConfig {
    #[validate(range(min = 1))]
    pub port: u16,
    /// Largest variant list the HTTP layer will generate in one request.
    #[validate(range(min = 1, max = 1000000))]
    pub max_combinations: usize,
    #[validate(length(equal = 3))]
    pub default_currency: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_combinations: DEFAULT_MAX_COMBINATIONS,
            default_currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            port: parse(&lookup, "PORT", DEFAULT_PORT)?,
            max_combinations: parse(&lookup, "VARIANT_MAX_COMBINATIONS", DEFAULT_MAX_COMBINATIONS)?,
            default_currency: lookup("DEFAULT_CURRENCY")
                .map(|c| c.trim().to_uppercase())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> String { format!("0.0.0.0:{}", self.port) }
}

fn parse<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}
