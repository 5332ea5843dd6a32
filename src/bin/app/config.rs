use std::{env, str::FromStr};

use dotenvy::dotenv;
use thiserror::Error;
use tracing::{trace, trace_span};

use crate::services::short_link::{DEFAULT_SHORT_CODE_LENGTH, MAX_LENGTH_SHORT_CODE};

pub const DEFAULT_POOL_SIZE: u32 = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("SHORT_CODE_LENGTH must be between 1 and {max}, got {0}", max = MAX_LENGTH_SHORT_CODE)]
    ShortCodeLength(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub pool_size: u32,
    pub short_code_length: usize,
    /// Origin prepended to generated links, empty for relative links.
    pub site_url: String,
}

impl Config {
    /// Reads `.env` when there is one, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let span = trace_span!("loading config");
        let _guard = span.enter();

        match dotenv() {
            Ok(path) => trace!("Loaded {}", path.display()),
            Err(error) => trace!("No .env file loaded: {error}"),
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Blank values count as unset
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let pool_size = parse_or(get("DATABASE_POOL_SIZE"), "DATABASE_POOL_SIZE", DEFAULT_POOL_SIZE)?;
        if pool_size == 0 {
            return Err(ConfigError::Invalid {
                key: "DATABASE_POOL_SIZE",
                value: "0".to_owned(),
            });
        }

        let short_code_length = parse_or(
            get("SHORT_CODE_LENGTH"),
            "SHORT_CODE_LENGTH",
            DEFAULT_SHORT_CODE_LENGTH,
        )?;
        if !(1..=MAX_LENGTH_SHORT_CODE).contains(&short_code_length) {
            return Err(ConfigError::ShortCodeLength(short_code_length));
        }

        Ok(Self {
            database_url,
            pool_size,
            short_code_length,
            site_url: get("SITE_URL").unwrap_or_default(),
        })
    }
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
