use std::ops::RangeInclusive;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_JWT_SECRET: &str = "your-secret-key-change-in-production";
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 30 * 60;

/// Sessions last between a day and ten years
const SESSION_EXPIRATION_DAYS_RANGE: RangeInclusive<i64> = 1..=3650;
/// Costs the bcrypt algorithm accepts
const BCRYPT_COST_RANGE: RangeInclusive<u32> = 4..=31;
/// A zero interval would make the cleanup ticker panic
const CLEANUP_INTERVAL_SECS_RANGE: RangeInclusive<u64> = 1..=u64::MAX;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Runtime settings, read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Absent means the in-memory store is used
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub session_expiration_days: i64,
    pub bcrypt_cost: u32,
    pub session_cleanup_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            database_url: None,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            session_cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source; unset variables fall back to defaults.
    /// Numeric values outside their accepted range are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            jwt_secret: lookup("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            session_expiration_days: parse_var(
                &lookup,
                "SESSION_EXPIRATION_DAYS",
                defaults.session_expiration_days,
                SESSION_EXPIRATION_DAYS_RANGE,
            )?,
            bcrypt_cost: parse_var(
                &lookup,
                "BCRYPT_COST",
                defaults.bcrypt_cost,
                BCRYPT_COST_RANGE,
            )?,
            session_cleanup_interval: Duration::from_secs(parse_var(
                &lookup,
                "SESSION_CLEANUP_INTERVAL_SECS",
                defaults.session_cleanup_interval.as_secs(),
                CLEANUP_INTERVAL_SECS_RANGE,
            )?),
        })
    }
}

fn parse_var<F, T>(
    lookup: &F,
    name: &'static str,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd,
{
    let Some(value) = lookup(name) else {
        return Ok(default);
    };

    match value.trim().parse() {
        Ok(parsed) if range.contains(&parsed) => Ok(parsed),
        _ => Err(ConfigError::InvalidValue { name, value }),
    }
}
