use std::{env, fmt::Display, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub secret: String,
    pub product_cache_ttl: Duration,
    pub cart_write_attempts: u32,
    pub seed_demo_data: bool,
}

impl Config {
    /// Reads `.env` (if present) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let cart_write_attempts: u32 = try_load("CART_WRITE_ATTEMPTS", "3")?;
        if cart_write_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "CART_WRITE_ATTEMPTS",
                reason: "must be at least 1".into(),
            });
        }

        Ok(Self {
            database_url: try_load("DATABASE_URL", "sqlite::memory:")?,
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:3000")?,
            secret: env::var("SECRET").map_err(|_| ConfigError::Missing("SECRET"))?,
            product_cache_ttl: Duration::from_secs(try_load("PRODUCT_CACHE_TTL_SECS", "600")?),
            cart_write_attempts,
            seed_demo_data: try_load("SEED_DEMO_DATA", "false")?,
        })
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = match env::var(key) {
        Ok(value) => value,
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default.to_string()
        }
    };

    raw.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_used_when_unset() {
        let ttl: u64 = try_load("STOREFRONT_TEST_UNSET_TTL", "42").unwrap();
        assert_eq!(ttl, 42);
    }

    #[test]
    fn malformed_value_is_an_error() {
        let result: Result<u32, _> = try_load("STOREFRONT_TEST_UNSET_ATTEMPTS", "three");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                key: "STOREFRONT_TEST_UNSET_ATTEMPTS",
                ..
            })
        ));
    }
}
