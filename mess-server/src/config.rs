//! Server configuration, read from environment variables

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::auth::JwtConfig;
use crate::billing::MealPricing;
use crate::billing::pricing::{DEFAULT_FULL_PRICE, DEFAULT_HALF_PRICE};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Where bills and payments are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// Process memory, for local runs; nothing survives a restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = BoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => {
                Err(format!("unknown STORE_BACKEND '{other}', expected postgres or memory").into())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    /// PostgreSQL connection URL (unused with the memory backend)
    pub database_url: Option<String>,
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    pub pricing: MealPricing,
    /// Daily rolling log files go here when set
    pub log_dir: Option<String>,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn optional(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|s| !s.trim().is_empty())
    }

    fn price(name: &str, default: Decimal) -> Result<Decimal, BoxError> {
        match Self::optional(name) {
            Some(raw) => Decimal::from_str(raw.trim())
                .map_err(|e| -> BoxError {
                    format!("{name} is not a valid amount ('{raw}'): {e}").into()
                }),
            None => Ok(default),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let store_backend = match Self::optional("STORE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StoreBackend::Postgres,
        };
        let database_url = Self::optional("DATABASE_URL");
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err("DATABASE_URL must be set".into());
        }

        let pricing = MealPricing::new(
            Self::price("MEAL_PRICE_HALF", DEFAULT_HALF_PRICE)?,
            Self::price("MEAL_PRICE_FULL", DEFAULT_FULL_PRICE)?,
        )?;

        Ok(Self {
            store_backend,
            database_url,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            jwt_issuer: Self::optional("JWT_ISSUER"),
            jwt_audience: Self::optional("JWT_AUDIENCE"),
            environment,
            pricing,
            log_dir: Self::optional("LOG_DIR"),
        })
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            issuer: self.jwt_issuer.clone(),
            audience: self.jwt_audience.clone(),
            ..JwtConfig::new(self.jwt_secret.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_parsing() {
        assert_eq!("postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert_eq!(" Memory ".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }
}
