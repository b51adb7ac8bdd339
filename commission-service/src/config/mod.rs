use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

use crate::services::{AppendPolicy, PeriodCalculator};

#[derive(Debug, Clone, Deserialize)]
pub struct CommissionConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub mongodb: MongoConfig,
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Offset east of UTC used for "local" day boundaries.
    pub utc_offset_minutes: i32,
    pub append_max_retries: u32,
    pub append_retry_backoff_ms: u64,
}

impl LedgerConfig {
    pub fn period_calculator(&self) -> Result<PeriodCalculator, AppError> {
        PeriodCalculator::from_offset_minutes(self.utc_offset_minutes).ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "REPORTING_UTC_OFFSET_MINUTES out of range: {}",
                self.utc_offset_minutes
            ))
        })
    }

    pub fn append_policy(&self) -> AppendPolicy {
        AppendPolicy {
            max_attempts: self.append_max_retries.max(1),
            backoff: Duration::from_millis(self.append_retry_backoff_ms),
        }
    }
}

impl CommissionConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = common_config.is_production();

        Ok(CommissionConfig {
            common: common_config,
            service_name: get_env("SERVICE_NAME", Some("commission-service"), false)?,
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.is_empty()),
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", None, is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("commission_db"), is_prod)?,
            },
            ledger: LedgerConfig {
                utc_offset_minutes: parse_env("REPORTING_UTC_OFFSET_MINUTES", 0)?,
                append_max_retries: parse_env("LEDGER_APPEND_MAX_RETRIES", 5)?,
                append_retry_backoff_ms: parse_env("LEDGER_APPEND_RETRY_BACKOFF_MS", 20)?,
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} is not valid ({}): {}", key, raw, e))
        }),
        Err(_) => Ok(default),
    }
}
