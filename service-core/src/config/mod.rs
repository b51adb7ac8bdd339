use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_port() -> u16 {
    8080
}

fn default_environment() -> String {
    std::env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string())
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Production refuses to fall back to defaults for required settings.
    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_ascii_lowercase().as_str(), "prod" | "production")
    }
}
