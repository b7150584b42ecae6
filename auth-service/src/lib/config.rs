use std::env;
use std::time::Duration as StdDuration;

use auth::PasswordCost;
use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::token::service::TokenSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password: PasswordConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Deadline for every token and user store operation
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Empty means unconfigured: issuance and validation then fail
    #[serde(default)]
    pub secret: String,
    pub token_duration_minutes: i64,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        let cost = PasswordCost::default();
        Self {
            memory_cost_kib: cost.memory_cost_kib,
            time_cost: cost.time_cost,
            parallelism: cost.parallelism,
        }
    }
}

impl PasswordConfig {
    pub fn cost(&self) -> PasswordCost {
        PasswordCost {
            memory_cost_kib: self.memory_cost_kib,
            time_cost: self.time_cost,
            parallelism: self.parallelism,
        }
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;

        Ok(config)
    }

    pub fn store_timeout(&self) -> StdDuration {
        StdDuration::from_millis(self.database.timeout_ms)
    }

    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            token_duration: Duration::minutes(self.jwt.token_duration_minutes),
            store_timeout: self.store_timeout(),
            issuer: self.jwt.issuer.clone(),
            audience: self.jwt.audience.clone(),
        }
    }
}
