//! Application configuration

use std::net::SocketAddr;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use serde_with::serde_as;

use crate::errors::SatTrackerError;
use crate::models::{NewSatellite, TrackedSatellite};

/// Built-in defaults, overridden by `config/local` and the environment
const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub tracking: TrackingConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// Path prefix under which the API routes are mounted
    pub base_path: String,
}

#[serde_as]
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub acquire_timeout: Duration,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackingConfig {
    /// Upstream endpoint reporting the current position
    pub position_url: String,
    pub satellite: TrackedSatellite,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    /// Records inserted when the store has no active satellites
    #[serde(default)]
    pub satellites: Vec<NewSatellite>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("SATTRACKER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Built-in configuration only
    pub fn defaults() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Validate all sections
    pub fn validate(&self) -> Result<(), SatTrackerError> {
        self.server.validate()?;
        self.database.validate()?;
        self.tracking.validate()?;
        self.seed.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), SatTrackerError> {
        if !self.base_path.starts_with('/') {
            return Err(SatTrackerError::ConfigurationError {
                message: format!("Base path must start with '/': {}", self.base_path),
            });
        }
        Ok(())
    }
}

impl DatabaseConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), SatTrackerError> {
        if self.url.trim().is_empty() {
            return Err(SatTrackerError::ConfigurationError {
                message: "Database URL cannot be empty".to_string(),
            });
        }
        if self.max_connections == 0 {
            return Err(SatTrackerError::ConfigurationError {
                message: "Database pool must allow at least one connection".to_string(),
            });
        }
        if self.acquire_timeout.is_zero() {
            return Err(SatTrackerError::ConfigurationError {
                message: "Acquire timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl TrackingConfig {
    pub fn validate(&self) -> Result<(), SatTrackerError> {
        if self.position_url.trim().is_empty() {
            return Err(SatTrackerError::ConfigurationError {
                message: "Position URL cannot be empty".to_string(),
            });
        }
        if self.satellite.name.trim().is_empty() {
            return Err(SatTrackerError::ConfigurationError {
                message: "Tracked satellite name cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl SeedConfig {
    pub fn validate(&self) -> Result<(), SatTrackerError> {
        for satellite in &self.satellites {
            satellite
                .validate()
                .map_err(|e| SatTrackerError::ConfigurationError {
                    message: format!("Invalid seed satellite {}: {}", satellite.name, e),
                })?;
        }
        Ok(())
    }
}
