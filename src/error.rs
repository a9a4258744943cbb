//! Error types for the overlay queue system.
//!
//! The scheduler core never surfaces errors: duplicate registrations, unknown
//! containers and unknown item ids all degrade to logged no-ops. These types
//! cover the outer surfaces (configuration, logging setup, scenario replay).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Scenario error: {0}")]
    ScenarioError(String),

    #[error("Unknown label in scenario: {0}")]
    UnknownLabel(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for OverlayError {
    fn from(err: config::ConfigError) -> Self {
        OverlayError::ConfigError(err.to_string())
    }
}

impl From<toml::de::Error> for OverlayError {
    fn from(err: toml::de::Error) -> Self {
        OverlayError::ScenarioError(err.to_string())
    }
}
