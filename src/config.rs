//! Configuration System
//!
//! Declares containers (policy, promotion delay, ordering, input shaping) and
//! logging. Sources are layered with the `config` crate: built-in defaults,
//! the global config file, an explicit file, then `OVERLAYQ_*` environment
//! variables.

use crate::logging::LoggingConfig;
use crate::policy::{DisplayOrder, InputShaping, Policy, Verbosity};
use crate::style::{DisplayConfig, Placement};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

mod facade;
mod merge_policy;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Containers to register at startup, keyed by name
    #[serde(default)]
    pub containers: HashMap<String, ContainerConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scheduling settings for one container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    #[serde(default)]
    pub policy: Policy,

    /// Delay before a waiting item is promoted (milliseconds)
    #[serde(default)]
    pub delay_ms: u64,

    #[serde(default)]
    pub display_order: DisplayOrder,

    #[serde(default)]
    pub input_shaping: InputShaping,

    #[serde(default)]
    pub verbosity: Verbosity,

    /// Whether item display settings override container settings
    #[serde(default)]
    pub placement: Placement,

    /// Container-level display settings handed to renderers
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self::new(Policy::default())
    }
}

impl ContainerConfig {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            delay_ms: 0,
            display_order: DisplayOrder::default(),
            input_shaping: InputShaping::default(),
            verbosity: Verbosity::default(),
            placement: Placement::default(),
            display: DisplayConfig::default(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_display_order(mut self, order: DisplayOrder) -> Self {
        self.display_order = order;
        self
    }

    pub fn with_input_shaping(mut self, shaping: InputShaping) -> Self {
        self.input_shaping = shaping;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Validate container configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Policy::Multiple { capacity: 0 } = self.policy {
            return Err("Multiple policy requires a capacity of at least 1".to_string());
        }
        match self.input_shaping {
            InputShaping::Debounce { window_ms: 0 } | InputShaping::Latest { window_ms: 0 } => {
                Err("Input shaping window must be greater than 0ms".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Nearest usable configuration: zero capacity becomes 1 and zero-length
    /// shaping windows turn shaping off.
    pub fn sanitized(mut self) -> Self {
        if let Policy::Multiple { capacity: 0 } = self.policy {
            self.policy = Policy::Multiple { capacity: 1 };
        }
        if let InputShaping::Debounce { window_ms: 0 } | InputShaping::Latest { window_ms: 0 } =
            self.input_shaping
        {
            self.input_shaping = InputShaping::None;
        }
        self
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Container(String, String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Container(name, msg) => {
                write!(f, "Container '{}': {}", name, msg)
            }
            ValidationError::Logging(msg) => {
                write!(f, "Logging: {}", msg)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl OverlayConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (name, container) in &self.containers {
            if name.trim().is_empty() {
                errors.push(ValidationError::Container(
                    name.clone(),
                    "Container name cannot be empty".to_string(),
                ));
            }
            if let Err(e) = container.validate() {
                errors.push(ValidationError::Container(name.clone(), e));
            }
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Container names in stable order
    pub fn container_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.containers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
