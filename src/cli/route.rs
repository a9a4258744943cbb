//! CLI route: single route table dispatching commands to domain services.

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_config_json, format_config_text, format_report_json, format_report_text,
};
use crate::cli::scenario::{run_scenario, Scenario};
use crate::clock::SystemClock;
use crate::config::{ConfigLoader, OverlayConfig};
use crate::error::OverlayError;
use crate::observer::TracingObserver;
use crate::registry::Registry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Runtime context for CLI execution: the loaded configuration.
pub struct RunContext {
    config: OverlayConfig,
}

impl RunContext {
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, OverlayError> {
        let config = ConfigLoader::load(config_path.as_deref())?;
        Ok(Self { config })
    }

    pub fn from_config(config: OverlayConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, OverlayError> {
        info!(command = command.name(), "Executing command");
        match command {
            Commands::Validate { format } => self.validate(format),
            Commands::Run { scenario, format } => self.run(scenario, format),
        }
    }

    fn validate(&self, format: &str) -> Result<String, OverlayError> {
        self.ensure_valid()?;
        match format {
            "json" => format_config_json(&self.config),
            _ => Ok(format_config_text(&self.config)),
        }
    }

    fn run(&self, scenario_path: &Path, format: &str) -> Result<String, OverlayError> {
        self.ensure_valid()?;
        let scenario = Scenario::from_file(scenario_path)?;

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| OverlayError::ScenarioError(format!("Failed to start runtime: {}", e)))?;
        let report = rt.block_on(async {
            let registry =
                Registry::from_config(&self.config, Arc::new(SystemClock), Arc::new(TracingObserver));
            let report = run_scenario(&registry, &scenario).await;
            registry.shutdown().await;
            report
        })?;

        match format {
            "json" => format_report_json(&report),
            _ => Ok(format_report_text(&report)),
        }
    }

    fn ensure_valid(&self) -> Result<(), OverlayError> {
        self.config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            OverlayError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }
}
