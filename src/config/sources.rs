//! Configuration sources, lowest to highest precedence.

pub mod global_file;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

/// `OVERLAYQ_LOGGING__LEVEL=debug` style overrides.
pub fn add_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("OVERLAYQ")
            .prefix_separator("_")
            .separator("__"),
    )
}
