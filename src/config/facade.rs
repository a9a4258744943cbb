//! Config loader: assembles sources in precedence order and deserializes.

use super::merge_policy::builder_with_defaults;
use super::sources::{self, global_file};
use super::OverlayConfig;
use crate::error::OverlayError;
use config::File;
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration: defaults, global file, `explicit` file, environment.
    pub fn load(explicit: Option<&Path>) -> Result<OverlayConfig, OverlayError> {
        let mut builder = builder_with_defaults()?;
        builder = global_file::add_to_builder(builder)?;
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(OverlayError::ConfigError(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = sources::add_environment(builder);

        let config: OverlayConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Load configuration from a single file on top of the defaults only.
    pub fn load_from_file(path: &Path) -> Result<OverlayConfig, OverlayError> {
        let config: OverlayConfig = builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}
