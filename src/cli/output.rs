//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::OverlayError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &OverlayError) -> String {
    match e {
        OverlayError::UnknownLabel(label) => {
            format!("Scenario refers to label '{}' before it was shown", label)
        }
        other => other.to_string(),
    }
}
