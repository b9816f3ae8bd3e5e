//! Error types for inventory loading and setup workflows
//!
//! Cost arithmetic itself never fails: zero divisors and negative rates flow
//! through as non-finite or negative figures.

use thiserror::Error;

/// Rejected workflow action
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("action '{action}' is not valid in state '{state}'")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },

    #[error("regional adjustment {value}% is outside the allowed range [{min}, {max}]")]
    AdjustmentOutOfRange { value: i32, min: i32, max: i32 },

    #[error("step '{step}' must be completed before advancing")]
    StepIncomplete { step: &'static str },

    #[error("unknown setup path '{0}'")]
    UnknownPath(String),
}

impl WorkflowError {
    pub fn invalid(state: &'static str, action: &'static str) -> Self {
        Self::InvalidTransition { state, action }
    }
}

/// Failure to load an inventory file
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("failed to read inventory file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse inventory file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
