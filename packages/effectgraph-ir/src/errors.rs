//! Error types for effectgraph-ir
//!
//! Only program loading, validation and configuration can fail. Inference
//! itself never errors (imprecision degrades to `Unknown`), and effect
//! violations are reported as `EffectViolation` values, not as `Err`.

use crate::config::ConfigError;
use crate::shared::models::{Category, Kind, RoutineId};
use thiserror::Error;

/// Main error type for effectgraph-ir operations
#[derive(Debug, Error)]
pub enum EffectgraphError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reference to a routine the unit does not declare
    #[error("Unknown routine '{routine}' referenced from '{referenced_from}'")]
    UnknownRoutine {
        routine: RoutineId,
        referenced_from: RoutineId,
    },

    /// Two routines share an id
    #[error("Duplicate routine '{0}'")]
    DuplicateRoutine(RoutineId),

    /// Kind not present in the hierarchy (strict kinds only)
    #[error("Unknown {} kind '{kind}' in '{context}'", .category.noun())]
    UnknownKind {
        kind: Kind,
        category: Category,
        context: String,
    },

    /// Kind hierarchy loops back on itself
    #[error("Cyclic {} hierarchy through '{kind}'", .category.noun())]
    KindCycle { kind: Kind, category: Category },

    /// Malformed program representation
    #[error("Program error: {0}")]
    Program(String),

    /// Published effects written by an incompatible version
    #[error("Unsupported published effects version {found} for unit '{unit}' (expected {expected})")]
    PublishedVersion {
        unit: String,
        found: u32,
        expected: u32,
    },
}

impl EffectgraphError {
    /// Create a program error
    pub fn program(msg: impl Into<String>) -> Self {
        EffectgraphError::Program(msg.into())
    }
}

/// Result type alias for effectgraph operations
pub type Result<T> = std::result::Result<T, EffectgraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_message() {
        let err = EffectgraphError::UnknownKind {
            kind: Kind::from("IOErr"),
            category: Category::Raises,
            context: "readLine".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown exception kind 'IOErr' in 'readLine'"
        );
    }

    #[test]
    fn test_config_error_converts() {
        let err: EffectgraphError = ConfigError::UnknownPreset("loose".to_string()).into();
        assert!(matches!(err, EffectgraphError::Config(_)));
    }
}
