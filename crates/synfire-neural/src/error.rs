//! Error types for the neural entity layer

use thiserror::Error;

/// Result type for neural operations
pub type Result<T> = std::result::Result<T, NeuralError>;

/// Errors that can occur in the neural entity layer
#[derive(Error, Debug)]
pub enum NeuralError {
    /// Strategy name did not resolve to a known strategy
    #[error("Unknown pattern update strategy: {name}")]
    UnknownStrategy {
        /// Name that failed to resolve
        name: String,
    },

    /// Pattern operation on vectors of different lengths
    #[error("Pattern size mismatch: {expected} vs {found}")]
    SizeMismatch {
        /// Length of the target pattern
        expected: usize,
        /// Length of the source pattern
        found: usize,
    },

    /// Invalid parameter value
    #[error("Invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Operation requires spikes but the window is empty
    #[error("Neuron {neuron_id} has no spikes in its window")]
    EmptyWindow {
        /// Neuron whose window was empty
        neuron_id: u64,
    },

    /// Storage layer error
    #[error("Storage error: {source}")]
    Storage {
        #[from]
        /// Source storage error
        source: synfire_storage::StorageError,
    },
}

impl NeuralError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    /// Create an unknown-strategy error
    pub fn unknown_strategy(name: impl Into<String>) -> Self {
        Self::UnknownStrategy { name: name.into() }
    }
}
