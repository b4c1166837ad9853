//! Error types for the spike runtime

use thiserror::Error;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur in the spike runtime
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Event time falls outside the scheduler's time wheel
    #[error(
        "Event at {time_ms}ms is outside the window [{current_ms}ms, {horizon_ms}ms)"
    )]
    OutOfWindow {
        /// Requested delivery time
        time_ms: f64,
        /// Current simulation time
        current_ms: f64,
        /// End of the schedulable window
        horizon_ms: f64,
    },

    /// Task submitted to a stopped worker pool
    #[error("Worker pool is stopped")]
    PoolStopped,

    /// Registry or network lookup miss
    #[error("Unknown entity: {id}")]
    UnknownEntity {
        /// Identifier that failed to resolve
        id: u64,
    },

    /// Task failed to produce a result (panicked or was dropped)
    #[error("Task failed: {reason}")]
    TaskFailed {
        /// Reason for the failure
        reason: String,
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

    /// Neural entity layer error
    #[error("Neural error: {source}")]
    Neural {
        #[from]
        /// Source neural error
        source: synfire_neural::NeuralError,
    },

    /// Storage layer error
    #[error("Storage error: {source}")]
    Storage {
        #[from]
        /// Source storage error
        source: synfire_storage::StorageError,
    },
}

impl RuntimeError {
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

    /// Create a task failure error
    pub fn task_failed(reason: impl Into<String>) -> Self {
        Self::TaskFailed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RuntimeError::invalid_parameter("dt_ms", "0", "> 0");
        assert!(matches!(err, RuntimeError::InvalidParameter { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = RuntimeError::OutOfWindow {
            time_ms: 1500.0,
            current_ms: 10.0,
            horizon_ms: 1010.0,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("1500"));
        assert!(msg.contains("outside the window"));
    }
}
