//! Error types for the storage layer

use thiserror::Error;

use crate::ids::ObjectKind;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur in the storage layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// Identifier range exhausted for an object kind
    #[error("ID range exhausted for {kind} (max: {max})")]
    IdSpaceExhausted {
        /// Kind whose range ran out
        kind: ObjectKind,
        /// Last identifier in the kind's range
        max: u64,
    },

    /// Record carried a type tag with no registered factory
    #[error("Unknown type tag: {tag}")]
    UnknownTypeTag {
        /// Tag found in the record
        tag: String,
    },

    /// Record could not be serialized or deserialized
    #[error("Serialization failure: {reason}")]
    Serialization {
        /// Reason for the failure
        reason: String,
    },

    /// Record is missing a required field
    #[error("Malformed record: {reason}")]
    MalformedRecord {
        /// Reason the record is malformed
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        /// Source I/O error
        source: std::io::Error,
    },

    /// Generic operation error
    #[error("Operation failed: {message}")]
    OperationError {
        /// Error message
        message: String,
    },
}

impl StorageError {
    /// Create a serialization error
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization {
            reason: reason.into(),
        }
    }

    /// Create a malformed-record error
    pub fn malformed_record(reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            reason: reason.into(),
        }
    }

    /// Create an unknown-type-tag error
    pub fn unknown_type_tag(tag: impl Into<String>) -> Self {
        Self::UnknownTypeTag { tag: tag.into() }
    }

    /// Create a generic operation error
    pub fn operation(message: impl Into<String>) -> Self {
        Self::OperationError {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = StorageError::serialization("bad json");
        assert!(matches!(err, StorageError::Serialization { .. }));

        let err = StorageError::unknown_type_tag("Widget");
        assert!(matches!(err, StorageError::UnknownTypeTag { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = StorageError::IdSpaceExhausted {
            kind: ObjectKind::Neuron,
            max: 199_999_999_999_999,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("ID range exhausted"));
        assert!(msg.contains("Neuron"));
    }
}
