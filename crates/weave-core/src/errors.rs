//! Unified error type for Weave core
//!
//! Core operations (encoding, hashing, model validation) report through a
//! single error enum. Collaborator faults have their own error types in
//! [`crate::effects`] so the engine can classify them.

use serde::{Deserialize, Serialize};

/// Unified error type for core operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum WeaveError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Storage operation failed
    #[error("Storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },
}

impl WeaveError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// Standard Result type for core operations
pub type Result<T> = std::result::Result<T, WeaveError>;

impl From<crate::serialization::SerializationError> for WeaveError {
    fn from(err: crate::serialization::SerializationError) -> Self {
        Self::serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = WeaveError::invalid("test message");
        assert!(matches!(err, WeaveError::Invalid { .. }));
        assert_eq!(err.to_string(), "Invalid: test message");
    }

    #[test]
    fn test_serialization_error_conversion() {
        let err = crate::serialization::SerializationError::InvalidFormat("bad".to_string());
        let weave_err = WeaveError::from(err);
        assert!(matches!(weave_err, WeaveError::Serialization { .. }));
    }
}
