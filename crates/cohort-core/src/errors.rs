//! Unified error system for Cohort
//!
//! One flat error type shared by every crate in the workspace. Collaborator
//! traits keep their own narrow error enums (`StorageError`, `TimeError`) and
//! convert into `CohortError` at the feature boundary.

use serde::{Deserialize, Serialize};

/// Unified error type for all Cohort operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum CohortError {
    /// Malformed study configuration. Fatal during setup.
    #[error("Config error: {message}")]
    Config {
        /// Error message describing the invalid configuration
        message: String,
    },

    /// The eligibility collaborator failed or refused enrollment
    #[error("Eligibility check failed: {message}")]
    Eligibility {
        /// Error message from the eligibility check
        message: String,
    },

    /// Persisted state could not be read or written
    #[error("Persistence error: {message}")]
    Persistence {
        /// Error message describing the storage failure
        message: String,
    },

    /// Telemetry could not be sent
    #[error("Telemetry error: {message}")]
    Telemetry {
        /// Error message describing the send failure
        message: String,
    },

    /// The prompt renderer rejected a request
    #[error("Render error: {message}")]
    Render {
        /// Error message from the renderer
        message: String,
    },

    /// An ending URL could not be opened
    #[error("Navigation error: {message}")]
    Navigation {
        /// Error message from the navigation collaborator
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl CohortError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an eligibility error
    pub fn eligibility(message: impl Into<String>) -> Self {
        Self::Eligibility {
            message: message.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Create a telemetry error
    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry {
            message: message.into(),
        }
    }

    /// Create a render error
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Create a navigation error
    pub fn navigation(message: impl Into<String>) -> Self {
        Self::Navigation {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error must abort setup.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

/// Standard Result type for Cohort operations
pub type Result<T> = std::result::Result<T, CohortError>;

impl From<serde_json::Error> for CohortError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<crate::effects::StorageError> for CohortError {
    fn from(err: crate::effects::StorageError) -> Self {
        Self::persistence(err.to_string())
    }
}

impl From<crate::effects::TimeError> for CohortError {
    fn from(err: crate::effects::TimeError) -> Self {
        Self::internal(err.to_string())
    }
}
