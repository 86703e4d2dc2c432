//! Error types for the rights engine

use std::fmt;

/// Result type alias for rights operations
pub type Result<T> = std::result::Result<T, RightsError>;

/// Errors surfaced by the public decision API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RightsError {
    /// An injected collaborator (rule storage, group directory, identity
    /// store) failed. Callers must treat the decision as DENY.
    External {
        message: String,
    },

    /// The cache load was restarted on structural races until the retry
    /// bound was reached.
    LoadRetriesExhausted {
        attempts: usize,
    },

    /// Generic internal error
    Internal {
        message: String,
    },
}

impl fmt::Display for RightsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RightsError::External { message } => {
                write!(f, "External dependency failure: {}", message)
            }
            RightsError::LoadRetriesExhausted { attempts } => {
                write!(f, "Failed to load the cache in {} attempts", attempts)
            }
            RightsError::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for RightsError {}

impl From<anyhow::Error> for RightsError {
    fn from(err: anyhow::Error) -> Self {
        RightsError::External {
            message: format!("{:#}", err),
        }
    }
}
