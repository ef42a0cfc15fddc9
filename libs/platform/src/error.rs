//! Platform error taxonomy.

use thiserror::Error;

/// Result type for platform calls.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors returned by platform calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The named object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An object with the same name already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The object changed since it was read.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The platform refused the request.
    #[error("rejected: {reason}")]
    Rejected { reason: String },

    /// The platform could not be reached or failed internally.
    #[error("platform unavailable: {0}")]
    Unavailable(String),

    /// A stored object could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl PlatformError {
    /// Returns true if retrying on a later tick may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlatformError::Unavailable(_) | PlatformError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PlatformError::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, PlatformError::AlreadyExists(_))
    }

    /// Short reason suitable for API responses.
    pub fn reason(&self) -> String {
        match self {
            PlatformError::NotFound(_) => "NotFound".to_string(),
            PlatformError::AlreadyExists(_) => "AlreadyExists".to_string(),
            PlatformError::Conflict(_) => "Conflict".to_string(),
            PlatformError::Rejected { reason } => reason.clone(),
            PlatformError::Unavailable(message) | PlatformError::Decode(message) => {
                message.clone()
            }
        }
    }
}
