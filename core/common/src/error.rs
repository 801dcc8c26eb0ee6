//! Common error types for updrift.

use thiserror::Error;

/// Top-level error type for updrift operations.
#[derive(Debug, Error)]
pub enum Error {
    /// OAuth2 authorization or token exchange failed.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The persisted credential file could not be used.
    #[error("Token store error: {0}")]
    TokenStore(String),

    /// Remote API call failed.
    #[error("Network error: {0}")]
    Network(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Filesystem watch subscription failed.
    #[error("Watch error: {0}")]
    Watch(String),
}

impl Error {
    /// Whether this error should terminate the process rather than be
    /// logged and skipped.
    ///
    /// Authorization and credential-file problems make every subsequent
    /// upload impossible; a single failed listing or upload does not.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Authentication(_)
                | Error::TokenStore(_)
                | Error::Serialization(_)
                | Error::InvalidInput(_)
                | Error::Watch(_)
        )
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_categories() {
        assert!(Error::Authentication("bad code".to_string()).is_fatal());
        assert!(Error::TokenStore("corrupt".to_string()).is_fatal());
        assert!(Error::Watch("cannot subscribe".to_string()).is_fatal());
    }

    #[test]
    fn test_per_event_categories_are_not_fatal() {
        assert!(!Error::Network("timeout".to_string()).is_fatal());
        assert!(!Error::NotFound("gone".to_string()).is_fatal());
        assert!(!Error::Io(std::io::Error::other("boom")).is_fatal());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
