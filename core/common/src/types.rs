//! Common types used throughout updrift.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a remote storage folder.
///
/// This is the provider-assigned id of the destination container, not a
/// filesystem path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderId(String);

impl FolderId {
    /// Create a new FolderId from a string.
    ///
    /// # Errors
    /// - Returns error if id is empty
    pub fn new(id: impl Into<String>) -> crate::Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(crate::Error::InvalidInput(
                "FolderId cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_id_creation() {
        let id = FolderId::new("1AbCdEf").unwrap();
        assert_eq!(id.as_str(), "1AbCdEf");
        assert_eq!(id.to_string(), "1AbCdEf");
    }

    #[test]
    fn test_folder_id_empty_fails() {
        assert!(FolderId::new("").is_err());
    }

    #[test]
    fn test_folder_id_serialization() {
        let id = FolderId::new("folder-123").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        let restored: FolderId = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, id);
    }
}
