//! Remote store trait definition.

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use updrift_common::{FolderId, Result};

/// Metadata for a file in the remote folder.
///
/// Fetched fresh on every upload decision; never cached across events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Provider-assigned identifier.
    pub id: String,
    /// File name within the folder.
    pub name: String,
    /// MIME type, when the provider reports one.
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Byte stream type for upload content.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// A single file-creation request, constructed per watch event and
/// consumed once.
pub struct UploadRequest {
    /// Bare file name (final path segment of the local file).
    pub name: String,
    /// Destination folder.
    pub folder: FolderId,
    /// File content, opened as a stream from the local file.
    pub content: ByteStream,
}

impl UploadRequest {
    /// Build a request whose content is an already-buffered byte vector.
    pub fn from_bytes(name: impl Into<String>, folder: FolderId, data: Vec<u8>) -> Self {
        let stream = futures::stream::once(async move { Ok(data) });
        Self {
            name: name.into(),
            folder,
            content: Box::pin(stream),
        }
    }
}

/// Remote storage trait for upload destinations.
///
/// The remote collaborator is consumed via exactly two operations: listing
/// the children of a folder and creating a file with metadata and content.
/// Quota, pagination and consistency semantics stay the provider's
/// responsibility.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Get the provider name (e.g., "gdrive", "memory").
    fn name(&self) -> &str;

    /// List the files that are direct children of the given folder.
    ///
    /// # Errors
    /// - Network/authentication errors
    /// - Folder not found
    async fn list_children(&self, folder: &FolderId) -> Result<Vec<RemoteFile>>;

    /// Create a file in the request's folder with the request's name and
    /// content.
    ///
    /// Duplicate names are not rejected by the provider; the caller decides
    /// whether to upload.
    ///
    /// # Errors
    /// - Network/authentication errors
    async fn create_file(&self, request: UploadRequest) -> Result<RemoteFile>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_remote_file_serialization() {
        let file = RemoteFile {
            id: "abc123".to_string(),
            name: "report.pdf".to_string(),
            mime_type: Some("application/pdf".to_string()),
        };

        let json = serde_json::to_string(&file).unwrap();
        let restored: RemoteFile = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.id, file.id);
        assert_eq!(restored.name, file.name);
        assert_eq!(restored.mime_type, file.mime_type);
    }

    #[tokio::test]
    async fn test_upload_request_from_bytes() {
        let folder = FolderId::new("folder").unwrap();
        let mut request = UploadRequest::from_bytes("a.txt", folder, vec![1, 2, 3]);

        assert_eq!(request.name, "a.txt");
        let chunk = request.content.next().await.unwrap().unwrap();
        assert_eq!(chunk, vec![1, 2, 3]);
        assert!(request.content.next().await.is_none());
    }
}
