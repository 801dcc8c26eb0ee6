//! Google Drive remote store implementation.

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;

use updrift_common::{FolderId, Result};

use crate::remote::{RemoteFile, RemoteStore, UploadRequest};

use super::auth::TokenManager;
use super::client::{DriveClient, DriveFile};

/// Google Drive remote store.
///
/// Implements the RemoteStore trait over the Drive v3 API.
pub struct DriveRemote {
    client: DriveClient,
}

impl DriveRemote {
    /// Create a new Google Drive remote.
    pub fn new(token_manager: Arc<TokenManager>) -> Result<Self> {
        Ok(Self {
            client: DriveClient::new(token_manager)?,
        })
    }

    fn to_remote_file(file: DriveFile) -> RemoteFile {
        RemoteFile {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
        }
    }
}

#[async_trait]
impl RemoteStore for DriveRemote {
    fn name(&self) -> &str {
        "gdrive"
    }

    async fn list_children(&self, folder: &FolderId) -> Result<Vec<RemoteFile>> {
        let files = self.client.list_folder(folder.as_str()).await?;
        Ok(files.into_iter().map(Self::to_remote_file).collect())
    }

    async fn create_file(&self, request: UploadRequest) -> Result<RemoteFile> {
        // The multipart create wants the full body; collect the content
        // stream before submitting.
        let mut data = Vec::new();
        let mut content = request.content;

        while let Some(chunk) = content.next().await {
            data.extend_from_slice(&chunk?);
        }

        let file = self
            .client
            .create_file(&request.name, request.folder.as_str(), data)
            .await?;

        Ok(Self::to_remote_file(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_remote_file() {
        let drive_file = DriveFile {
            id: "file_id".to_string(),
            name: "test.txt".to_string(),
            mime_type: Some("text/plain".to_string()),
        };

        let remote = DriveRemote::to_remote_file(drive_file);

        assert_eq!(remote.id, "file_id");
        assert_eq!(remote.name, "test.txt");
        assert_eq!(remote.mime_type.as_deref(), Some("text/plain"));
    }
}
