//! In-memory remote store for testing.

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use updrift_common::{Error, FolderId, Result};

use crate::remote::{RemoteFile, RemoteStore, UploadRequest};

/// In-memory stored file.
#[derive(Debug, Clone)]
struct Entry {
    file: RemoteFile,
    data: Vec<u8>,
}

/// In-memory remote store.
///
/// Useful for testing and development. All data is stored in memory and
/// lost on drop. Every accepted create-request is recorded so tests can
/// assert on exactly how many uploads a scenario produced, and creates for
/// specific names can be forced to fail.
pub struct MemoryRemote {
    folders: Arc<RwLock<HashMap<String, Vec<Entry>>>>,
    create_log: Arc<RwLock<Vec<String>>>,
    failing_names: Arc<RwLock<HashSet<String>>>,
}

impl MemoryRemote {
    /// Create a new empty memory remote.
    pub fn new() -> Self {
        Self {
            folders: Arc::new(RwLock::new(HashMap::new())),
            create_log: Arc::new(RwLock::new(Vec::new())),
            failing_names: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Pre-populate a folder with a named file, as if uploaded earlier.
    pub fn seed_file(&self, folder: &FolderId, name: &str) -> RemoteFile {
        let file = RemoteFile {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            mime_type: None,
        };
        self.folders
            .write()
            .unwrap()
            .entry(folder.as_str().to_string())
            .or_default()
            .push(Entry {
                file: file.clone(),
                data: Vec::new(),
            });
        file
    }

    /// Make every create-request for the given name fail.
    pub fn fail_creates_for(&self, name: &str) {
        self.failing_names.write().unwrap().insert(name.to_string());
    }

    /// Names of all create-requests accepted or rejected so far, in order.
    pub fn create_requests(&self) -> Vec<String> {
        self.create_log.read().unwrap().clone()
    }

    /// Content of a stored file, if present.
    pub fn file_data(&self, folder: &FolderId, name: &str) -> Option<Vec<u8>> {
        self.folders
            .read()
            .unwrap()
            .get(folder.as_str())
            .and_then(|entries| entries.iter().find(|e| e.file.name == name))
            .map(|e| e.data.clone())
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_children(&self, folder: &FolderId) -> Result<Vec<RemoteFile>> {
        let folders = self.folders.read().unwrap();
        Ok(folders
            .get(folder.as_str())
            .map(|entries| entries.iter().map(|e| e.file.clone()).collect())
            .unwrap_or_default())
    }

    async fn create_file(&self, mut request: UploadRequest) -> Result<RemoteFile> {
        self.create_log.write().unwrap().push(request.name.clone());

        if self.failing_names.read().unwrap().contains(&request.name) {
            return Err(Error::Network(format!(
                "create rejected for {}",
                request.name
            )));
        }

        let mut data = Vec::new();
        while let Some(chunk) = request.content.next().await {
            data.extend_from_slice(&chunk?);
        }

        let file = RemoteFile {
            id: Uuid::new_v4().to_string(),
            name: request.name,
            mime_type: None,
        };

        // The file becomes visible to listings only once the whole stream
        // has been consumed, mirroring a provider that reflects uploads
        // after completion.
        self.folders
            .write()
            .unwrap()
            .entry(request.folder.as_str().to_string())
            .or_default()
            .push(Entry {
                file: file.clone(),
                data,
            });

        Ok(file)
    }
}
