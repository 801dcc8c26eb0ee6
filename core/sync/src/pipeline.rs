//! Per-event upload processing.

use futures::StreamExt;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

use updrift_common::{Error, FolderId, Result};
use updrift_storage::{RemoteFile, RemoteStore, UploadRequest};

use crate::watcher::WatchEvent;

/// Outcome of processing one watch event.
#[derive(Debug)]
pub enum UploadOutcome {
    /// A create-request was submitted and accepted.
    Uploaded(RemoteFile),
    /// The name was already among the folder's children; nothing uploaded.
    AlreadyPresent,
}

/// Uploads newly observed files into the target folder.
///
/// Each event is handled independently: the folder's current children are
/// listed fresh, the listing is scanned for the file's bare name, and only
/// an absent name triggers a create-request. In-flight uploads are capped
/// by a semaphore, and events sharing a file name are serialized through a
/// per-name lock so two copies of the same name cannot both pass the
/// duplicate check.
pub struct UploadPipeline {
    remote: Arc<dyn RemoteStore>,
    folder: FolderId,
    permits: Semaphore,
    name_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UploadPipeline {
    /// Create a pipeline uploading into `folder`.
    pub fn new(remote: Arc<dyn RemoteStore>, folder: FolderId, max_concurrent_uploads: usize) -> Self {
        Self {
            remote,
            folder,
            permits: Semaphore::new(max_concurrent_uploads.max(1)),
            name_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Handle one event end-to-end, logging the outcome.
    ///
    /// Never propagates an error: a failed listing or upload is logged and
    /// dropped so subsequent events keep flowing.
    pub async fn handle_event(self: Arc<Self>, event: WatchEvent) {
        match self.process(&event).await {
            Ok(UploadOutcome::Uploaded(file)) => {
                info!("uploaded {} as remote id {}", event.path.display(), file.id);
            }
            Ok(UploadOutcome::AlreadyPresent) => {
                debug!("{} already present remotely, skipping", event.path.display());
            }
            Err(err) => {
                error!("failed to upload {}: {}", event.path.display(), err);
            }
        }
    }

    /// Process a single event, returning what happened.
    ///
    /// # Errors
    /// - Listing query failure
    /// - Local file open/read failure
    /// - Create-request failure
    pub async fn process(&self, event: &WatchEvent) -> Result<UploadOutcome> {
        let name = file_name_of(&event.path)?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::InvalidInput("upload limiter closed".to_string()))?;

        let name_lock = self.lock_for(&name).await;
        let _name_guard = name_lock.lock().await;

        let children = self.remote.list_children(&self.folder).await?;
        if children.iter().any(|child| child.name == name) {
            return Ok(UploadOutcome::AlreadyPresent);
        }

        let file = tokio::fs::File::open(&event.path).await?;
        let content = ReaderStream::new(file)
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(Error::from));

        let request = UploadRequest {
            name,
            folder: self.folder.clone(),
            content: Box::pin(content),
        };

        let created = self.remote.create_file(request).await?;
        Ok(UploadOutcome::Uploaded(created))
    }

    /// Lock handle shared by every in-flight event with this file name.
    async fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.name_locks.lock().await;
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Bare file name of a path (final path segment).
fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidInput(format!("path has no file name: {}", path.display())))
}
