//! Orchestration of the watcher and the upload pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use updrift_common::{FolderId, Result};
use updrift_storage::RemoteStore;

use crate::pipeline::UploadPipeline;
use crate::watcher::DirectoryWatcher;

/// Configuration for the sync service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Upload files already present in the directory when the watch begins.
    pub upload_existing: bool,
    /// Maximum number of uploads in flight at once.
    pub max_concurrent_uploads: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            upload_existing: false,
            max_concurrent_uploads: 4,
        }
    }
}

/// Long-running service wiring watch events into uploads.
pub struct SyncService {
    remote: Arc<dyn RemoteStore>,
    folder: FolderId,
    watch_path: PathBuf,
    config: SyncConfig,
}

impl SyncService {
    /// Create a service uploading from `watch_path` into `folder`.
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        folder: FolderId,
        watch_path: impl Into<PathBuf>,
        config: SyncConfig,
    ) -> Self {
        Self {
            remote,
            folder,
            watch_path: watch_path.into(),
            config,
        }
    }

    /// Start monitoring and process events until the watcher shuts down.
    ///
    /// Each event is dispatched to its own task; a failed upload never
    /// stops the loop.
    ///
    /// # Errors
    /// - Watch subscription failure at startup
    pub async fn run(self) -> Result<()> {
        let mut watcher =
            DirectoryWatcher::start(&self.watch_path, self.config.upload_existing)?;

        let pipeline = Arc::new(UploadPipeline::new(
            self.remote,
            self.folder,
            self.config.max_concurrent_uploads,
        ));

        info!(
            "File monitoring started on {}. Waiting for new files...",
            self.watch_path.display()
        );

        while let Some(event) = watcher.next_event().await {
            tokio::spawn(pipeline.clone().handle_event(event));
        }

        Ok(())
    }
}
