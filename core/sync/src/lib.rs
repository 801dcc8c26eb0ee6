//! Directory-watch-to-upload pipeline for updrift.
//!
//! Watches a local directory for newly created files and uploads each one
//! to a remote folder, skipping names that are already present there.

pub mod pipeline;
pub mod service;
pub mod watcher;

pub use pipeline::{UploadOutcome, UploadPipeline};
pub use service::{SyncConfig, SyncService};
pub use watcher::{DirectoryWatcher, WatchEvent};
