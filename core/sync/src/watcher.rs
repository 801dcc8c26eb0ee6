//! Filesystem watching for newly created files.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use updrift_common::{Error, Result};

/// Notification that a new file appeared under the monitored path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Full path of the new file.
    pub path: PathBuf,
}

/// Persistent observer of a single directory.
///
/// Emits one event per file that newly appears directly under the watched
/// path. Dotfile entries are ignored and subdirectories are not descended
/// into. Whether files already present at startup are reported is
/// controlled by `include_existing`.
pub struct DirectoryWatcher {
    rx: mpsc::UnboundedReceiver<WatchEvent>,
    // Dropping the notify handle cancels the subscription, so it lives as
    // long as the receiver.
    _watcher: RecommendedWatcher,
}

impl DirectoryWatcher {
    /// Begin observation of the given directory.
    ///
    /// With `include_existing` set, regular files already present are
    /// emitted before any filesystem events.
    ///
    /// # Errors
    /// - Watch subscription failure
    /// - Initial scan I/O failure
    pub fn start(path: &Path, include_existing: bool) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        if include_existing {
            for entry in std::fs::read_dir(path)? {
                let entry = entry?;
                let entry_path = entry.path();
                if entry.file_type()?.is_file() && !is_hidden(&entry_path) {
                    debug!("queueing pre-existing file {}", entry_path.display());
                    let _ = tx.send(WatchEvent { path: entry_path });
                }
            }
        }

        // The notify callback runs on the watcher's own thread; an
        // unbounded sender is safe to use from there.
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            let event = match result {
                Ok(event) => event,
                Err(err) => {
                    warn!("filesystem watch error: {}", err);
                    return;
                }
            };

            if !matches!(event.kind, EventKind::Create(_)) {
                return;
            }

            for path in event.paths {
                if is_hidden(&path) || !path.is_file() {
                    continue;
                }
                if tx.send(WatchEvent { path }).is_err() {
                    // Receiver dropped; the subscription is winding down.
                    return;
                }
            }
        })
        .map_err(|e| Error::Watch(format!("failed to create watcher: {}", e)))?;

        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| Error::Watch(format!("failed to watch {}: {}", path.display(), e)))?;

        Ok(Self {
            rx,
            _watcher: watcher,
        })
    }

    /// Wait for the next new-file notification.
    ///
    /// Returns `None` once the subscription has shut down.
    pub async fn next_event(&mut self) -> Option<WatchEvent> {
        self.rx.recv().await
    }
}

/// Whether the final path segment is a dotfile entry.
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(Path::new("/watch/.secret")));
        assert!(is_hidden(Path::new(".dotfile")));
        assert!(!is_hidden(Path::new("/watch/visible.txt")));
    }

    #[tokio::test]
    async fn test_initial_scan_reports_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"b").unwrap();
        std::fs::write(dir.path().join(".hidden"), b"h").unwrap();

        let mut watcher = DirectoryWatcher::start(dir.path(), true).unwrap();

        let mut names = Vec::new();
        for _ in 0..2 {
            let event = watcher.next_event().await.unwrap();
            names.push(event.path.file_name().unwrap().to_str().unwrap().to_string());
        }
        names.sort();

        assert_eq!(names, vec!["a.txt".to_string(), "b.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_initial_scan_skipped_by_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("old.txt"), b"old").unwrap();

        let mut watcher = DirectoryWatcher::start(dir.path(), false).unwrap();

        let waited =
            tokio::time::timeout(Duration::from_millis(300), watcher.next_event()).await;
        assert!(waited.is_err(), "pre-existing file must not be reported");
    }

    #[tokio::test]
    async fn test_new_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = DirectoryWatcher::start(dir.path(), false).unwrap();

        // Give the subscription a moment to settle before creating the file.
        tokio::time::sleep(Duration::from_millis(100)).await;
        std::fs::write(dir.path().join("fresh.txt"), b"fresh").unwrap();

        let event = tokio::time::timeout(Duration::from_secs(5), watcher.next_event())
            .await
            .expect("watcher did not report the new file")
            .unwrap();

        assert_eq!(event.path.file_name().unwrap(), "fresh.txt");
    }
}
