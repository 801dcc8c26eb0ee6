//! Persistence of the OAuth2 credential to a local file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use updrift_common::{Error, Result};

use super::auth::Credential;

/// File-backed credential storage.
///
/// The credential is the sole contents of the file, written on the first
/// successful authorization exchange and on every refresh, and read at
/// process startup.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Create a store for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the persisted credential.
    ///
    /// A missing or unreadable file yields `Ok(None)` so the caller can run
    /// the interactive flow. A file that exists but does not parse is an
    /// error: silently re-authorizing over a corrupt credential would hide
    /// the corruption from the operator.
    pub fn read(&self) -> Result<Option<Credential>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) => {
                debug!("no usable credential file at {:?}: {}", self.path, err);
                return Ok(None);
            }
        };

        let credential: Credential = serde_json::from_str(&content).map_err(|e| {
            Error::TokenStore(format!(
                "malformed credential file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        info!("loaded credential from {:?}", self.path);
        Ok(Some(credential))
    }

    /// Persist the credential, replacing any previous contents.
    ///
    /// Writes to a temporary file and renames it into place so a crash
    /// mid-write cannot leave a truncated credential behind.
    pub fn write(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::TokenStore(format!("failed to create credential directory: {}", e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(credential)
            .map_err(|e| Error::TokenStore(format!("failed to serialize credential: {}", e)))?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &content).map_err(|e| {
            Error::TokenStore(format!(
                "failed to write credential file {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            let _ = fs::set_permissions(&temp_path, perms);
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            Error::TokenStore(format!(
                "failed to move credential file into place at {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!("saved credential to {:?}", self.path);
        Ok(())
    }

    /// Path of the credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn credential() -> Credential {
        Credential {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expiry: Utc::now(),
            scope: "https://www.googleapis.com/auth/drive.file".to_string(),
            token_type: "Bearer".to_string(),
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));

        store.write(&credential()).unwrap();
        let loaded = store.read().unwrap().unwrap();

        assert_eq!(loaded.access_token, "access");
        assert_eq!(loaded.refresh_token, "refresh");
    }

    #[test]
    fn test_missing_file_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "{not json").unwrap();

        let store = TokenStore::new(path);
        let err = store.read().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_overwrite_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));

        store.write(&credential()).unwrap();

        let mut updated = credential();
        updated.access_token = "rotated".to_string();
        store.write(&updated).unwrap();

        let loaded = store.read().unwrap().unwrap();
        assert_eq!(loaded.access_token, "rotated");
    }

    #[cfg(unix)]
    #[test]
    fn test_credential_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store.write(&credential()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
