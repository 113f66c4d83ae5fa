//! Local snapshot of the session and cart between runs.
//!
//! Stored as a single JSON file readable only by its owner, since it holds
//! the bearer token. Writes go to a sibling temp file first and are renamed
//! into place, so a crash mid-write leaves the old snapshot.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::cart::CartLine;
use crate::session::StoredSession;

/// Errors reading or writing the snapshot file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {path} is not valid: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything kept between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<StoredSession>,
    #[serde(default)]
    pub lines: Vec<CartLine>,
}

/// JSON file holding a [`StateSnapshot`].
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. A missing file is an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file exists but cannot be read, or
    /// `StoreError::Corrupt` if it does not parse.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<StateSnapshot, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no saved state");
                return Ok(StateSnapshot::default());
            }
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Write the snapshot, creating parent directories as needed. The file
    /// is created owner-only (0600 on unix).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be written.
    #[instrument(skip_all, fields(path = %self.path.display(), lines = snapshot.lines.len()))]
    pub fn save(&self, snapshot: &StateSnapshot) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        let json = serde_json::to_vec_pretty(snapshot).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(&json).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        debug!("state saved");
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopfront_core::CustomerId;

    use super::*;
    use crate::testing::product;

    #[test]
    fn test_missing_file_is_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        assert_eq!(store.load().unwrap(), StateSnapshot::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested/dir/state.json"));
        let snapshot = StateSnapshot {
            session: Some(StoredSession {
                customer_id: CustomerId::new("cust-1"),
                token: "tok".to_string(),
            }),
            lines: vec![CartLine::new(product("p1", "Coffee Mug", 850), 2).unwrap()],
        };

        store.save(&snapshot).unwrap();
        assert_eq!(store.load().unwrap(), snapshot);

        // No temp file left beside the snapshot
        let entries = std::fs::read_dir(dir.path().join("nested/dir")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let snapshot = StateSnapshot {
            session: Some(StoredSession {
                customer_id: CustomerId::new("cust-1"),
                token: "secret-token".to_string(),
            }),
            lines: Vec::new(),
        };
        StateStore::new(&path).save(&snapshot).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert!(std::fs::read_to_string(&path).unwrap().contains("secret-token"));
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = StateStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_snapshot_tolerates_missing_fields() {
        let snapshot: StateSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.session.is_none());
        assert!(snapshot.lines.is_empty());
    }
}
