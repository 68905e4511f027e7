//! Persisted dependency state (`deps.json`).
//!
//! The state file maps each source identity (repo id or local path) to the
//! last fetch: the exact release URL (remote) or directory path (local) and
//! the resolved artifact's filename inside the install directory. Remote
//! resolvers compare the recorded URL against fresh release metadata to skip
//! redundant downloads.
//!
//! The file is loaded once per run, mutated in memory behind a lock while
//! processes resolve concurrently, and written back atomically at the end of
//! a successful run. A mid-run failure leaves the on-disk file untouched.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{Error, Result};

/// Filename of the persisted state, relative to the install directory.
pub const STATE_FILE_NAME: &str = "deps.json";

/// Last-known fetch metadata for one source identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyRecord {
    /// Exact release/download URL last fetched (remote sources).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Source directory last copied from (local sources).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Resolved artifact name inside the install directory.
    pub filename: String,
}

impl DependencyRecord {
    /// Record for a remote fetch.
    #[must_use]
    pub fn remote(url: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            path: None,
            filename: filename.into(),
        }
    }

    /// Record for a local copy.
    #[must_use]
    pub fn local(path: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            url: None,
            path: Some(path.into()),
            filename: filename.into(),
        }
    }
}

/// The whole persisted state: source identity -> [`DependencyRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyState {
    #[serde(flatten)]
    records: BTreeMap<String, DependencyRecord>,
}

/// The state as shared by concurrently resolving processes. Writes are
/// per-key (identities are unique by validation), but the map itself needs
/// the lock.
pub type SharedState = Arc<Mutex<DependencyState>>;

impl DependencyState {
    /// Load the state from `install_dir`, creating an empty (compact) state
    /// file first if none exists.
    ///
    /// # Errors
    ///
    /// Malformed JSON is a fatal [`Error::StateCorrupt`]; it is never
    /// auto-repaired.
    pub fn load(install_dir: &Path) -> Result<Self> {
        let path = install_dir.join(STATE_FILE_NAME);
        if !path.exists() {
            let empty = serde_json::to_string(&Self::default())
                .map_err(|e| Error::state_corrupt(&path, e.to_string()))?;
            std::fs::write(&path, empty)
                .map_err(|e| Error::io(e, Some(path.clone()), "creating state file"))?;
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::io(e, Some(path.clone()), "reading state file"))?;
        serde_json::from_str(&content).map_err(|e| Error::state_corrupt(&path, e.to_string()))
    }

    /// Persist the state into `install_dir` as pretty-printed JSON,
    /// replacing the previous file via temp-file + rename.
    ///
    /// Single-writer-per-run: this is a full overwrite, never a merge.
    pub fn save(&self, install_dir: &Path) -> Result<()> {
        let path = install_dir.join(STATE_FILE_NAME);
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::state_corrupt(&path, e.to_string()))?;

        let tmp = install_dir.join(format!("{STATE_FILE_NAME}.tmp"));
        std::fs::write(&tmp, content)
            .map_err(|e| Error::io(e, Some(tmp.clone()), "writing state file"))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| Error::io(e, Some(path.clone()), "replacing state file"))?;
        Ok(())
    }

    /// Look up the record for a source identity.
    #[must_use]
    pub fn get(&self, identity: &str) -> Option<&DependencyRecord> {
        self.records.get(identity)
    }

    /// Insert or replace the record for a source identity.
    pub fn insert(&mut self, identity: impl Into<String>, record: DependencyRecord) {
        self.records.insert(identity.into(), record);
    }

    /// Number of tracked identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether any identity is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Wrap the state for sharing across concurrent resolutions.
    #[must_use]
    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }
}
