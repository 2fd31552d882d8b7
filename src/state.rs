// src/state.rs
//! Persisted dedup ledger + fingerprints, one JSON file per installation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::PersistStoreError;

pub const DEFAULT_STATE_PATH: &str = "state/watch_state.json";

/// Item key -> notified. Only `true` entries are ever written.
pub type DedupLedger = BTreeMap<String, bool>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistedState {
    /// Ledgers scoped per itemized source id.
    #[serde(default)]
    pub ledger: BTreeMap<String, DedupLedger>,
    /// Last content hash per opaque source id.
    #[serde(default)]
    pub fingerprints: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PersistedState {
    pub fn ledger_for(&self, source_id: &str) -> Option<&DedupLedger> {
        self.ledger.get(source_id)
    }

    pub fn is_notified(&self, source_id: &str, key: &str) -> bool {
        self.ledger
            .get(source_id)
            .and_then(|l| l.get(key))
            .copied()
            .unwrap_or(false)
    }

    /// Replace a source's ledger with one returned by reconciliation.
    /// Call only after the notification went out.
    pub fn commit_ledger(&mut self, source_id: &str, ledger: DedupLedger) {
        self.ledger.insert(source_id.to_string(), ledger);
    }

    pub fn fingerprint(&self, source_id: &str) -> Option<&str> {
        self.fingerprints.get(source_id).map(String::as_str)
    }

    pub fn set_fingerprint(&mut self, source_id: &str, hash: &str) {
        self.fingerprints
            .insert(source_id.to_string(), hash.to_string());
    }
}

/// How `load` came up with its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Absent,
    Corrupt,
    Unreadable,
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Never fails: anything other than a readable, well-formed file gives an
    /// empty state. The reason is logged.
    pub fn load(&self) -> PersistedState {
        self.load_with_outcome().0
    }

    pub fn load_with_outcome(&self) -> (PersistedState, LoadOutcome) {
        let path = self.path.display();
        let raw = match fs::read(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(%path, "no state file yet, starting empty");
                return (PersistedState::default(), LoadOutcome::Absent);
            }
            Err(e) => {
                let denied = e.kind() == io::ErrorKind::PermissionDenied;
                tracing::warn!(%path, permission_denied = denied, "state unreadable, starting empty: {e}");
                return (PersistedState::default(), LoadOutcome::Unreadable);
            }
        };
        // Invalid UTF-8 surfaces here as a parse error, i.e. corrupt.
        match serde_json::from_slice::<PersistedState>(&raw) {
            Ok(state) => (state, LoadOutcome::Loaded),
            Err(e) => {
                tracing::warn!(%path, "state file malformed, starting empty: {e}");
                (PersistedState::default(), LoadOutcome::Corrupt)
            }
        }
    }

    /// Write the whole state atomically: temp sibling, fsync, rename.
    /// A crash before the rename leaves the previous file intact.
    pub fn save(&self, state: &PersistedState) -> Result<(), PersistStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| PersistStoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_vec_pretty(state)?;
        let tmp = self.tmp_path();
        let written = (|| -> io::Result<()> {
            let mut f = fs::File::create(&tmp)?;
            f.write_all(&json)?;
            f.sync_all()
        })();
        if let Err(source) = written {
            let _ = fs::remove_file(&tmp);
            return Err(PersistStoreError::Write { path: tmp, source });
        }

        fs::rename(&tmp, &self.path).map_err(|source| {
            let _ = fs::remove_file(&tmp);
            PersistStoreError::Rename {
                path: self.path.clone(),
                source,
            }
        })
    }
}
