//! Manifest persistence and the manifest index.
//!
//! Output layout under `output_dir`:
//!
//! ```text
//! manifests/
//! ├── index.json          # [{ "manifestUri": "/manifests/<id>.json", "location": ... }]
//! ├── s-t.json
//! └── ...
//! ```
//!
//! ## Index maintenance
//!
//! `index.json` is an ordered JSON array that viewers load to list every
//! document. It is maintained incrementally across runs: each persisted
//! manifest is **upserted** by `manifestUri`, replacing an existing entry in
//! place or appending a new one, so re-running a build never duplicates
//! entries. Duplicates already present in an index written by older tooling
//! are collapsed on load (first position wins, last value wins).
//!
//! An index that exists but cannot be parsed is fatal: silently starting
//! over would drop every document not in the current catalog.
//!
//! ## Atomic writes
//!
//! Every file is written to a hidden sibling and renamed into place, so an
//! interrupted run leaves either the old or the new version, never a
//! truncated one. Files whose content is unchanged are not rewritten.
//!
//! ## Repeated ids
//!
//! Two documents in one run can map to the same id: a title whose rows are
//! not contiguous, or two titles that slugify identically. The later one
//! overwrites the earlier manifest. The store reports this in
//! [`Persisted::superseded`] and logs a warning.

use crate::atomic::write_atomic;
use crate::manifest::{DocumentKey, Manifest};
use crate::presentation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// File stem of the index. No document may use it as its id.
pub const INDEX_STEM: &str = "index";
pub const INDEX_FILENAME: &str = "index.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Manifest index {path} is corrupt: {reason}")]
    IndexCorruption { path: PathBuf, reason: String },
    #[error("Document id {0:?} is reserved for the manifest index")]
    ReservedId(String),
}

/// One line of `index.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    #[serde(rename = "manifestUri")]
    pub manifest_uri: String,
    pub location: String,
}

/// Host-relative URI of a manifest, as listed in the index.
pub fn index_uri(id: &DocumentKey) -> String {
    format!("/manifests/{id}.json")
}

/// Ordered index with O(1) lookup by `manifestUri`.
#[derive(Debug, Default, Clone)]
pub struct ManifestIndex {
    entries: Vec<IndexEntry>,
    positions: HashMap<String, usize>,
}

impl ManifestIndex {
    pub fn from_entries(entries: Vec<IndexEntry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            index.upsert(entry);
        }
        index
    }

    /// Load an index file. A missing file is an empty index.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        let entries: Vec<IndexEntry> =
            serde_json::from_str(&content).map_err(|e| StoreError::IndexCorruption {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let loaded = entries.len();
        let index = Self::from_entries(entries);
        if index.len() < loaded {
            warn!(
                path = %path.display(),
                duplicates = loaded - index.len(),
                "collapsed duplicate index entries"
            );
        }
        Ok(index)
    }

    /// Insert or replace the entry for `entry.manifest_uri`. Returns `true`
    /// when the entry is new.
    pub fn upsert(&mut self, entry: IndexEntry) -> bool {
        match self.positions.get(&entry.manifest_uri) {
            Some(&i) => {
                self.entries[i] = entry;
                false
            }
            None => {
                self.positions
                    .insert(entry.manifest_uri.clone(), self.entries.len());
                self.entries.push(entry);
                true
            }
        }
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_string_pretty(&self.entries)?;
        json.push('\n');
        Ok(json)
    }
}

/// Result of persisting one manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct Persisted {
    pub path: PathBuf,
    /// Index URI, `/manifests/<id>.json`.
    pub manifest_uri: String,
    /// The file's bytes changed.
    pub changed: bool,
    /// Label of a document written earlier in this run under the same id,
    /// now overwritten.
    pub superseded: Option<String>,
}

pub struct ManifestStore {
    dir: PathBuf,
    base_uri: String,
    index: ManifestIndex,
    written: HashMap<DocumentKey, String>,
}

impl ManifestStore {
    /// Open the manifests directory, creating it if needed, and load its
    /// index.
    pub fn open(dir: impl Into<PathBuf>, base_uri: &str) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let index = ManifestIndex::load(&dir.join(INDEX_FILENAME))?;
        debug!(entries = index.len(), "loaded manifest index");
        Ok(Self {
            dir,
            base_uri: base_uri.trim_end_matches('/').to_string(),
            index,
            written: HashMap::new(),
        })
    }

    pub fn index(&self) -> &ManifestIndex {
        &self.index
    }

    pub fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILENAME)
    }

    /// Write the manifest, then upsert and rewrite the index.
    pub fn persist(&mut self, manifest: &Manifest) -> Result<Persisted, StoreError> {
        if manifest.id.as_str() == INDEX_STEM {
            return Err(StoreError::ReservedId(manifest.id.to_string()));
        }
        let path = self.dir.join(format!("{}.json", manifest.id));
        let json = presentation::render(manifest, &self.base_uri)?;
        let changed = write_atomic(&path, json.as_bytes())?;

        let manifest_uri = index_uri(&manifest.id);
        self.index.upsert(IndexEntry {
            manifest_uri: manifest_uri.clone(),
            location: manifest.location.clone(),
        });
        write_atomic(&self.index_path(), self.index.to_json()?.as_bytes())?;

        let superseded = self
            .written
            .insert(manifest.id.clone(), manifest.label.clone());
        if let Some(previous) = &superseded {
            warn!(
                id = %manifest.id,
                previous = %previous,
                current = %manifest.label,
                "manifest id written twice in one run; earlier document overwritten"
            );
        }

        Ok(Persisted {
            path,
            manifest_uri,
            changed,
            superseded,
        })
    }
}
