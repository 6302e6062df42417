//! Move a generated site to a new base URL.
//!
//! Manifests and tile descriptors embed absolute URIs built from the
//! configured `hostname`. `rewrite` replaces one base URL with another in
//! place, so a site built on `localhost` can be published elsewhere without
//! re-tiling:
//!
//! - every manifest listed in `manifests/index.json`;
//! - every `images/tiles/<content_id>/info.json`.
//!
//! The index itself holds host-relative URIs and is left alone. Manifests
//! listed in the index but missing on disk are reported, not fatal.

use crate::atomic::write_atomic;
use crate::store::{INDEX_FILENAME, ManifestIndex, StoreError};
use crate::tiling::INFO_FILENAME;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Index(#[from] StoreError),
    #[error("Failed to walk {path}: {reason}")]
    Walk { path: PathBuf, reason: String },
    #[error("Invalid rewrite: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RewriteReport {
    pub manifests_changed: usize,
    pub descriptors_changed: usize,
    /// Files that did not contain the old URL.
    pub unchanged: usize,
    /// Index entries whose manifest file does not exist.
    pub missing: Vec<PathBuf>,
}

impl RewriteReport {
    pub fn changed(&self) -> usize {
        self.manifests_changed + self.descriptors_changed
    }
}

/// Replace `from` with `to` in every manifest and tile descriptor under
/// `output_root`.
pub fn rewrite(output_root: &Path, from: &str, to: &str) -> Result<RewriteReport, RewriteError> {
    if from.is_empty() {
        return Err(RewriteError::Invalid("--from must not be empty".into()));
    }
    if from == to {
        return Err(RewriteError::Invalid("--from and --to are identical".into()));
    }

    let mut report = RewriteReport::default();

    let index = ManifestIndex::load(&output_root.join("manifests").join(INDEX_FILENAME))?;
    for entry in index.entries() {
        let path = output_root.join(entry.manifest_uri.trim_start_matches('/'));
        if !path.is_file() {
            warn!(path = %path.display(), "indexed manifest not found");
            report.missing.push(path);
            continue;
        }
        if replace_in_file(&path, from, to)? {
            report.manifests_changed += 1;
        } else {
            report.unchanged += 1;
        }
    }

    for path in descriptor_paths(&output_root.join("images").join("tiles"))? {
        if replace_in_file(&path, from, to)? {
            report.descriptors_changed += 1;
        } else {
            report.unchanged += 1;
        }
    }

    Ok(report)
}

/// `info.json` of every completed tile set. Hidden staging directories are
/// skipped.
fn descriptor_paths(tiles_root: &Path) -> Result<Vec<PathBuf>, RewriteError> {
    if !tiles_root.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    let walker = WalkDir::new(tiles_root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = entry.map_err(|e| RewriteError::Walk {
            path: tiles_root.to_path_buf(),
            reason: e.to_string(),
        })?;
        let info = entry.path().join(INFO_FILENAME);
        if entry.file_type().is_dir() && info.is_file() {
            paths.push(info);
        }
    }
    Ok(paths)
}

fn replace_in_file(path: &Path, from: &str, to: &str) -> Result<bool, RewriteError> {
    let content = fs::read_to_string(path)?;
    if !content.contains(from) {
        return Ok(false);
    }
    write_atomic(path, content.replace(from, to).as_bytes())?;
    debug!(path = %path.display(), "rewrote");
    Ok(true)
}
