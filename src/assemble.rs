//! Groups catalog rows into documents.
//!
//! The assembler is a streaming reducer over catalog rows in file order.
//! It holds at most one open document at a time:
//!
//! ```text
//!             row (key K)                    row (key K)
//! NoDocument ─────────────▶ InDocument(K) ◀─────────────┐
//!                              │   └────────────────────┘
//!                              │ row (key J ≠ K): finish K, open J
//!                              ▼
//!                          InDocument(J)
//! ```
//!
//! Only *contiguous* rows with the same key form one document. A key that
//! reappears after a different one starts a fresh document; the store
//! notices the repeated id (see [`crate::store`]).
//!
//! ## Row filters
//!
//! A row is skipped, never fatal, when:
//!
//! 1. its filename is a dotfile or lacks an accepted image extension;
//! 2. its title is empty;
//! 3. its source file does not exist;
//! 4. `"{site} - {title}"` slugifies to nothing, or to the index's name;
//! 5. its source cannot be read or (under the default policy) tiled.
//!
//! The image is resolved *before* document state changes, so a row that
//! fails filter 5 never opens an empty document.

use crate::cache::{CacheError, TileCache, TileStatus};
use crate::catalog::{CatalogError, CatalogRow};
use crate::config::{Config, FailurePolicy};
use crate::manifest::{DocumentKey, DocumentMetadata, ImageRecord, Manifest};
use crate::store::INDEX_STEM;
use crate::tiling::TileGenerator;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("Tiling failed at catalog line {line}: {source}")]
    Tiling { line: u64, source: CacheError },
    #[error("Tile cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Why a catalog row contributed no page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotAnImage,
    MissingTitle,
    MissingSource(PathBuf),
    EmptyKey,
    /// The key would collide with `manifests/index.json`.
    ReservedKey,
    UnreadableAsset(String),
    TilingFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnImage => write!(f, "not an accepted image file"),
            Self::MissingTitle => write!(f, "no title"),
            Self::MissingSource(path) => write!(f, "source not found: {}", path.display()),
            Self::EmptyKey => write!(f, "title has no usable characters"),
            Self::ReservedKey => write!(f, "document id {INDEX_STEM:?} is reserved"),
            Self::UnreadableAsset(reason) => write!(f, "unreadable source: {reason}"),
            Self::TilingFailed(reason) => write!(f, "tiling failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub line: u64,
    pub filename: String,
    pub reason: SkipReason,
}

/// A row that passed the cheap filters (1-4).
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedRow {
    pub key: DocumentKey,
    /// `"{site} - {title}"`
    pub label: String,
    pub source: PathBuf,
}

/// The filters that need no image decoding.
#[derive(Debug, Clone)]
pub struct RowFilter {
    data_root: PathBuf,
    extensions: Vec<String>,
}

impl RowFilter {
    pub fn new(data_root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            data_root: data_root.into(),
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.data_root(), &config.catalog.extensions)
    }

    fn is_accepted_image(&self, filename: &str) -> bool {
        if filename.starts_with('.') {
            return false;
        }
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&e.to_ascii_lowercase()))
            .unwrap_or(false)
    }

    pub fn screen(&self, row: &CatalogRow) -> Result<AcceptedRow, SkipReason> {
        if !self.is_accepted_image(&row.filename) {
            return Err(SkipReason::NotAnImage);
        }
        if row.title.trim().is_empty() {
            return Err(SkipReason::MissingTitle);
        }
        let source = row.source_path(&self.data_root);
        if !source.is_file() {
            return Err(SkipReason::MissingSource(source));
        }
        let label = format!("{} - {}", row.site, row.title);
        let key = DocumentKey::from_title(&label).ok_or(SkipReason::EmptyKey)?;
        if key.as_str() == INDEX_STEM {
            return Err(SkipReason::ReservedKey);
        }
        Ok(AcceptedRow { key, label, source })
    }
}

enum AssemblyState {
    NoDocument,
    InDocument(Manifest),
}

/// A page that made it into a document.
#[derive(Debug)]
pub struct AddedPage {
    pub key: DocumentKey,
    pub label: String,
    pub page: u32,
    pub status: TileStatus,
    /// This row opened a new document.
    pub opened: bool,
    /// The previously open document, closed by this row's key change.
    pub finished: Option<Manifest>,
}

#[derive(Debug)]
pub enum RowOutcome {
    Added(AddedPage),
    Skipped(SkippedRow),
}

pub struct DocumentAssembler<'a, T: TileGenerator> {
    cache: &'a mut TileCache<T>,
    filter: RowFilter,
    on_failure: FailurePolicy,
    state: AssemblyState,
}

impl<'a, T: TileGenerator> DocumentAssembler<'a, T> {
    pub fn new(cache: &'a mut TileCache<T>, filter: RowFilter, on_failure: FailurePolicy) -> Self {
        Self {
            cache,
            filter,
            on_failure,
            state: AssemblyState::NoDocument,
        }
    }

    pub fn from_config(cache: &'a mut TileCache<T>, config: &Config) -> Self {
        Self::new(cache, RowFilter::from_config(config), config.tiles.on_failure)
    }

    /// Feed the next catalog row.
    ///
    /// Returns `Err` only for failures that should stop the build: a tiling
    /// failure under [`FailurePolicy::Abort`], or an I/O error in the tile
    /// cache itself.
    pub fn push(&mut self, row: &CatalogRow) -> Result<RowOutcome, AssembleError> {
        let accepted = match self.filter.screen(row) {
            Ok(accepted) => accepted,
            Err(reason) => return Ok(skip(row, reason)),
        };

        let (tiles, status) = match self.cache.ensure_tiles(&accepted.source) {
            Ok(resolved) => resolved,
            Err(CacheError::UnreadableAsset { source, .. }) => {
                return Ok(skip(row, SkipReason::UnreadableAsset(source.to_string())));
            }
            Err(e @ CacheError::TilingFailure { .. }) => match self.on_failure {
                FailurePolicy::Skip => {
                    return Ok(skip(row, SkipReason::TilingFailed(e.to_string())));
                }
                FailurePolicy::Abort => {
                    return Err(AssembleError::Tiling {
                        line: row.line,
                        source: e,
                    });
                }
            },
            Err(e) => return Err(e.into()),
        };

        let (mut manifest, finished) =
            match std::mem::replace(&mut self.state, AssemblyState::NoDocument) {
                AssemblyState::InDocument(open) if open.id == accepted.key => (open, None),
                AssemblyState::InDocument(done) => (open_document(row, &accepted), Some(done)),
                AssemblyState::NoDocument => (open_document(row, &accepted), None),
            };

        let image = ImageRecord {
            thumbnail_url: tiles.thumbnail_url(),
            source_path: accepted.source,
            content_id: tiles.content_id,
            tile_base_url: tiles.base_url,
            width: tiles.width,
            height: tiles.height,
        };
        let opened = manifest.page_count() == 0;
        let page = manifest.append_page(image);
        self.state = AssemblyState::InDocument(manifest);

        debug!(key = %accepted.key, page, line = row.line, "page added");
        Ok(RowOutcome::Added(AddedPage {
            key: accepted.key,
            label: accepted.label,
            page,
            status,
            opened,
            finished,
        }))
    }

    /// Close the open document, if any.
    pub fn finish(self) -> Option<Manifest> {
        match self.state {
            AssemblyState::InDocument(manifest) => Some(manifest),
            AssemblyState::NoDocument => None,
        }
    }
}

fn open_document(row: &CatalogRow, accepted: &AcceptedRow) -> Manifest {
    Manifest::new(
        accepted.key.clone(),
        accepted.label.clone(),
        DocumentMetadata {
            title: accepted.label.clone(),
            archive: row.archive.clone(),
            locator: row.locator.clone(),
            item_type: row.item_type.clone(),
        },
    )
}

fn skip(row: &CatalogRow, reason: SkipReason) -> RowOutcome {
    match reason {
        SkipReason::NotAnImage | SkipReason::MissingTitle => {
            debug!(line = row.line, filename = %row.filename, %reason, "row skipped");
        }
        _ => warn!(line = row.line, filename = %row.filename, %reason, "row skipped"),
    }
    RowOutcome::Skipped(SkippedRow {
        line: row.line,
        filename: row.filename.clone(),
        reason,
    })
}

// ============================================================================
// Dry-run planning
// ============================================================================

/// A document as it would be assembled, without tiling.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDocument {
    pub key: DocumentKey,
    pub label: String,
    pub first_line: u64,
    pub pages: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plan {
    pub documents: Vec<PlannedDocument>,
    pub skipped: Vec<SkippedRow>,
}

impl Plan {
    pub fn page_count(&self) -> u32 {
        self.documents.iter().map(|d| d.pages).sum()
    }

    /// Keys shared by more than one planned document, in first-seen order.
    /// Each would overwrite the earlier manifest with the same id.
    pub fn repeated_keys(&self) -> Vec<&DocumentKey> {
        let mut repeated: Vec<&DocumentKey> = Vec::new();
        for (i, doc) in self.documents.iter().enumerate() {
            let seen_before = self.documents[..i].iter().any(|d| d.key == doc.key);
            if seen_before && !repeated.contains(&&doc.key) {
                repeated.push(&doc.key);
            }
        }
        repeated
    }
}

/// Group rows the way [`DocumentAssembler`] would, applying only the
/// filters that need no decoding. Stops at the first catalog error.
pub fn plan<I>(rows: I, filter: &RowFilter) -> Result<Plan, CatalogError>
where
    I: IntoIterator<Item = Result<CatalogRow, CatalogError>>,
{
    let mut plan = Plan::default();
    for row in rows {
        let row = row?;
        let accepted = match filter.screen(&row) {
            Ok(accepted) => accepted,
            Err(reason) => {
                plan.skipped.push(SkippedRow {
                    line: row.line,
                    filename: row.filename,
                    reason,
                });
                continue;
            }
        };
        match plan.documents.last_mut() {
            Some(open) if open.key == accepted.key => open.pages += 1,
            _ => plan.documents.push(PlannedDocument {
                key: accepted.key,
                label: accepted.label,
                first_line: row.line,
                pages: 1,
            }),
        }
    }
    Ok(plan)
}
