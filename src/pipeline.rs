//! Build driver: catalog → documents → manifests.
//!
//! A single pass over the catalog in file order. Each row is screened and
//! resolved to tiles by the [`DocumentAssembler`]; each document it closes
//! is persisted immediately by the [`ManifestStore`], so a build that stops
//! part-way leaves every completed manifest (and a consistent index) on
//! disk, and the next run picks up from the tile cache.
//!
//! ```text
//! catalog ──▶ DocumentAssembler ──▶ ManifestStore
//!                  │                  ├── manifests/<id>.json
//!                  ▼                  └── manifests/index.json
//!              TileCache ──▶ images/tiles/<content_id>/
//! ```
//!
//! Progress is reported as [`BuildEvent`]s over an optional channel, so the
//! CLI can print while the library stays free of stdout.

use crate::assemble::{AssembleError, DocumentAssembler, RowOutcome, SkippedRow};
use crate::cache::{CacheStats, TileCache, TileStatus};
use crate::catalog::{CatalogError, CatalogReader};
use crate::config::Config;
use crate::manifest::Manifest;
use crate::store::{ManifestStore, StoreError};
use crate::tiling::{RustTiler, TileGenerator};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("{0}")]
    Assemble(#[from] AssembleError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Progress of a build, in catalog order.
#[derive(Debug, Clone)]
pub enum BuildEvent {
    DocumentStarted {
        key: String,
        label: String,
    },
    PageAdded {
        key: String,
        page: u32,
        source: PathBuf,
        status: TileStatus,
    },
    RowSkipped(SkippedRow),
    ManifestWritten {
        key: String,
        pages: usize,
        path: PathBuf,
        changed: bool,
        /// Label of an earlier document from this run that had the same id.
        superseded: Option<String>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    pub documents: usize,
    pub pages: usize,
    pub skipped: Vec<SkippedRow>,
    /// Ids written more than once in this run.
    pub superseded: Vec<String>,
    pub cache_stats: CacheStats,
}

/// Run a build with the pure Rust tiler.
pub fn run(config: &Config, events: Option<Sender<BuildEvent>>) -> Result<BuildSummary, PipelineError> {
    run_with_tiler(RustTiler::new(), config, events)
}

/// Run a build with a specific tiler (allows testing with mock).
pub fn run_with_tiler<T: TileGenerator>(
    tiler: T,
    config: &Config,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildSummary, PipelineError> {
    let mut store = ManifestStore::open(config.manifests_dir(), config.base_uri())?;
    let rows = CatalogReader::open(&config.catalog_path(), config.catalog.has_headers)?;
    std::fs::create_dir_all(config.tiles_dir())?;

    let mut cache = TileCache::from_config(tiler, config);
    let mut summary = BuildSummary::default();
    let mut assembler = DocumentAssembler::from_config(&mut cache, config);

    for row in rows {
        let row = row?;
        match assembler.push(&row)? {
            RowOutcome::Skipped(skipped) => {
                emit(&events, BuildEvent::RowSkipped(skipped.clone()));
                summary.skipped.push(skipped);
            }
            RowOutcome::Added(added) => {
                if let Some(finished) = &added.finished {
                    persist(&mut store, finished, &mut summary, &events)?;
                }
                if added.opened {
                    emit(
                        &events,
                        BuildEvent::DocumentStarted {
                            key: added.key.to_string(),
                            label: added.label,
                        },
                    );
                }
                emit(
                    &events,
                    BuildEvent::PageAdded {
                        key: added.key.to_string(),
                        page: added.page,
                        source: row.source_path(&config.data_root()),
                        status: added.status,
                    },
                );
            }
        }
    }
    if let Some(last) = assembler.finish() {
        persist(&mut store, &last, &mut summary, &events)?;
    }

    summary.cache_stats = cache.stats().clone();
    info!(
        documents = summary.documents,
        pages = summary.pages,
        skipped = summary.skipped.len(),
        "build complete"
    );
    Ok(summary)
}

fn persist(
    store: &mut ManifestStore,
    manifest: &Manifest,
    summary: &mut BuildSummary,
    events: &Option<Sender<BuildEvent>>,
) -> Result<(), StoreError> {
    let persisted = store.persist(manifest)?;
    summary.documents += 1;
    summary.pages += manifest.page_count();
    if persisted.superseded.is_some() {
        summary.superseded.push(manifest.id.to_string());
    }
    emit(
        events,
        BuildEvent::ManifestWritten {
            key: manifest.id.to_string(),
            pages: manifest.page_count(),
            path: persisted.path,
            changed: persisted.changed,
            superseded: persisted.superseded,
        },
    );
    Ok(())
}

fn emit(events: &Option<Sender<BuildEvent>>, event: BuildEvent) {
    if let Some(tx) = events {
        tx.send(event).ok();
    }
}
