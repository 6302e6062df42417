//! Content-addressed tile cache for incremental builds.
//!
//! Tiling is the bottleneck of the pipeline: a 600 dpi folio scan yields
//! hundreds of JPEG tiles. This module lets a re-run skip tiling for every
//! image it has already seen, so adding rows to the catalog and running again
//! only tiles the new scans.
//!
//! # Design
//!
//! ## Cache keys
//!
//! The cache is **content-addressed**: each tile set lives in
//! `images/tiles/<content_id>/`, where the id is the SHA-256 of the source
//! bytes (see [`crate::content_id`]). Renaming a scan, moving it to another
//! archive folder, or cataloguing the same file twice never causes a second
//! tiling run.
//!
//! A cache hit only requires the directory to exist. Generation happens in a
//! hidden staging directory (`.<content_id>.partial`) that is renamed into
//! place once the tiler has written a readable descriptor, so a crash or a
//! corrupt scan never leaves behind a directory that would later be mistaken
//! for a complete entry.
//!
//! ## Descriptor stamping
//!
//! After the directory is known to exist its `info.json` is read and its
//! `@id` set to the externally reachable base URL for this content id. The
//! descriptor is rewritten only when that stamp changes (first build, or a
//! new `hostname`), so a re-run leaves every cached file byte-identical.

use crate::config::Config;
use crate::content_id::{self, ContentId};
use crate::tiling::{INFO_FILENAME, ImageInfo, Quality, Size, TileGenerator, TileRequest};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Unreadable source image {path}: {source}")]
    UnreadableAsset { path: PathBuf, source: io::Error },
    #[error("Tiling failed for {path} ({content_id}): {reason}")]
    TilingFailure {
        path: PathBuf,
        content_id: ContentId,
        reason: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Geometry and address of a cached tile set.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSet {
    pub content_id: ContentId,
    pub width: u32,
    pub height: u32,
    /// Full-region sizes advertised by the descriptor, largest first.
    pub sizes: Vec<Size>,
    /// Image API base URL (`{hostname}/images/tiles/<content_id>`).
    pub base_url: String,
}

impl TileSet {
    /// Thumbnail request URL built from the first advertised size:
    /// `{base}/full/{w},/0/default.jpg`. `None` when no sizes are listed.
    pub fn thumbnail_url(&self) -> Option<String> {
        let size = self.sizes.first()?;
        Some(format!(
            "{}/full/{},/0/default.jpg",
            self.base_url.trim_end_matches('/'),
            size.width
        ))
    }
}

/// Whether [`TileCache::ensure_tiles`] found or produced the tile set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileStatus {
    Cached,
    Generated,
}

pub struct TileCache<T: TileGenerator> {
    tiler: T,
    root: PathBuf,
    base_url: String,
    tile_size: u32,
    quality: Quality,
    stats: CacheStats,
}

impl<T: TileGenerator> TileCache<T> {
    pub fn new(
        tiler: T,
        root: impl Into<PathBuf>,
        base_url: &str,
        tile_size: u32,
        quality: Quality,
    ) -> Self {
        Self {
            tiler,
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            tile_size,
            quality,
            stats: CacheStats::default(),
        }
    }

    pub fn from_config(tiler: T, config: &Config) -> Self {
        Self::new(
            tiler,
            config.tiles_dir(),
            &config.tiles_base_url(),
            config.tiles.tile_size,
            Quality::new(config.tiles.quality),
        )
    }

    pub fn tiler(&self) -> &T {
        &self.tiler
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Directory holding the tile set for a content id.
    pub fn tile_dir(&self, id: &ContentId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Externally reachable Image API base URL for a content id.
    pub fn url_for(&self, id: &ContentId) -> String {
        format!("{}/{}", self.base_url, id)
    }

    /// Make sure a tile set exists for `source` and return its geometry.
    ///
    /// Tiling runs only when no directory exists for the source's content
    /// id; otherwise the cached descriptor is used as is.
    pub fn ensure_tiles(&mut self, source: &Path) -> Result<(TileSet, TileStatus), CacheError> {
        let content_id =
            content_id::identify(source).map_err(|e| CacheError::UnreadableAsset {
                path: source.to_path_buf(),
                source: e,
            })?;
        let tile_dir = self.tile_dir(&content_id);
        let url = self.url_for(&content_id);

        let status = if tile_dir.is_dir() {
            debug!(%content_id, source = %source.display(), "tile cache hit");
            TileStatus::Cached
        } else {
            if let Err(e) = self.generate(source, &content_id, &tile_dir, &url) {
                self.stats.fail();
                return Err(e);
            }
            info!(%content_id, source = %source.display(), "tiled");
            TileStatus::Generated
        };

        let mut descriptor = ImageInfo::load(&tile_dir).map_err(|e| {
            self.stats.fail();
            CacheError::TilingFailure {
                path: source.to_path_buf(),
                content_id: content_id.clone(),
                reason: format!("unreadable {INFO_FILENAME}: {e}"),
            }
        })?;
        if descriptor.id != url {
            descriptor.id = url.clone();
            descriptor.save(&tile_dir)?;
        }

        match status {
            TileStatus::Cached => self.stats.hit(),
            TileStatus::Generated => self.stats.miss(),
        }

        Ok((
            TileSet {
                content_id,
                width: descriptor.width,
                height: descriptor.height,
                sizes: descriptor.sizes,
                base_url: url,
            },
            status,
        ))
    }

    /// Tile into a staging directory and move it into place on success.
    fn generate(
        &self,
        source: &Path,
        content_id: &ContentId,
        tile_dir: &Path,
        url: &str,
    ) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.root)?;
        let staging = self.root.join(format!(".{content_id}.partial"));
        if staging.exists() {
            std::fs::remove_dir_all(&staging)?;
        }

        let request = TileRequest {
            source: source.to_path_buf(),
            id: url.to_string(),
            output_dir: staging.clone(),
            tile_size: self.tile_size,
            quality: self.quality,
        };
        let outcome = self
            .tiler
            .generate(&request)
            .map_err(|e| e.to_string())
            .and_then(|()| {
                ImageInfo::load(&staging)
                    .map(|_| ())
                    .map_err(|e| format!("unreadable {INFO_FILENAME}: {e}"))
            });

        if let Err(reason) = outcome {
            if staging.exists() {
                std::fs::remove_dir_all(&staging)?;
            }
            return Err(CacheError::TilingFailure {
                path: source.to_path_buf(),
                content_id: content_id.clone(),
                reason,
            });
        }

        std::fs::rename(&staging, tile_dir)?;
        Ok(())
    }
}

/// Summary of cache performance for a build run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
    pub failures: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn fail(&mut self) {
        self.failures += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses + self.failures
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(f, "{} cached, {} tiled", self.hits, self.misses)?;
        } else {
            write!(f, "{} tiled", self.misses)?;
        }
        if self.failures > 0 {
            write!(f, ", {} failed", self.failures)?;
        }
        if self.hits > 0 || self.failures > 0 {
            write!(f, " ({} total)", self.total())?;
        }
        Ok(())
    }
}
