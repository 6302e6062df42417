//! Parameter types for tile generation.
//!
//! These structs describe *what* to generate, not *how*. They are the
//! interface between the [`cache`](crate::cache) (which decides whether and
//! where to tile) and a [`TileGenerator`](super::TileGenerator) (which does
//! the pixel work).

use std::path::PathBuf;

/// Quality setting for JPEG tile encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Full specification for tiling one source image.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRequest {
    pub source: PathBuf,
    /// Value written as the descriptor's `@id`.
    pub id: String,
    /// Directory that receives `info.json` and the tile tree.
    pub output_dir: PathBuf,
    /// Edge length of a full-resolution tile in pixels.
    pub tile_size: u32,
    pub quality: Quality,
}
