//! Pure geometry for IIIF Image API 2.0 level-0 static tiles.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! A static tile set answers exactly the requests a deep-zoom viewer makes:
//!
//! - **Partial tiles** at each scale factor `sf`: the source is cut into
//!   `tile_size * sf` squares, each scaled down by `sf`. Stored at
//!   `x,y,w,h/{sw},/0/default.jpg`.
//! - **Full-region downsizes**: the whole image, halved repeatedly until both
//!   sides fit inside one tile, then all the way down to a single pixel.
//!   Stored at `full/{w},/0/default.jpg` and advertised in `sizes`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upper bound on pyramid depth (2^20 * tile_size is far beyond any scan).
const MAX_LEVELS: u32 = 20;

/// Pixel dimensions, as they appear in the descriptor's `sizes` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// A rectangle of the source image in full-resolution pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileRegion {
    Full,
    Part(Region),
}

/// One output image of the tile set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSpec {
    pub region: TileRegion,
    /// Output dimensions after scaling.
    pub width: u32,
    pub height: u32,
}

impl TileSpec {
    /// Path of this tile relative to the image's tile directory.
    pub fn relative_path(&self) -> PathBuf {
        let region = match self.region {
            TileRegion::Full => "full".to_string(),
            TileRegion::Part(r) => format!("{},{},{},{}", r.x, r.y, r.width, r.height),
        };
        PathBuf::from(region)
            .join(format!("{},", self.width))
            .join("0")
            .join("default.jpg")
    }
}

/// Everything needed to write a level-0 tile set and its descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePlan {
    pub width: u32,
    pub height: u32,
    pub tile_size: u32,
    pub scale_factors: Vec<u32>,
    /// Full-region downsizes, largest first.
    pub sizes: Vec<Size>,
    pub tiles: Vec<TileSpec>,
}

/// Plan the complete tile set for an image.
pub fn plan(width: u32, height: u32, tile_size: u32) -> TilePlan {
    let scale_factors = scale_factors(width, height, tile_size);
    let sizes = full_sizes(width, height, tile_size);
    let mut tiles = partial_tiles(width, height, tile_size, &scale_factors);
    tiles.extend(sizes.iter().map(|s| TileSpec {
        region: TileRegion::Full,
        width: s.width,
        height: s.height,
    }));
    TilePlan {
        width,
        height,
        tile_size,
        scale_factors,
        sizes,
        tiles,
    }
}

/// Scale factors `1, 2, 4, ...` until one tile covers the whole image.
pub fn scale_factors(width: u32, height: u32, tile_size: u32) -> Vec<u32> {
    let mut factors = vec![1];
    for level in 1..MAX_LEVELS {
        let sf = 1u32 << level;
        let span = u64::from(tile_size) * u64::from(sf);
        if span > u64::from(width) && span > u64::from(height) {
            break;
        }
        factors.push(sf);
    }
    factors
}

/// Full-region sizes small enough to fit inside a single tile, largest first.
pub fn full_sizes(width: u32, height: u32, tile_size: u32) -> Vec<Size> {
    let mut sizes: Vec<Size> = Vec::new();
    for level in 0..MAX_LEVELS {
        let factor = f64::from(1u32 << level);
        let w = (f64::from(width) / factor + 0.5) as u32;
        let h = (f64::from(height) / factor + 0.5) as u32;
        if w >= tile_size || h >= tile_size {
            continue;
        }
        if w < 1 || h < 1 {
            break;
        }
        let size = Size {
            width: w,
            height: h,
        };
        if sizes.last() != Some(&size) {
            sizes.push(size);
        }
    }
    sizes
}

/// Partial tiles for every scale factor whose tile does not already cover
/// the whole image (those levels are served by the full-region sizes).
pub fn partial_tiles(width: u32, height: u32, tile_size: u32, factors: &[u32]) -> Vec<TileSpec> {
    let mut tiles = Vec::new();
    for &sf in factors {
        let span = u64::from(tile_size) * u64::from(sf);
        if span >= u64::from(width) && span >= u64::from(height) {
            continue;
        }
        let span = span as u32;
        let mut x = 0;
        while x < width {
            let rw = span.min(width - x);
            let mut y = 0;
            while y < height {
                let rh = span.min(height - y);
                tiles.push(TileSpec {
                    region: TileRegion::Part(Region {
                        x,
                        y,
                        width: rw,
                        height: rh,
                    }),
                    width: rw.div_ceil(sf),
                    height: rh.div_ceil(sf),
                });
                y += rh;
            }
            x += rw;
        }
    }
    tiles
}
