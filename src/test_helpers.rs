//! Shared test utilities for the iiif-assemble test suite.
//!
//! Fixtures are built on the fly in temp directories rather than checked in:
//! synthetic JPEGs for the real tiler, and small placeholder sources (unique
//! bytes per row) for tests that run against
//! [`MockTiler`](crate::tiling::backend::tests::MockTiler).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let row = catalog_row(1, "Dessau", "Letter to Mies", "p1.jpg");
//! let source = write_source(&tmp.path().join("data"), &row);
//! create_test_jpeg(&tmp.path().join("scan.jpg"), 300, 200, 7);
//! ```

use crate::catalog::CatalogRow;
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};

// =========================================================================
// Images
// =========================================================================

/// Write a `width` x `height` JPEG with a gradient pattern varied by `seed`,
/// so different seeds produce different bytes (and content ids).
pub fn create_test_jpeg(path: &Path, width: u32, height: u32, seed: u8) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x % 256) as u8 ^ seed,
            (y % 256) as u8,
            ((x + y) % 256) as u8 ^ seed.rotate_left(3),
        ])
    });
    img.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
}

// =========================================================================
// Catalog rows
// =========================================================================

/// A row in archive `Bauhaus-Archiv`, locator `Box 3`, type `Letter`.
pub fn catalog_row(line: u64, site: &str, title: &str, filename: &str) -> CatalogRow {
    CatalogRow {
        line,
        site: site.to_string(),
        archive: "Bauhaus-Archiv".to_string(),
        locator: "Box 3".to_string(),
        item_type: "Letter".to_string(),
        filename: filename.to_string(),
        title: title.to_string(),
    }
}

/// Create the row's source file under `data_root` with bytes unique to the
/// row's full path. Returns the path.
pub fn write_source(data_root: &Path, row: &CatalogRow) -> PathBuf {
    let path = row.source_path(data_root);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, path.to_string_lossy().as_bytes()).unwrap();
    path
}
