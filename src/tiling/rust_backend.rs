//! Pure Rust tile generator.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Crop + scale partial tiles | `DynamicImage::crop_imm` + `resize_exact` (Lanczos3) |
//! | Full-region downsizes | `DynamicImage::thumbnail_exact` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Parallel encode | `rayon` over the tiles of one image |

use super::backend::{TileGenerator, TilingError};
use super::calculations::{TileRegion, TileSpec, plan};
use super::info::ImageInfo;
use super::params::{Quality, TileRequest};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use rayon::prelude::*;
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust tiler using the `image` crate ecosystem.
pub struct RustTiler;

impl RustTiler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustTiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode a source image, normalized to 8-bit RGB for JPEG output.
fn load_image(path: &Path) -> Result<DynamicImage, TilingError> {
    let decode_error = |reason: String| TilingError::Decode {
        path: path.to_path_buf(),
        reason,
    };
    let img = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| decode_error(e.to_string()))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(decode_error("image has zero width or height".to_string()));
    }
    Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
}

fn render_tile(img: &DynamicImage, tile: &TileSpec) -> DynamicImage {
    match tile.region {
        TileRegion::Full => img.thumbnail_exact(tile.width, tile.height),
        TileRegion::Part(r) => {
            let cropped = img.crop_imm(r.x, r.y, r.width, r.height);
            if (r.width, r.height) == (tile.width, tile.height) {
                cropped
            } else {
                cropped.resize_exact(tile.width, tile.height, FilterType::Lanczos3)
            }
        }
    }
}

fn save_jpeg(img: &DynamicImage, path: &Path, quality: Quality) -> Result<(), TilingError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality.value() as u8);
    img.write_with_encoder(encoder)
        .map_err(|e| TilingError::Encode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

impl TileGenerator for RustTiler {
    fn generate(&self, request: &TileRequest) -> Result<(), TilingError> {
        let img = load_image(&request.source)?;
        let tile_plan = plan(img.width(), img.height(), request.tile_size);

        std::fs::create_dir_all(&request.output_dir)?;
        tile_plan.tiles.par_iter().try_for_each(|tile| {
            let rendered = render_tile(&img, tile);
            save_jpeg(
                &rendered,
                &request.output_dir.join(tile.relative_path()),
                request.quality,
            )
        })?;

        ImageInfo::level0(request.id.clone(), &tile_plan).save(&request.output_dir)?;
        Ok(())
    }
}
