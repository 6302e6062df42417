//! Tile generator trait and shared error type.
//!
//! The production implementation is
//! [`RustTiler`](super::rust_backend::RustTiler). Tests use the
//! [`MockTiler`](tests::MockTiler) below, which records requests and writes
//! a plausible descriptor without decoding anything.

use super::params::TileRequest;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TilingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("Failed to encode tile {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
}

/// Materializes a deep-zoom tile set for one source image.
///
/// On success `request.output_dir` contains `info.json` and the tile tree.
/// On failure the directory may be partially written; the caller owns
/// cleanup.
pub trait TileGenerator: Sync {
    fn generate(&self, request: &TileRequest) -> Result<(), TilingError>;
}

impl<T: TileGenerator + ?Sized> TileGenerator for &T {
    fn generate(&self, request: &TileRequest) -> Result<(), TilingError> {
        (**self).generate(request)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::tiling::ImageInfo;
    use crate::tiling::calculations::{Size, plan};
    use std::collections::{HashMap, HashSet};
    use std::path::Path;
    use std::sync::Mutex;

    /// Mock tiler that records requests and writes only `info.json`.
    ///
    /// Dimensions come from `dimensions` keyed by source file name, falling
    /// back to 640x480. Sources listed in `failing` produce a decode error.
    #[derive(Default)]
    pub struct MockTiler {
        pub dimensions: HashMap<String, Size>,
        pub failing: HashSet<String>,
        pub requests: Mutex<Vec<TileRequest>>,
    }

    impl MockTiler {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_on(names: &[&str]) -> Self {
            Self {
                failing: names.iter().map(|n| n.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn with_size(mut self, name: &str, width: u32, height: u32) -> Self {
            self.dimensions
                .insert(name.to_string(), Size { width, height });
            self
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn file_name(path: &Path) -> String {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        }
    }

    impl TileGenerator for MockTiler {
        fn generate(&self, request: &TileRequest) -> Result<(), TilingError> {
            self.requests.lock().unwrap().push(request.clone());

            let name = Self::file_name(&request.source);
            if self.failing.contains(&name) {
                return Err(TilingError::Decode {
                    path: request.source.clone(),
                    reason: "mock decode failure".to_string(),
                });
            }

            let size = self.dimensions.get(&name).copied().unwrap_or(Size {
                width: 640,
                height: 480,
            });
            std::fs::create_dir_all(&request.output_dir)?;
            ImageInfo::level0(
                request.id.clone(),
                &plan(size.width, size.height, request.tile_size),
            )
            .save(&request.output_dir)?;
            Ok(())
        }
    }

    fn request(dir: &Path, source: &str) -> TileRequest {
        TileRequest {
            source: source.into(),
            id: "http://host/images/tiles/abc".into(),
            output_dir: dir.join("abc"),
            tile_size: 256,
            quality: crate::tiling::Quality::default(),
        }
    }

    #[test]
    fn mock_records_requests_and_writes_descriptor() {
        let tmp = tempfile::TempDir::new().unwrap();
        let tiler = MockTiler::new().with_size("a.jpg", 300, 200);

        tiler.generate(&request(tmp.path(), "/src/a.jpg")).unwrap();

        assert_eq!(tiler.call_count(), 1);
        let info = ImageInfo::load(&tmp.path().join("abc")).unwrap();
        assert_eq!((info.width, info.height), (300, 200));
        assert_eq!(info.id, "http://host/images/tiles/abc");
    }

    #[test]
    fn mock_fails_on_configured_sources() {
        let tmp = tempfile::TempDir::new().unwrap();
        let tiler = MockTiler::failing_on(&["bad.jpg"]);

        let result = tiler.generate(&request(tmp.path(), "/src/bad.jpg"));
        assert!(matches!(result, Err(TilingError::Decode { .. })));
        assert!(!tmp.path().join("abc").exists());
    }

    #[test]
    fn references_delegate() {
        let tmp = tempfile::TempDir::new().unwrap();
        let tiler = MockTiler::new();

        fn generate_owned<T: TileGenerator>(t: T, req: &TileRequest) {
            t.generate(req).unwrap();
        }
        generate_owned(&tiler, &request(tmp.path(), "/src/a.jpg"));
        assert_eq!(tiler.call_count(), 1);
    }
}
