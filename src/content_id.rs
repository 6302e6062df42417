//! Content-addressed identifiers for source images.
//!
//! Every source image is identified by the SHA-256 of its bytes, never by
//! its filename. The tile cache is keyed by this id, so renaming or moving a
//! scan never forces re-tiling, and two differently named files with the
//! same bytes share one cache entry.
//!
//! Content-based rather than mtime-based so the id survives copies between
//! machines and archive re-exports that reset modification times.

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Read buffer size used while streaming a file through the hasher.
const CHUNK_SIZE: usize = 64 * 1024;

/// Hex-encoded SHA-256 digest of a source image's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(String);

impl ContentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the content id of a file.
///
/// The file is read in fixed-size chunks so multi-hundred-megabyte TIFF
/// scans are never held in memory at once.
pub fn identify(path: &Path) -> io::Result<ContentId> {
    let mut reader = BufReader::with_capacity(CHUNK_SIZE, File::open(path)?);
    let mut hasher = Sha256::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }
    Ok(ContentId(format!("{:x}", hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn identify_deterministic() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("scan.jpg");
        fs::write(&path, b"hello world").unwrap();

        let a = identify(&path).unwrap();
        let b = identify(&path).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn identify_known_digest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("scan.jpg");
        fs::write(&path, b"hello world").unwrap();

        assert_eq!(
            identify(&path).unwrap().as_str(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn identical_bytes_share_an_id_regardless_of_name() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("page-001.jpg");
        let b = tmp.path().join("renamed/copy.JPG");
        fs::create_dir_all(b.parent().unwrap()).unwrap();
        fs::write(&a, b"same scan").unwrap();
        fs::write(&b, b"same scan").unwrap();

        assert_eq!(identify(&a).unwrap(), identify(&b).unwrap());
    }

    #[test]
    fn identify_changes_with_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("scan.jpg");

        fs::write(&path, b"version 1").unwrap();
        let h1 = identify(&path).unwrap();
        fs::write(&path, b"version 2").unwrap();
        let h2 = identify(&path).unwrap();

        assert_ne!(h1, h2);
    }

    #[test]
    fn identify_spans_multiple_chunks() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("large.tif");
        let bytes: Vec<u8> = (0..CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &bytes).unwrap();

        let expected = format!("{:x}", Sha256::digest(&bytes));
        assert_eq!(identify(&path).unwrap().as_str(), expected);
    }

    #[test]
    fn identify_missing_file_errors() {
        let err = identify(Path::new("/nonexistent/scan.jpg")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
