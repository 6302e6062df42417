//! Crash-safe file replacement.

use std::fs;
use std::io;
use std::path::Path;

/// Write `content` to `path` via a hidden temp sibling and a rename.
/// Returns `false` without touching the file when it already holds
/// `content`.
pub fn write_atomic(path: &Path, content: &[u8]) -> io::Result<bool> {
    if fs::read(path).is_ok_and(|existing| existing == content) {
        return Ok(false);
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{name}.tmp"));
    fs::write(&tmp, content)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(true)
}
