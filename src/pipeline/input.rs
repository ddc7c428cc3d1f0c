//! Input validation: make sure the source path is a readable PDF.
//!
//! We check the `%PDF` magic bytes before handing the path to pdfium so
//! callers get a meaningful error rather than an opaque pdfium failure.

use crate::error::TranslatorError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` exists, is readable and starts with `%PDF`.
pub fn resolve_local(path: &Path) -> Result<PathBuf, TranslatorError> {
    let path = path.to_path_buf();

    if !path.is_file() {
        return Err(TranslatorError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
                return Err(TranslatorError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(TranslatorError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(TranslatorError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}
