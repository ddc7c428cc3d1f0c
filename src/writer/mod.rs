//! Persisting a translated [`Book`].
//!
//! Both renderers share one traversal rule: only blocks whose translation
//! succeeded are emitted, and a page separator goes between pages but never
//! after the last one.

pub mod markdown;
pub mod pdf;

pub use markdown::render_markdown;
pub use pdf::PdfFont;

use crate::book::Book;
use crate::config::{OutputFormat, TranslationConfig};
use crate::error::TranslatorError;
use std::path::{Path, PathBuf};
use tracing::info;

/// Saves books in either output format.
#[derive(Debug, Clone)]
pub struct Writer {
    font: PdfFont,
}

impl Writer {
    pub fn new(font_path: impl Into<PathBuf>, font_size: u8) -> Self {
        Self {
            font: PdfFont {
                path: font_path.into(),
                size: font_size,
            },
        }
    }

    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(config.font_path.clone(), config.font_size)
    }

    /// Write `book` in `format` to `output_path`, or next to the source
    /// file when no path is given. Returns the path written.
    pub fn save(
        &self,
        book: &Book,
        format: OutputFormat,
        output_path: Option<&Path>,
    ) -> Result<PathBuf, TranslatorError> {
        let path = output_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| book.default_output_path(format));

        match format {
            OutputFormat::Markdown => write_atomic(&path, render_markdown(book).as_bytes())?,
            OutputFormat::Pdf => self.save_pdf(book, &path)?,
        }

        info!("Saved {} output to {}", format, path.display());
        Ok(path)
    }

    fn save_pdf(&self, book: &Book, path: &Path) -> Result<(), TranslatorError> {
        // Font errors must surface before any directory or file is created.
        let doc = pdf::build_document(book, &self.font)?;
        create_parent(path)?;

        let tmp_path = path.with_extension("pdf.tmp");
        if let Err(e) = doc.render_to_file(&tmp_path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(TranslatorError::PdfRenderFailed {
                path: path.to_path_buf(),
                detail: e.to_string(),
            });
        }
        std::fs::rename(&tmp_path, path).map_err(|e| write_failed(path, e))
    }
}

/// Write `contents` to a sibling temp file, then rename it over `path`.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), TranslatorError> {
    create_parent(path)?;

    let tmp_path = path.with_extension("md.tmp");
    std::fs::write(&tmp_path, contents).map_err(|e| write_failed(path, e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| write_failed(path, e))
}

fn create_parent(path: &Path) -> Result<(), TranslatorError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| write_failed(path, e))
        }
        _ => Ok(()),
    }
}

fn write_failed(path: &Path, source: std::io::Error) -> TranslatorError {
    TranslatorError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    }
}
