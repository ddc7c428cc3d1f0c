//! Error types for the pdf-translator library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`TranslatorError`]: **Fatal**: the translation cannot proceed or its
//!   result cannot be written (unreadable input, unsupported output format,
//!   missing font). Returned as `Err(TranslatorError)` from the
//!   `translate_*` entry points.
//!
//! * [`ModelRequestFailure`]: **Non-fatal**: a single block could not be
//!   translated. It is absorbed into the [`crate::book::ContentBlock`] as
//!   `status = false` and reported to the progress callback; the loop moves
//!   on to the next block.

use crate::book::ContentType;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-translator library.
#[derive(Debug, Error)]
pub enum TranslatorError {
    // ── Parse errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Text extraction failed for a specific page.
    #[error("Text extraction failed for page {page}: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library next to the\n\
executable, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// The requested output format is neither PDF nor Markdown.
    #[error("Unsupported file format: '{format}' (expected \"PDF\" or \"Markdown\")")]
    UnsupportedFormat { format: String },

    /// The font used for PDF output is missing or cannot be decoded.
    #[error("Failed to load font '{path}': {detail}\nPass another font with --font <PATH>.")]
    FontLoad { path: PathBuf, detail: String },

    /// genpdf could not lay out or write the document.
    #[error("Failed to render PDF '{path}': {detail}")]
    PdfRenderFailed { path: PathBuf, detail: String },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TranslatorError {
    /// `true` for every error raised while opening or decoding the source
    /// document.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            TranslatorError::FileNotFound { .. }
                | TranslatorError::PermissionDenied { .. }
                | TranslatorError::NotAPdf { .. }
                | TranslatorError::CorruptPdf { .. }
                | TranslatorError::PasswordRequired { .. }
                | TranslatorError::WrongPassword { .. }
                | TranslatorError::ExtractionFailed { .. }
                | TranslatorError::PdfiumBindingFailed(_)
        )
    }
}

/// A non-fatal error for a single block.
#[derive(Debug, Clone, Error, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ModelRequestFailure {
    /// The provider call failed (after any configured retries).
    #[error("model request failed after {retries} retries: {detail}")]
    RequestFailed { retries: u32, detail: String },

    /// The model answered with nothing usable.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// A table reply could not be read back as a table of the right width.
    #[error("model reply is not a {expected}-column table: {detail}")]
    MalformedTable { expected: usize, detail: String },
}

/// A translation that does not fit the block it was assigned to.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ContentMismatch {
    #[error("cannot store a {found} translation in a {expected} block")]
    Kind {
        expected: ContentType,
        found: ContentType,
    },

    #[error("translated table has {found} columns, original has {expected}")]
    Columns { expected: usize, found: usize },
}
