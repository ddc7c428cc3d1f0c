//! PDF parsing: turn a source file into an untranslated [`Book`].
//!
//! [`DocumentParser`] is the seam between the translator and PDF extraction.
//! The default [`PdfiumParser`] pulls each page's text through pdfium and
//! segments it into paragraph and table blocks; tests substitute an
//! in-memory parser.
//!
//! pdfium uses thread-local state internally and must not run on async
//! worker threads. The translator therefore calls [`DocumentParser::parse`]
//! inside `tokio::task::spawn_blocking`, which is also why the trait is
//! synchronous.

use crate::book::{Book, ContentBlock, DocumentMetadata, Page};
use crate::error::TranslatorError;
use crate::pipeline::input;
use crate::table::Table;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Converts a source document into a [`Book`] whose blocks are all
/// untranslated.
pub trait DocumentParser: Send + Sync {
    /// Parse `path`, keeping only the first `page_limit` pages when set.
    ///
    /// A limit larger than the document is clamped to its length.
    fn parse(&self, path: &Path, page_limit: Option<usize>) -> Result<Book, TranslatorError>;
}

/// pdfium-backed parser.
#[derive(Debug, Clone, Default)]
pub struct PdfiumParser {
    password: Option<String>,
    library_path: Option<PathBuf>,
}

impl PdfiumParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Password for encrypted documents.
    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    /// Bind to the pdfium shared library at `path` instead of searching.
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }
}

impl DocumentParser for PdfiumParser {
    fn parse(&self, path: &Path, page_limit: Option<usize>) -> Result<Book, TranslatorError> {
        let pdf_path = input::resolve_local(path)?;
        let pdfium = bind_pdfium(self.library_path.as_deref())?;
        let password = self.password.as_deref();

        let document = pdfium
            .load_pdf_from_file(&pdf_path, password)
            .map_err(|e| map_load_error(&pdf_path, password.is_some(), e))?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        let selected = clamp_page_limit(page_limit, total_pages);
        info!("PDF loaded: {} pages, parsing {}", total_pages, selected);

        let mut book_pages = Vec::with_capacity(selected);
        for idx in 0..selected {
            let page = pages
                .get(idx as u16)
                .map_err(|e| TranslatorError::ExtractionFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                })?;
            let text = page
                .text()
                .map_err(|e| TranslatorError::ExtractionFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                })?
                .all();

            let blocks = segment_page_text(&text);
            debug!("Page {}: {} blocks", idx + 1, blocks.len());
            book_pages.push(Page::new(blocks));
        }

        let metadata = read_metadata(&document, total_pages);
        Ok(Book {
            source_path: pdf_path,
            metadata,
            pages: book_pages,
        })
    }
}

/// Number of pages to parse for a document of `total` pages.
pub fn clamp_page_limit(page_limit: Option<usize>, total: usize) -> usize {
    match page_limit {
        Some(n) if n > total => {
            warn!(
                "Page limit {} exceeds document length ({} pages); translating all pages",
                n, total
            );
            total
        }
        Some(n) => n,
        None => total,
    }
}

/// Bind to pdfium: explicit path, then `PDFIUM_LIB_PATH`, then the current
/// directory, then the system library.
fn bind_pdfium(library_path: Option<&Path>) -> Result<Pdfium, TranslatorError> {
    let explicit = library_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

    if let Some(path) = explicit {
        return Pdfium::bind_to_library(&path)
            .map(Pdfium::new)
            .map_err(|e| {
                TranslatorError::PdfiumBindingFailed(format!("{}: {:?}", path.display(), e))
            });
    }

    let local = Pdfium::pdfium_platform_library_name_at_path("./");
    Pdfium::bind_to_library(&local)
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| TranslatorError::PdfiumBindingFailed(format!("{:?}", e)))
}

fn map_load_error(path: &Path, has_password: bool, e: PdfiumError) -> TranslatorError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if has_password {
            TranslatorError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            TranslatorError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        TranslatorError::CorruptPdf {
            path: path.to_path_buf(),
            detail: err_str,
        }
    }
}

fn read_metadata(document: &PdfDocument<'_>, page_count: usize) -> DocumentMetadata {
    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        page_count,
        pdf_version: format!("{:?}", document.version()),
    }
}

// ── Block segmentation ───────────────────────────────────────────────────

static RE_COLUMN_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t+|\s{2,}").unwrap());

/// Split a page's extracted text into blocks.
///
/// Blank lines separate paragraphs. Inside a paragraph, two or more
/// consecutive lines that split into the same number (≥ 2) of cells on tabs
/// or wide gaps become a table whose first line is the header.
pub fn segment_page_text(text: &str) -> Vec<ContentBlock> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut blocks = Vec::new();

    for chunk in text.split("\n\n") {
        let lines: Vec<&str> = chunk
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .collect();
        segment_chunk(&lines, &mut blocks);
    }

    blocks
}

fn segment_chunk(lines: &[&str], blocks: &mut Vec<ContentBlock>) {
    let mut prose: Vec<&str> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if let Some(width) = row_width(lines[i]) {
            let end = lines[i..]
                .iter()
                .position(|l| row_width(l) != Some(width))
                .map_or(lines.len(), |p| i + p);

            if end - i >= 2 {
                if let Some(table) = build_table(&lines[i..end]) {
                    flush_prose(&mut prose, blocks);
                    blocks.push(ContentBlock::table(table));
                    i = end;
                    continue;
                }
            }
        }
        prose.push(lines[i]);
        i += 1;
    }

    flush_prose(&mut prose, blocks);
}

fn split_row(line: &str) -> Vec<String> {
    RE_COLUMN_GAP
        .split(line.trim())
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn row_width(line: &str) -> Option<usize> {
    let n = split_row(line).len();
    (n >= 2).then_some(n)
}

fn build_table(lines: &[&str]) -> Option<Table> {
    let (header, body) = lines.split_first()?;
    Table::new(split_row(header), body.iter().map(|l| split_row(l)).collect()).ok()
}

/// Join prose lines into one paragraph, undoing end-of-line hyphenation.
fn flush_prose(prose: &mut Vec<&str>, blocks: &mut Vec<ContentBlock>) {
    if prose.is_empty() {
        return;
    }

    let mut paragraph = String::new();
    for line in prose.drain(..) {
        let line = line.trim();
        if paragraph.ends_with('-')
            && line.chars().next().is_some_and(|c| c.is_lowercase())
        {
            paragraph.pop();
        } else if !paragraph.is_empty() {
            paragraph.push(' ');
        }
        paragraph.push_str(line);
    }

    blocks.push(ContentBlock::text(paragraph));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::{ContentType, Payload};

    #[test]
    fn blank_lines_separate_paragraphs() {
        let blocks = segment_page_text("First line\nstill first.\r\n\r\nSecond paragraph.");
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0].original(),
            &Payload::Text("First line still first.".into())
        );
        assert_eq!(blocks[1].original(), &Payload::Text("Second paragraph.".into()));
    }

    #[test]
    fn hyphenated_words_are_joined() {
        let blocks = segment_page_text("transla-\ntion works");
        assert_eq!(blocks[0].original(), &Payload::Text("translation works".into()));
    }

    #[test]
    fn aligned_lines_become_a_table() {
        let text = "Quarterly results\nRegion    Sales    Growth\nNorth    120    5%\nSouth    98    -2%\nNotes follow.";
        let blocks = segment_page_text(text);
        let kinds: Vec<ContentType> = blocks.iter().map(|b| b.content_type()).collect();
        assert_eq!(
            kinds,
            vec![ContentType::Text, ContentType::Table, ContentType::Text]
        );

        let Payload::Table(table) = blocks[1].original() else {
            panic!("expected table");
        };
        assert_eq!(table.columns(), ["Region", "Sales", "Growth"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn single_aligned_line_stays_prose() {
        let blocks = segment_page_text("Name    Value");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content_type(), ContentType::Text);
    }

    #[test]
    fn empty_page_has_no_blocks() {
        assert!(segment_page_text(" \n\n  \n").is_empty());
    }

    #[test]
    fn page_limit_is_clamped() {
        assert_eq!(clamp_page_limit(None, 7), 7);
        assert_eq!(clamp_page_limit(Some(3), 7), 3);
        assert_eq!(clamp_page_limit(Some(20), 7), 7);
    }

    #[test]
    fn missing_file_fails_before_pdfium() {
        let err = PdfiumParser::new()
            .parse(Path::new("/no/such/book.pdf"), None)
            .unwrap_err();
        assert!(err.is_parse_error());
    }
}
