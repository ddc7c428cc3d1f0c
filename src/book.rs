//! The translation unit: a [`Book`] of [`Page`]s of [`ContentBlock`]s.
//!
//! Ownership is strictly tree-shaped. A `Book` owns its pages, a page owns
//! its blocks, and nothing points back up. The parser creates every block
//! untranslated; the translator writes each block exactly once; the writers
//! only read.

use crate::config::OutputFormat;
use crate::error::ContentMismatch;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// How a block's payload is interpreted and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    Table,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Text => f.write_str("text"),
            ContentType::Table => f.write_str("table"),
        }
    }
}

/// Original or translated content of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Payload {
    Text(String),
    Table(Table),
}

impl Payload {
    pub fn content_type(&self) -> ContentType {
        match self {
            Payload::Text(_) => ContentType::Text,
            Payload::Table(_) => ContentType::Table,
        }
    }
}

/// A single translatable unit: a paragraph or a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    content_type: ContentType,
    original: Payload,
    translation: Option<Payload>,
    status: bool,
}

impl ContentBlock {
    /// An untranslated block holding `original`.
    pub fn new(original: Payload) -> Self {
        Self {
            content_type: original.content_type(),
            original,
            translation: None,
            status: false,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(Payload::Text(text.into()))
    }

    pub fn table(table: Table) -> Self {
        Self::new(Payload::Table(table))
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn original(&self) -> &Payload {
        &self.original
    }

    /// The translation, present only when [`status`](Self::status) is `true`.
    pub fn translation(&self) -> Option<&Payload> {
        self.translation.as_ref()
    }

    /// Whether translation succeeded. Writers skip blocks where this is `false`.
    pub fn status(&self) -> bool {
        self.status
    }

    /// Record a successful translation.
    ///
    /// The payload must be the same kind as the original, and a table must
    /// keep its column count. On error the block is left untouched.
    pub fn set_translation(&mut self, translation: Payload) -> Result<(), ContentMismatch> {
        match (&self.original, &translation) {
            (Payload::Text(_), Payload::Text(_)) => {}
            (Payload::Table(orig), Payload::Table(new)) => {
                if orig.column_count() != new.column_count() {
                    return Err(ContentMismatch::Columns {
                        expected: orig.column_count(),
                        found: new.column_count(),
                    });
                }
            }
            _ => {
                return Err(ContentMismatch::Kind {
                    expected: self.content_type,
                    found: translation.content_type(),
                })
            }
        }
        self.translation = Some(translation);
        self.status = true;
        Ok(())
    }

    /// Record a failed translation attempt.
    pub fn mark_failed(&mut self) {
        self.translation = None;
        self.status = false;
    }
}

/// Blocks from one source page, in reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub contents: Vec<ContentBlock>,
}

impl Page {
    pub fn new(contents: Vec<ContentBlock>) -> Self {
        Self { contents }
    }
}

/// Metadata extracted from the source PDF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    /// Page count of the source document, before any page limit.
    pub page_count: usize,
    pub pdf_version: String,
}

/// An ordered document plus its translation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub source_path: PathBuf,
    pub metadata: DocumentMetadata,
    pub pages: Vec<Page>,
}

impl Book {
    pub fn new(source_path: impl Into<PathBuf>, pages: Vec<Page>) -> Self {
        let metadata = DocumentMetadata {
            page_count: pages.len(),
            ..DocumentMetadata::default()
        };
        Self {
            source_path: source_path.into(),
            metadata,
            pages,
        }
    }

    /// Every block in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &ContentBlock> {
        self.pages.iter().flat_map(|p| p.contents.iter())
    }

    pub fn block_count(&self) -> usize {
        self.pages.iter().map(|p| p.contents.len()).sum()
    }

    pub fn translated_count(&self) -> usize {
        self.blocks().filter(|b| b.status()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.block_count() - self.translated_count()
    }

    /// Where a translation in `format` is written when the caller gives no
    /// explicit path: `report.pdf` → `report_translated.md`.
    pub fn default_output_path(&self, format: OutputFormat) -> PathBuf {
        derive_output_path(&self.source_path, format)
    }
}

fn derive_output_path(source: &Path, format: OutputFormat) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "book".to_string());

    let has_pdf_ext = source
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    let base = if has_pdf_ext {
        source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(file_name)
    } else {
        file_name
    };

    source.with_file_name(format!("{base}_translated.{}", format.extension()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_col_table() -> Table {
        Table::new(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into(), "2".into()]],
        )
        .unwrap()
    }

    #[test]
    fn new_block_is_untranslated() {
        let block = ContentBlock::text("Hello");
        assert_eq!(block.content_type(), ContentType::Text);
        assert!(!block.status());
        assert!(block.translation().is_none());
    }

    #[test]
    fn set_translation_marks_success() {
        let mut block = ContentBlock::text("Hello");
        block.set_translation(Payload::Text("你好".into())).unwrap();
        assert!(block.status());
        assert_eq!(block.translation(), Some(&Payload::Text("你好".into())));
        assert_eq!(block.original(), &Payload::Text("Hello".into()));
    }

    #[test]
    fn text_cannot_fill_table_block() {
        let mut block = ContentBlock::table(two_col_table());
        let err = block
            .set_translation(Payload::Text("free text".into()))
            .unwrap_err();
        assert_eq!(
            err,
            ContentMismatch::Kind {
                expected: ContentType::Table,
                found: ContentType::Text
            }
        );
        assert!(!block.status());
    }

    #[test]
    fn table_translation_keeps_column_count() {
        let mut block = ContentBlock::table(two_col_table());
        let narrow = Table::new(vec!["x".into()], vec![]).unwrap();
        assert_eq!(
            block.set_translation(Payload::Table(narrow)),
            Err(ContentMismatch::Columns {
                expected: 2,
                found: 1
            })
        );
        assert!(block.set_translation(Payload::Table(two_col_table())).is_ok());
        assert!(block.status());
    }

    #[test]
    fn mark_failed_clears_state() {
        let mut block = ContentBlock::text("Hello");
        block.set_translation(Payload::Text("Bonjour".into())).unwrap();
        block.mark_failed();
        assert!(!block.status());
        assert!(block.translation().is_none());
    }

    #[test]
    fn counts_follow_block_status() {
        let mut first = ContentBlock::text("a");
        first.set_translation(Payload::Text("A".into())).unwrap();
        let book = Book::new(
            "doc.pdf",
            vec![
                Page::new(vec![first, ContentBlock::text("b")]),
                Page::new(vec![ContentBlock::text("c")]),
            ],
        );
        assert_eq!(book.block_count(), 3);
        assert_eq!(book.translated_count(), 1);
        assert_eq!(book.failed_count(), 2);
        assert_eq!(book.metadata.page_count, 2);
    }

    #[test]
    fn default_output_paths() {
        let book = Book::new("/data/report.pdf", vec![]);
        assert_eq!(
            book.default_output_path(OutputFormat::Markdown),
            PathBuf::from("/data/report_translated.md")
        );
        assert_eq!(
            book.default_output_path(OutputFormat::Pdf),
            PathBuf::from("/data/report_translated.pdf")
        );

        let upper = Book::new("scan.PDF", vec![]);
        assert_eq!(
            upper.default_output_path(OutputFormat::Pdf),
            PathBuf::from("scan_translated.pdf")
        );

        let no_ext = Book::new("notes", vec![]);
        assert_eq!(
            no_ext.default_output_path(OutputFormat::Markdown),
            PathBuf::from("notes_translated.md")
        );
    }
}
