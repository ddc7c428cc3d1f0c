//! PDF rendering of a translated book with `genpdf`.
//!
//! The layout is deliberately plain: US-Letter pages, one paragraph per
//! text line, a framed grid per table and a hard page break between source
//! pages. The font is loaded from disk before anything is laid out, so a
//! missing font fails the save without producing a partial file.
//!
//! genpdf only wraps after ASCII spaces and silently drops a word that is
//! wider than its line. Text is therefore cut into `line_pieces` first:
//! every CJK character is a word of its own, and long runs without spaces
//! are split at a width derived from the font size.

use crate::book::{Book, Payload};
use crate::error::TranslatorError;
use crate::table::Table;
use genpdf::elements::{Break, FrameCellDecorator, PageBreak, Paragraph, TableLayout};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::{style, Alignment, Document, Element as _, PaperSize, SimplePageDecorator};
use std::path::{Path, PathBuf};
use tracing::debug;

const PAGE_MARGIN_MM: i32 = 20;
const HEADER_SIZE_BUMP: u8 = 2;

/// Width of a Letter page (216 mm in genpdf) inside the margins.
const TEXT_WIDTH_MM: f64 = 216.0 - 2.0 * PAGE_MARGIN_MM as f64;
/// Cell padding on both sides plus the frame lines.
const CELL_INSET_MM: f64 = 3.0;
const MM_PER_PT: f64 = 25.4 / 72.0;

/// Font settings for PDF output.
#[derive(Debug, Clone)]
pub struct PdfFont {
    pub path: PathBuf,
    pub size: u8,
}

/// Read the font file and build a family that uses it for every style.
///
/// CJK fonts rarely ship bold or italic cuts, so one face serves all four.
pub fn load_font_family(path: &Path) -> Result<FontFamily<FontData>, TranslatorError> {
    let bytes = std::fs::read(path).map_err(|e| TranslatorError::FontLoad {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let data = FontData::new(bytes, None).map_err(|e| TranslatorError::FontLoad {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    debug!("Loaded font {}", path.display());

    Ok(FontFamily {
        regular: data.clone(),
        bold: data.clone(),
        italic: data.clone(),
        bold_italic: data,
    })
}

/// Load the font and lay out every translated block of `book`.
///
/// Only blocks with a successful translation are laid out.
pub fn build_document(book: &Book, font: &PdfFont) -> Result<Document, TranslatorError> {
    let family = load_font_family(&font.path)?;

    let mut doc = Document::new(family);
    doc.set_title(document_title(book));
    doc.set_paper_size(PaperSize::Letter);
    doc.set_font_size(font.size);
    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(PAGE_MARGIN_MM);
    doc.set_page_decorator(decorator);

    let last = book.pages.len().saturating_sub(1);
    for (i, page) in book.pages.iter().enumerate() {
        for block in page.contents.iter().filter(|b| b.status()) {
            match block.translation() {
                Some(Payload::Text(text)) => push_text(&mut doc, text, font.size),
                Some(Payload::Table(table)) => {
                    let layout = build_table(table, font.size).map_err(|detail| {
                        TranslatorError::PdfRenderFailed {
                            path: book.source_path.clone(),
                            detail,
                        }
                    })?;
                    doc.push(layout);
                    doc.push(Break::new(1));
                }
                None => {}
            }
        }
        if i < last {
            doc.push(PageBreak::new());
        }
    }

    Ok(doc)
}

fn document_title(book: &Book) -> String {
    book.metadata.title.clone().unwrap_or_else(|| {
        book.source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}

fn push_text(doc: &mut Document, text: &str, font_size: u8) {
    let limit = run_limit(TEXT_WIDTH_MM, font_size);
    for line in text.lines() {
        if line.trim().is_empty() {
            doc.push(Break::new(1));
        } else {
            doc.push(wrapped(line, limit));
        }
    }
    doc.push(Break::new(0.5));
}

fn build_table(table: &Table, font_size: u8) -> Result<TableLayout, String> {
    let mut layout = TableLayout::new(vec![1; table.column_count()]);
    layout.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    let cell_width = TEXT_WIDTH_MM / table.column_count() as f64 - CELL_INSET_MM;
    let header_size = font_size.saturating_add(HEADER_SIZE_BUMP);
    let header_style = style::Style::new().bold().with_font_size(header_size);

    let mut header = layout.row();
    for cell in table.columns() {
        header.push_element(
            wrapped(cell, run_limit(cell_width, header_size))
                .aligned(Alignment::Center)
                .styled(header_style)
                .padded(1),
        );
    }
    header.push().map_err(|e| e.to_string())?;

    let limit = run_limit(cell_width, font_size);
    for row in table.rows() {
        let mut cells = layout.row();
        for cell in row {
            cells.push_element(wrapped(cell, limit).aligned(Alignment::Center).padded(1));
        }
        cells.push().map_err(|e| e.to_string())?;
    }

    Ok(layout)
}

fn wrapped(line: &str, limit: usize) -> Paragraph {
    line_pieces(line, limit).into_iter().collect()
}

/// Characters that fit in `width_mm` even if every glyph is a full em wide.
fn run_limit(width_mm: f64, font_size: u8) -> usize {
    let em_mm = f64::from(font_size) * MM_PER_PT;
    ((width_mm / em_mm) as usize).max(1)
}

/// Split `line` into the words genpdf is allowed to wrap between.
///
/// A word ends after a space, after a wide character, or once it holds
/// `limit` characters.
fn line_pieces(line: &str, limit: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut run = String::new();
    let mut run_chars = 0;

    for c in line.chars() {
        if is_wide(c) || run_chars == limit {
            if !run.is_empty() {
                pieces.push(std::mem::take(&mut run));
            }
            run_chars = 0;
        }
        run.push(c);
        run_chars += 1;
        if c == ' ' || is_wide(c) {
            pieces.push(std::mem::take(&mut run));
            run_chars = 0;
        }
    }
    if !run.is_empty() {
        pieces.push(run);
    }
    pieces
}

/// East Asian wide characters, which may break a line on either side.
fn is_wide(c: char) -> bool {
    matches!(
        c,
        '\u{1100}'..='\u{115F}'
            | '\u{2E80}'..='\u{A4CF}'
            | '\u{AC00}'..='\u{D7A3}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{FE30}'..='\u{FE4F}'
            | '\u{FF00}'..='\u{FF60}'
            | '\u{FFE0}'..='\u{FFE6}'
            | '\u{20000}'..='\u{3FFFD}'
    )
}
