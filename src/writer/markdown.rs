//! Markdown rendering of a translated book.

use crate::book::{Book, Payload};
use crate::table::Table;

/// Separator emitted between pages (never after the last one).
pub const PAGE_SEPARATOR: &str = "---\n\n";

/// Render every successfully translated block of `book` as Markdown.
///
/// Text blocks become their translation followed by a blank line; tables
/// become GFM pipe tables. Blocks with `status == false` are skipped, but
/// their page still counts for separator placement.
pub fn render_markdown(book: &Book) -> String {
    let mut out = String::new();
    let last = book.pages.len().saturating_sub(1);

    for (i, page) in book.pages.iter().enumerate() {
        for block in page.contents.iter().filter(|b| b.status()) {
            match block.translation() {
                Some(Payload::Text(text)) => {
                    out.push_str(text);
                    out.push_str("\n\n");
                }
                Some(Payload::Table(table)) => push_table(&mut out, table),
                None => {}
            }
        }

        if i < last {
            out.push_str(PAGE_SEPARATOR);
        }
    }

    out
}

fn push_table(out: &mut String, table: &Table) {
    out.push_str(&pipe_row(table.columns()));
    out.push('\n');
    out.push_str(&pipe_row(&vec!["---".to_string(); table.column_count()]));
    out.push('\n');

    let body: Vec<String> = table.rows().iter().map(|r| pipe_row(r)).collect();
    out.push_str(&body.join("\n"));
    out.push_str("\n\n");
}

fn pipe_row(cells: &[String]) -> String {
    let cells: Vec<String> = cells.iter().map(|c| c.replace('|', "\\|")).collect();
    format!("| {} |", cells.join(" | "))
}
