//! Rectangular tables: the payload of [`crate::book::ContentType::Table`] blocks.
//!
//! A table travels through the model as plain text. [`Table::to_prompt_text`]
//! flattens it with ` | ` separators and [`Table::parse_reply`] reads the
//! model's answer back, tolerating the shapes models commonly produce: GFM
//! pipe tables, bare pipe-delimited lines, tab-separated columns, or columns
//! aligned with runs of spaces.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shape violations detected while building or parsing a table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TableShapeError {
    #[error("table has no header row")]
    Empty,

    #[error("header has {found} columns, expected {expected}")]
    ColumnCount { expected: usize, found: usize },

    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// A table with named columns and string cells.
///
/// Every row holds exactly `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, rejecting ragged rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, TableShapeError> {
        if columns.is_empty() {
            return Err(TableShapeError::Empty);
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableShapeError::Ragged {
                    row: i + 1,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Flatten the table into the text sent to the model: the header line
    /// followed by one line per row, cells separated by ` | `.
    pub fn to_prompt_text(&self) -> String {
        std::iter::once(&self.columns)
            .chain(self.rows.iter())
            .map(|cells| cells.join(" | "))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Parse a model reply into a table with `expected_columns` columns.
    ///
    /// The first non-empty line is the header. GFM separator rows
    /// (`| --- | :-: |`) are skipped.
    pub fn parse_reply(text: &str, expected_columns: usize) -> Result<Self, TableShapeError> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !RE_SEPARATOR_ROW.is_match(l))
            .collect();

        let Some((header, body)) = lines.split_first() else {
            return Err(TableShapeError::Empty);
        };

        let columns = split_cells(header, expected_columns);
        if columns.len() != expected_columns {
            return Err(TableShapeError::ColumnCount {
                expected: expected_columns,
                found: columns.len(),
            });
        }

        let rows = body
            .iter()
            .map(|line| split_cells(line, expected_columns))
            .collect();

        Self::new(columns, rows)
    }
}

static RE_SEPARATOR_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\|?\s*:?-{3,}:?\s*(\|\s*:?-{3,}:?\s*)*\|?$").unwrap());

static RE_WIDE_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t+|\s{2,}").unwrap());

/// Split one line into cells, preferring the delimiter that yields
/// `expected` cells.
fn split_cells(line: &str, expected: usize) -> Vec<String> {
    if line.contains('|') {
        let inner = line.strip_prefix('|').unwrap_or(line);
        let inner = inner.strip_suffix('|').unwrap_or(inner);
        return inner.split('|').map(|c| c.trim().to_string()).collect();
    }

    let wide: Vec<String> = RE_WIDE_GAP
        .split(line)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if wide.len() == expected {
        return wide;
    }

    let narrow: Vec<String> = line.split_whitespace().map(str::to_string).collect();
    if narrow.len() == expected {
        narrow
    } else {
        wide
    }
}
