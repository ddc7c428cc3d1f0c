//! Prompts for block translation.
//!
//! Callers can override the system prompt via
//! [`crate::config::TranslationConfig::system_prompt`]; the per-block user
//! prompt is always built by [`translate_prompt`] so that table replies stay
//! parseable.

use crate::book::Payload;

/// Default system prompt sent before every block.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a professional translator working on a document that was extracted from a PDF, one block at a time.

Follow these rules precisely:

1. Translate the given content faithfully and completely. Do not summarise.
2. Keep numbers, units, proper names, and code unchanged unless they have an established translation.
3. Output ONLY the translation. No commentary, no quotes around the answer, no ```fences.
4. For tables: keep the same number of columns and rows, one row per line, cells separated by " | ". The first line is the header row."#;

/// Build the user prompt for one block.
///
/// The target language is inserted verbatim; it is a free-form label such
/// as "中文", "日文" or "French".
pub fn translate_prompt(original: &Payload, target_language: &str) -> String {
    match original {
        Payload::Text(text) => format!("Translate into {target_language}:\n{text}"),
        Payload::Table(table) => format!(
            "Translate into {target_language}, keep the spacing (spaces, separators) \
             and return it as a table:\n{}",
            table.to_prompt_text()
        ),
    }
}
