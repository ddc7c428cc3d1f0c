//! # pdf-translator
//!
//! Translate PDF documents into another language with an LLM and save the
//! result as Markdown or as a re-typeset PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      check the path is a readable PDF
//!  ├─ 2. Parse      extract page text via pdfium (spawn_blocking) and split
//!  │                it into paragraph and table blocks
//!  ├─ 3. Translate  one model call per block, in document order
//!  ├─ 4. Polish     strip fences and stray whitespace from each reply
//!  └─ 5. Write      Markdown text or a genpdf-rendered PDF
//! ```
//!
//! A block the model cannot translate is skipped in the output; it never
//! aborts the run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_translator::{PdfTranslator, TranslationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let translator = PdfTranslator::from_config(TranslationConfig::default()).await?;
//!     let markdown = translator.translate_to_text("paper.pdf", "中文", None).await?;
//!     println!("{}", markdown);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-translator` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf-translator = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod book;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod table;
pub mod translate;
pub mod writer;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use book::{Book, ContentBlock, ContentType, DocumentMetadata, Page, Payload};
pub use config::{OutputFormat, TranslationConfig, TranslationConfigBuilder};
pub use error::{ContentMismatch, ModelRequestFailure, TranslatorError};
pub use pipeline::llm::{LlmModelClient, ModelClient, RetryPolicy};
pub use pipeline::parse::{DocumentParser, PdfiumParser};
pub use progress::{NoopProgressCallback, ProgressCallback, TranslationProgressCallback};
pub use table::{Table, TableShapeError};
pub use translate::{PdfTranslator, TranslationStats};
pub use writer::{render_markdown, Writer};
