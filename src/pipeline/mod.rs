//! Pipeline stages for PDF translation.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ parse ──▶ llm ──▶ postprocess
//! (path)   (pdfium)  (model)  (cleanup)
//! ```
//!
//! 1. [`input`]: validate that the user-supplied path is a readable PDF
//! 2. [`parse`]: extract page text and segment it into paragraph and
//!    table blocks; runs in `spawn_blocking` because pdfium is not async-safe
//! 3. [`llm`]: translate one block through the model with the optional
//!    retry policy; the only stage with network I/O
//! 4. [`postprocess`]: deterministic text cleanup of model replies
//!
//! Rendering the translated book is the job of [`crate::writer`].

pub mod input;
pub mod llm;
pub mod parse;
pub mod postprocess;
