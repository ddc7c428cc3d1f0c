//! Progress-callback trait for per-block translation events.
//!
//! Inject an [`Arc<dyn TranslationProgressCallback>`] via
//! [`crate::config::TranslationConfigBuilder::progress_callback`] to receive
//! events as the translator walks the book. The library never owns a
//! process-wide logger or progress sink; everything it reports goes through
//! this trait or through `tracing` spans the host application subscribes to.
//!
//! # Example
//!
//! ```rust
//! use pdf_translator::{TranslationProgressCallback, TranslationConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct FailureCounter {
//!     failed: AtomicUsize,
//! }
//!
//! impl TranslationProgressCallback for FailureCounter {
//!     fn on_block_error(&self, page_num: usize, block_num: usize, error: &str) {
//!         self.failed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num} block {block_num}: {error}");
//!     }
//! }
//!
//! let counter = Arc::new(FailureCounter { failed: AtomicUsize::new(0) });
//!
//! let config = TranslationConfig::builder()
//!     .progress_callback(counter as Arc<dyn TranslationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the translator as it processes each block.
///
/// Blocks are translated strictly one after another, so calls never overlap
/// for a single translation run. The trait is still `Send + Sync` because
/// the callback lives in a [`crate::TranslationConfig`] that may be shared
/// between runs on different threads. All methods have no-op defaults.
pub trait TranslationProgressCallback: Send + Sync {
    /// Called once after parsing, before the first model request.
    ///
    /// # Arguments
    /// * `total_blocks`: number of blocks that will be translated
    fn on_translation_start(&self, total_blocks: usize) {
        let _ = total_blocks;
    }

    /// Called just before the model request for a block is sent.
    ///
    /// `page_num` and `block_num` are 1-indexed; `block_num` counts within
    /// the page.
    fn on_block_start(&self, page_num: usize, block_num: usize) {
        let _ = (page_num, block_num);
    }

    /// Called when a block was translated and stored.
    ///
    /// # Arguments
    /// * `translated_len`: byte length of the translated text (or of the
    ///   flattened table)
    fn on_block_complete(&self, page_num: usize, block_num: usize, translated_len: usize) {
        let _ = (page_num, block_num, translated_len);
    }

    /// Called when a block was left untranslated.
    fn on_block_error(&self, page_num: usize, block_num: usize, error: &str) {
        let _ = (page_num, block_num, error);
    }

    /// Called once after every block has been attempted.
    fn on_translation_complete(&self, total_blocks: usize, translated: usize) {
        let _ = (total_blocks, translated);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl TranslationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::TranslationConfig`].
pub type ProgressCallback = Arc<dyn TranslationProgressCallback>;
