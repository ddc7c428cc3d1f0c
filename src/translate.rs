//! The translation orchestrator.
//!
//! [`PdfTranslator`] ties the stages together: parse the source into a
//! [`Book`], walk every block in document order through the
//! [`ModelClient`], then render or save the result with the [`Writer`].
//!
//! Blocks are translated one at a time. A block that fails is marked with
//! `status = false` and the loop carries on, so a run only returns `Err`
//! for fatal problems (unreadable input, unknown output format, missing
//! font, unwritable output).

use crate::book::{Book, Payload};
use crate::config::{OutputFormat, TranslationConfig};
use crate::error::TranslatorError;
use crate::pipeline::llm::{LlmModelClient, ModelClient};
use crate::pipeline::parse::{DocumentParser, PdfiumParser};
use crate::writer::{render_markdown, Writer};
use edgequake_llm::{LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Model used when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Outcome of a translation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationStats {
    /// Pages that went through the translator (after any page limit).
    pub page_count: usize,
    pub total_blocks: usize,
    pub translated_blocks: usize,
    pub failed_blocks: usize,
    /// Wall-clock time of the whole run.
    pub duration_ms: u64,
    /// Where the result was written; `None` when nothing was saved.
    pub output_path: Option<PathBuf>,
}

/// Translates PDF documents block by block.
///
/// # Example
/// ```rust,no_run
/// use pdf_translator::{PdfTranslator, TranslationConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let translator = PdfTranslator::from_config(TranslationConfig::default()).await?;
/// let stats = translator
///     .translate_and_save("paper.pdf", "Markdown", "中文", None, Some(2))
///     .await?;
/// println!("{}/{} blocks translated", stats.translated_blocks, stats.total_blocks);
/// # Ok(())
/// # }
/// ```
pub struct PdfTranslator {
    parser: Arc<dyn DocumentParser>,
    client: Arc<dyn ModelClient>,
    writer: Writer,
    config: TranslationConfig,
}

impl PdfTranslator {
    /// Assemble a translator from explicit parts.
    pub fn new(
        parser: Arc<dyn DocumentParser>,
        client: Arc<dyn ModelClient>,
        config: TranslationConfig,
    ) -> Self {
        Self {
            parser,
            client,
            writer: Writer::from_config(&config),
            config,
        }
    }

    /// Build the default pdfium parser and LLM client for `config`.
    ///
    /// Fails with [`TranslatorError::ProviderNotConfigured`] when no
    /// provider can be resolved.
    pub async fn from_config(config: TranslationConfig) -> Result<Self, TranslatorError> {
        let provider = resolve_provider(&config).await?;
        let parser = PdfiumParser::new().with_password(config.password.clone());
        let client = LlmModelClient::new(provider, &config);
        Ok(Self::new(Arc::new(parser), Arc::new(client), config))
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    /// Parse `source_path` into an untranslated book on a blocking thread.
    pub async fn parse(
        &self,
        source_path: impl AsRef<Path>,
        page_limit: Option<usize>,
    ) -> Result<Book, TranslatorError> {
        let page_limit = page_limit.or(self.config.page_limit);
        if page_limit == Some(0) {
            return Err(TranslatorError::InvalidConfig(
                "Page limit must be ≥ 1".into(),
            ));
        }

        let parser = Arc::clone(&self.parser);
        let path = source_path.as_ref().to_path_buf();
        tokio::task::spawn_blocking(move || parser.parse(&path, page_limit))
            .await
            .map_err(|e| TranslatorError::Internal(format!("Parser task panicked: {}", e)))?
    }

    /// Translate every block of an already-parsed `book` in place.
    ///
    /// Never fails: blocks the model could not translate keep
    /// `status = false` and are counted in `failed_blocks`.
    pub async fn translate_book(&self, book: &mut Book, target_language: &str) -> TranslationStats {
        let start = Instant::now();
        let total_blocks = book.block_count();
        let cb = self.config.progress_callback.as_ref();

        info!(
            "Translating {} blocks on {} pages into {}",
            total_blocks,
            book.pages.len(),
            target_language
        );
        if let Some(cb) = cb {
            cb.on_translation_start(total_blocks);
        }

        for (page_idx, page) in book.pages.iter_mut().enumerate() {
            let page_num = page_idx + 1;
            for (block_idx, block) in page.contents.iter_mut().enumerate() {
                let block_num = block_idx + 1;
                if let Some(cb) = cb {
                    cb.on_block_start(page_num, block_num);
                }

                let outcome = match self.client.translate(block, target_language).await {
                    Ok(payload) => block.set_translation(payload).map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };

                match outcome {
                    Ok(()) => {
                        let len = block.translation().map_or(0, payload_len);
                        debug!("Page {} block {}: {} bytes", page_num, block_num, len);
                        if let Some(cb) = cb {
                            cb.on_block_complete(page_num, block_num, len);
                        }
                    }
                    Err(detail) => {
                        block.mark_failed();
                        warn!("Page {} block {} not translated: {}", page_num, block_num, detail);
                        if let Some(cb) = cb {
                            cb.on_block_error(page_num, block_num, &detail);
                        }
                    }
                }
            }
        }

        let translated_blocks = book.translated_count();
        if let Some(cb) = cb {
            cb.on_translation_complete(total_blocks, translated_blocks);
        }

        let stats = TranslationStats {
            page_count: book.pages.len(),
            total_blocks,
            translated_blocks,
            failed_blocks: total_blocks - translated_blocks,
            duration_ms: start.elapsed().as_millis() as u64,
            output_path: None,
        };
        info!(
            "Translation complete: {}/{} blocks, {}ms",
            stats.translated_blocks, stats.total_blocks, stats.duration_ms
        );
        stats
    }

    /// Parse, translate and return the book rendered as Markdown.
    pub async fn translate_to_text(
        &self,
        source_path: impl AsRef<Path>,
        target_language: &str,
        page_limit: Option<usize>,
    ) -> Result<String, TranslatorError> {
        let mut book = self.parse(source_path, page_limit).await?;
        self.translate_book(&mut book, target_language).await;
        Ok(render_markdown(&book))
    }

    /// Parse, translate and save the book.
    ///
    /// `format` is `"PDF"` or `"Markdown"` in any case.
    /// It is checked before the source is opened, so an unknown format
    /// fails with [`TranslatorError::UnsupportedFormat`] without touching
    /// the filesystem or the model. Without `output_path` the result lands
    /// next to the source as `<stem>_translated.<ext>`.
    pub async fn translate_and_save(
        &self,
        source_path: impl AsRef<Path>,
        format: &str,
        target_language: &str,
        output_path: Option<&Path>,
        page_limit: Option<usize>,
    ) -> Result<TranslationStats, TranslatorError> {
        let start = Instant::now();
        let format: OutputFormat = format.parse()?;

        let mut book = self.parse(source_path, page_limit).await?;
        let mut stats = self.translate_book(&mut book, target_language).await;

        let writer = self.writer.clone();
        let output_path = output_path.map(Path::to_path_buf);
        let saved = tokio::task::spawn_blocking(move || {
            writer.save(&book, format, output_path.as_deref())
        })
        .await
        .map_err(|e| TranslatorError::Internal(format!("Writer task panicked: {}", e)))??;

        stats.output_path = Some(saved);
        stats.duration_ms = start.elapsed().as_millis() as u64;
        Ok(stats)
    }

    /// Blocking wrapper around [`translate_to_text`](Self::translate_to_text).
    ///
    /// Creates a temporary tokio runtime; do not call from async code.
    pub fn translate_to_text_sync(
        &self,
        source_path: impl AsRef<Path>,
        target_language: &str,
        page_limit: Option<usize>,
    ) -> Result<String, TranslatorError> {
        runtime()?.block_on(self.translate_to_text(source_path, target_language, page_limit))
    }

    /// Blocking wrapper around [`translate_and_save`](Self::translate_and_save).
    pub fn translate_and_save_sync(
        &self,
        source_path: impl AsRef<Path>,
        format: &str,
        target_language: &str,
        output_path: Option<&Path>,
        page_limit: Option<usize>,
    ) -> Result<TranslationStats, TranslatorError> {
        runtime()?.block_on(self.translate_and_save(
            source_path,
            format,
            target_language,
            output_path,
            page_limit,
        ))
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, TranslatorError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| TranslatorError::Internal(format!("Failed to create tokio runtime: {}", e)))
}

fn payload_len(payload: &Payload) -> usize {
    match payload {
        Payload::Text(text) => text.len(),
        Payload::Table(table) => table.to_prompt_text().len(),
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, TranslatorError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        TranslatorError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. the pre-built `config.provider`;
/// 2. `config.provider_name` with `config.model`;
/// 3. `PDF_TRANSLATOR_PROVIDER` + `PDF_TRANSLATOR_MODEL`, when both are set;
/// 4. OpenAI, when `OPENAI_API_KEY` is set;
/// 5. whatever [`ProviderFactory::from_env`] detects.
async fn resolve_provider(
    config: &TranslationConfig,
) -> Result<Arc<dyn LLMProvider>, TranslatorError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("PDF_TRANSLATOR_PROVIDER"),
        std::env::var("PDF_TRANSLATOR_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create_provider("openai", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| TranslatorError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
