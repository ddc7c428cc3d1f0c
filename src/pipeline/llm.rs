//! Model interaction: translate one block through the language model.
//!
//! [`ModelClient`] is the seam the translator depends on. The default
//! [`LlmModelClient`] sends the prompt from [`crate::prompts`] through any
//! `edgequake_llm` provider, cleans the reply, and reads it back into a
//! payload of the block's kind.
//!
//! A failed block is an ordinary outcome here: every failure is returned as
//! a [`ModelRequestFailure`] value, never as a fatal error.
//!
//! ## Retry Strategy
//!
//! Retries are off by default. With `max_retries > 0` the wait before
//! attempt `n` is `retry_backoff_ms * 2^(n-1)`: 500 ms → 1 s → 2 s.

use crate::book::{ContentBlock, Payload};
use crate::config::TranslationConfig;
use crate::error::ModelRequestFailure;
use crate::pipeline::postprocess::clean_reply;
use crate::prompts::{translate_prompt, DEFAULT_SYSTEM_PROMPT};
use crate::table::Table;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::future::Future;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Translates a single block into a target language.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Translate `block` into `target_language`.
    ///
    /// `Ok` carries a payload of the same kind as the block's original.
    async fn translate(
        &self,
        block: &ContentBlock,
        target_language: &str,
    ) -> Result<Payload, ModelRequestFailure>;
}

/// How often a failed request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_ms: config.retry_backoff_ms,
        }
    }

    /// Wait before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.backoff_ms.saturating_mul(factor))
    }
}

/// Run `request` until it succeeds or the policy's retries are exhausted.
pub async fn request_with_retry<F, Fut>(
    policy: RetryPolicy,
    mut request: F,
) -> Result<String, ModelRequestFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, String>>,
{
    let mut last_err = String::new();

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let backoff = policy.delay_for(attempt);
            warn!(
                "Retry {}/{} after {}ms",
                attempt,
                policy.max_retries,
                backoff.as_millis()
            );
            sleep(backoff).await;
        }

        match request().await {
            Ok(reply) => return Ok(reply),
            Err(e) => {
                warn!("Attempt {} failed: {}", attempt + 1, e);
                last_err = e;
            }
        }
    }

    Err(ModelRequestFailure::RequestFailed {
        retries: policy.max_retries,
        detail: last_err,
    })
}

/// Read a cleaned model reply back into a payload shaped like `original`.
pub fn interpret_reply(original: &Payload, reply: &str) -> Result<Payload, ModelRequestFailure> {
    let reply = clean_reply(reply);
    if reply.is_empty() {
        return Err(ModelRequestFailure::EmptyResponse);
    }

    match original {
        Payload::Text(_) => Ok(Payload::Text(reply)),
        Payload::Table(table) => Table::parse_reply(&reply, table.column_count())
            .map(Payload::Table)
            .map_err(|e| ModelRequestFailure::MalformedTable {
                expected: table.column_count(),
                detail: e.to_string(),
            }),
    }
}

/// [`ModelClient`] backed by an `edgequake_llm` chat provider.
pub struct LlmModelClient {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    options: CompletionOptions,
    retry: RetryPolicy,
}

impl LlmModelClient {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &TranslationConfig) -> Self {
        Self {
            provider,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            options: build_options(config),
            retry: RetryPolicy::from_config(config),
        }
    }
}

#[async_trait]
impl ModelClient for LlmModelClient {
    async fn translate(
        &self,
        block: &ContentBlock,
        target_language: &str,
    ) -> Result<Payload, ModelRequestFailure> {
        let prompt = translate_prompt(block.original(), target_language);
        debug!("{}", prompt);

        let messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(prompt.as_str()),
        ];

        let provider = &self.provider;
        let options = &self.options;
        let messages = &messages;
        let reply = request_with_retry(self.retry, move || async move {
            provider
                .chat(messages, Some(options))
                .await
                .map(|response| {
                    debug!(
                        "{} input tokens, {} output tokens",
                        response.prompt_tokens, response.completion_tokens
                    );
                    response.content
                })
                .map_err(|e| e.to_string())
        })
        .await?;
        info!("{}", reply);

        interpret_reply(block.original(), &reply)
    }
}

/// Build `CompletionOptions` from the translation config.
fn build_options(config: &TranslationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
