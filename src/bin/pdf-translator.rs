//! CLI binary for pdf-translator.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `TranslationConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_translator::config::DEFAULT_TARGET_LANGUAGE;
use pdf_translator::{
    render_markdown, OutputFormat, PdfTranslator, ProgressCallback, TranslationConfig,
    TranslationProgressCallback,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar with one log line per translated block.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start of the block currently in flight (blocks run one at a time).
    block_started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_translation_start` reports the block count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            block_started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} blocks  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Translating");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self) -> f64 {
        self.block_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map_or(0.0, |t| t.elapsed().as_secs_f64())
    }
}

impl TranslationProgressCallback for CliProgressCallback {
    fn on_translation_start(&self, total_blocks: usize) {
        self.activate_bar(total_blocks);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Translating {total_blocks} blocks…"))
        ));
    }

    fn on_block_start(&self, page_num: usize, block_num: usize) {
        if let Ok(mut started) = self.block_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar
            .set_message(format!("page {page_num} block {block_num}"));
    }

    fn on_block_complete(&self, page_num: usize, block_num: usize, translated_len: usize) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} Page {:>3} block {:<3}  {:<11}  {}",
            green("✓"),
            page_num,
            block_num,
            dim(&format!("{translated_len:>5} bytes")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_block_error(&self, page_num: usize, block_num: usize, error: &str) {
        let secs = self.elapsed_secs();
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(['…']).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3} block {:<3}  {}  {}",
            red("✗"),
            page_num,
            block_num,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_translation_complete(&self, total_blocks: usize, translated: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} blocks translated",
                green("✔"),
                bold(&translated.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} blocks translated  ({} skipped)",
                if translated == 0 { red("✘") } else { cyan("⚠") },
                bold(&translated.to_string()),
                total_blocks,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Translate into Chinese, write paper_translated.md next to the input
  pdf-translator paper.pdf

  # First 3 pages into Japanese, as a PDF
  pdf-translator paper.pdf -l 日文 -f pdf --pages 3 --font fonts/NotoSansJP-Regular.ttf

  # Print Markdown to stdout
  pdf-translator paper.pdf --stdout

  # Dump the translated book as JSON
  pdf-translator paper.pdf --json > book.json

  # Use a specific provider and model
  pdf-translator --provider anthropic --model claude-sonnet-4-20250514 paper.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY            OpenAI API key
  ANTHROPIC_API_KEY         Anthropic API key
  GEMINI_API_KEY            Google Gemini API key
  PDF_TRANSLATOR_PROVIDER   Provider (openai, anthropic, gemini, ollama)
  PDF_TRANSLATOR_MODEL      Model ID
  PDFIUM_LIB_PATH           Path to libpdfium
  RUST_LOG                  Log filter, overrides -v / -q

PDF OUTPUT:
  Translated PDFs are typeset with the font given by --font (default
  fonts/simsun.ttc). Use a font that covers the target language's script.
"#;

/// Translate PDF documents with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-translator",
    version,
    about = "Translate PDF documents into another language with an LLM",
    long_about = "Translate a PDF's paragraphs and tables into another language, block by block, \
and save the result as Markdown or PDF. Supports OpenAI, Anthropic, Google Gemini, Azure OpenAI, \
and any OpenAI-compatible endpoint (Ollama, vLLM, LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Output format: markdown or pdf.
    #[arg(short, long, env = "PDF_TRANSLATOR_FORMAT", default_value = "markdown")]
    format: String,

    /// Target language label, passed to the model as-is.
    #[arg(short = 'l', long = "language", env = "PDF_TRANSLATOR_LANGUAGE",
          default_value = DEFAULT_TARGET_LANGUAGE)]
    language: String,

    /// Output file. Default: <input stem>_translated.<ext> next to the input.
    #[arg(short, long, env = "PDF_TRANSLATOR_OUTPUT")]
    output: Option<PathBuf>,

    /// Translate only the first N pages.
    #[arg(long, env = "PDF_TRANSLATOR_PAGES",
          value_parser = clap::value_parser!(u32).range(1..))]
    pages: Option<u32>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "PDF_TRANSLATOR_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID (e.g. gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "PDF_TRANSLATOR_MODEL")]
    model: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF_TRANSLATOR_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Max LLM output tokens per block.
    #[arg(long, env = "PDF_TRANSLATOR_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// Retries per block on LLM failure.
    #[arg(long, env = "PDF_TRANSLATOR_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,

    /// Font file for PDF output.
    #[arg(long, env = "PDF_TRANSLATOR_FONT")]
    font: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF_TRANSLATOR_PASSWORD")]
    password: Option<String>,

    /// Print the Markdown translation to stdout instead of writing a file.
    #[arg(long, env = "PDF_TRANSLATOR_STDOUT", conflicts_with = "json")]
    stdout: bool,

    /// Print the translated book as JSON instead of writing a file.
    #[arg(long, env = "PDF_TRANSLATOR_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF_TRANSLATOR_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_TRANSLATOR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF_TRANSLATOR_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn TranslationProgressCallback>)
    } else {
        None
    };

    // An unknown format must be reported before provider resolution can fail.
    let format = output_format(&cli)?;
    let config = build_config(&cli, progress_cb)?;
    let translator = PdfTranslator::from_config(config)
        .await
        .context("Failed to set up the LLM provider")?;
    let page_limit = cli.pages.map(|n| n as usize);

    // ── Print instead of saving ──────────────────────────────────────────
    if cli.stdout || cli.json {
        let mut book = translator
            .parse(&cli.input, page_limit)
            .await
            .context("Failed to read PDF")?;
        let stats = translator.translate_book(&mut book, &cli.language).await;

        let text = if cli.json {
            serde_json::to_string_pretty(&book).context("Failed to serialise book")?
        } else {
            render_markdown(&book)
        };

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        if !text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }

        if !cli.quiet && !show_progress {
            eprintln!(
                "Translated {}/{} blocks in {}ms",
                stats.translated_blocks, stats.total_blocks, stats.duration_ms
            );
        }
        return Ok(());
    }

    // ── Translate and save ───────────────────────────────────────────────
    let stats = translator
        .translate_and_save(
            &cli.input,
            &format.to_string(),
            &cli.language,
            cli.output.as_deref(),
            page_limit,
        )
        .await
        .context("Translation failed")?;

    if !cli.quiet {
        let written = stats
            .output_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        eprintln!(
            "{}  {}/{} blocks  {} pages  {}ms  →  {}",
            if stats.failed_blocks == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.translated_blocks,
            stats.total_blocks,
            stats.page_count,
            stats.duration_ms,
            bold(&written),
        );
    }

    Ok(())
}

fn output_format(cli: &Cli) -> Result<OutputFormat> {
    cli.format
        .parse()
        .with_context(|| format!("Invalid --format '{}'", cli.format))
}

/// Map CLI args to `TranslationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<TranslationConfig> {
    let mut builder = TranslationConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref font) = cli.font {
        builder = builder.font_path(font.clone());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
