//! Integration tests for the translation pipeline.
//!
//! The parser and model are replaced by in-memory fakes, so these tests need
//! neither pdfium nor an API key. A gated test at the bottom runs the real
//! stack when `E2E_ENABLED` and `E2E_PDF` are set:
//!
//!   E2E_ENABLED=1 E2E_PDF=paper.pdf cargo test --test translation_pipeline -- --nocapture

use async_trait::async_trait;
use pdf_translator::pipeline::parse::clamp_page_limit;
use pdf_translator::{
    render_markdown, Book, ContentBlock, DocumentParser, ModelClient, ModelRequestFailure, Page,
    Payload, PdfTranslator, Table, TranslationConfig, TranslationProgressCallback,
    TranslatorError,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test doubles ─────────────────────────────────────────────────────────────

/// Hands out a fixed set of pages for any path.
struct MemoryParser {
    pages: Vec<Page>,
    calls: AtomicUsize,
}

impl MemoryParser {
    fn new(pages: Vec<Page>) -> Arc<Self> {
        Arc::new(Self {
            pages,
            calls: AtomicUsize::new(0),
        })
    }
}

impl DocumentParser for MemoryParser {
    fn parse(&self, path: &Path, page_limit: Option<usize>) -> Result<Book, TranslatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let keep = clamp_page_limit(page_limit, self.pages.len());
        Ok(Book::new(path, self.pages[..keep].to_vec()))
    }
}

/// Answers from a script keyed by the block's text (or a table's first
/// header); unscripted text is upper-cased.
#[derive(Default)]
struct ScriptedClient {
    script: HashMap<String, Result<Payload, ModelRequestFailure>>,
    seen: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn with(mut self, key: &str, reply: Result<Payload, ModelRequestFailure>) -> Self {
        self.script.insert(key.to_string(), reply);
        self
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

fn key_of(payload: &Payload) -> String {
    match payload {
        Payload::Text(t) => t.clone(),
        Payload::Table(t) => t.columns()[0].clone(),
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn translate(
        &self,
        block: &ContentBlock,
        _target_language: &str,
    ) -> Result<Payload, ModelRequestFailure> {
        let key = key_of(block.original());
        self.seen.lock().unwrap().push(key.clone());
        match self.script.get(&key) {
            Some(reply) => reply.clone(),
            None => Ok(Payload::Text(key.to_uppercase())),
        }
    }
}

/// Records every progress event as a short string.
#[derive(Default)]
struct Recorder(Mutex<Vec<String>>);

impl TranslationProgressCallback for Recorder {
    fn on_translation_start(&self, total_blocks: usize) {
        self.0.lock().unwrap().push(format!("start {total_blocks}"));
    }
    fn on_block_complete(&self, page_num: usize, block_num: usize, _len: usize) {
        self.0.lock().unwrap().push(format!("ok {page_num}.{block_num}"));
    }
    fn on_block_error(&self, page_num: usize, block_num: usize, _error: &str) {
        self.0.lock().unwrap().push(format!("err {page_num}.{block_num}"));
    }
    fn on_translation_complete(&self, total_blocks: usize, translated: usize) {
        self.0
            .lock()
            .unwrap()
            .push(format!("done {translated}/{total_blocks}"));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

const FIXTURE_FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/DejaVuSans.ttf");

fn occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

fn page_objects(pdf: &[u8]) -> usize {
    occurrences(pdf, b"/Type/Page") - occurrences(pdf, b"/Type/Pages")
}

fn text_page(texts: &[&str]) -> Page {
    Page::new(texts.iter().map(|t| ContentBlock::text(*t)).collect())
}

fn fruit_table() -> Table {
    Table::new(
        vec!["Fruit".into(), "Color".into()],
        vec![vec!["Apple".into(), "Red".into()]],
    )
    .unwrap()
}

fn failed() -> Result<Payload, ModelRequestFailure> {
    Err(ModelRequestFailure::RequestFailed {
        retries: 0,
        detail: "HTTP 500".into(),
    })
}

fn translator(
    parser: Arc<MemoryParser>,
    client: Arc<ScriptedClient>,
    config: TranslationConfig,
) -> PdfTranslator {
    PdfTranslator::new(parser, client, config)
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn blocks_are_translated_in_document_order() {
    let client = Arc::new(ScriptedClient::default());
    let t = translator(
        MemoryParser::new(vec![text_page(&["a", "b"]), text_page(&["c"])]),
        Arc::clone(&client),
        TranslationConfig::default(),
    );

    let md = t.translate_to_text("doc.pdf", "EN", None).await.unwrap();

    assert_eq!(client.seen(), ["a", "b", "c"]);
    assert_eq!(md, "A\n\nB\n\n---\n\nC\n\n");
}

#[tokio::test]
async fn failed_blocks_are_left_out() {
    let client = Arc::new(ScriptedClient::default().with("b", failed()));
    let t = translator(
        MemoryParser::new(vec![text_page(&["a", "b", "c"])]),
        client,
        TranslationConfig::default(),
    );

    let md = t.translate_to_text("doc.pdf", "EN", None).await.unwrap();
    assert_eq!(md, "A\n\nC\n\n");
}

#[test]
fn rendering_twice_gives_the_same_text() {
    let t = translator(
        MemoryParser::new(vec![text_page(&["x"]), text_page(&["y"])]),
        Arc::new(ScriptedClient::default()),
        TranslationConfig::default(),
    );

    let mut book = Book::new("doc.pdf", vec![text_page(&["x"]), text_page(&["y"])]);
    tokio_test::block_on(t.translate_book(&mut book, "EN"));

    let first = render_markdown(&book);
    assert_eq!(first, render_markdown(&book));
    assert_eq!(first, "X\n\n---\n\nY\n\n");
}

#[tokio::test]
async fn unknown_format_fails_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let parser = MemoryParser::new(vec![text_page(&["a"])]);
    let client = Arc::new(ScriptedClient::default());
    let t = translator(
        Arc::clone(&parser),
        Arc::clone(&client),
        TranslationConfig::default(),
    );

    let err = t
        .translate_and_save(
            dir.path().join("doc.pdf"),
            "Docx",
            "EN",
            Some(&dir.path().join("out.docx")),
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, TranslatorError::UnsupportedFormat { ref format } if format == "Docx"));
    assert_eq!(parser.calls.load(Ordering::SeqCst), 0);
    assert!(client.seen().is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn one_separator_between_each_pair_of_pages() {
    let pages: Vec<Page> = (0..5).map(|i| text_page(&[&format!("p{i}")])).collect();
    let t = translator(
        MemoryParser::new(pages),
        Arc::new(ScriptedClient::default()),
        TranslationConfig::default(),
    );

    let md = t.translate_to_text("doc.pdf", "EN", None).await.unwrap();
    assert_eq!(md.matches("---\n\n").count(), 4);
    assert!(md.ends_with("P4\n\n"));
}

#[tokio::test]
async fn two_page_document_saved_as_markdown() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("greeting.pdf");
    let client = ScriptedClient::default()
        .with("Hello", Ok(Payload::Text("你好".into())))
        .with("World", Ok(Payload::Text("世界".into())))
        .with("Fruit", failed());
    let t = translator(
        MemoryParser::new(vec![
            Page::new(vec![
                ContentBlock::text("Hello"),
                ContentBlock::table(fruit_table()),
            ]),
            text_page(&["World"]),
        ]),
        Arc::new(client),
        TranslationConfig::default(),
    );

    let stats = t
        .translate_and_save(&source, "markdown", "中文", None, None)
        .await
        .unwrap();

    let written = dir.path().join("greeting_translated.md");
    assert_eq!(stats.output_path.as_deref(), Some(written.as_path()));
    assert_eq!(stats.total_blocks, 3);
    assert_eq!(stats.translated_blocks, 2);
    assert_eq!(stats.failed_blocks, 1);
    assert_eq!(stats.page_count, 2);
    assert_eq!(
        std::fs::read_to_string(&written).unwrap(),
        "你好\n\n---\n\n世界\n\n"
    );
}

#[tokio::test]
async fn translated_table_is_rendered_as_pipe_table() {
    let zh = Table::new(
        vec!["水果".into(), "颜色".into()],
        vec![vec!["苹果".into(), "红色".into()]],
    )
    .unwrap();
    let client = ScriptedClient::default().with("Fruit", Ok(Payload::Table(zh)));
    let t = translator(
        MemoryParser::new(vec![Page::new(vec![ContentBlock::table(fruit_table())])]),
        Arc::new(client),
        TranslationConfig::default(),
    );

    let md = t.translate_to_text("doc.pdf", "中文", None).await.unwrap();
    assert_eq!(md, "| 水果 | 颜色 |\n| --- | --- |\n| 苹果 | 红色 |\n\n");
}

#[tokio::test]
async fn failure_mid_page_does_not_stop_the_run() {
    let recorder = Arc::new(Recorder::default());
    let client = Arc::new(ScriptedClient::default().with("b2", failed()));
    let config = TranslationConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let t = translator(
        MemoryParser::new(vec![text_page(&["b1", "b2", "b3", "b4", "b5"])]),
        Arc::clone(&client),
        config,
    );

    let mut book = t.parse("doc.pdf", None).await.unwrap();
    let stats = t.translate_book(&mut book, "EN").await;

    assert_eq!(client.seen().len(), 5);
    assert_eq!(stats.translated_blocks, 4);
    assert_eq!(stats.failed_blocks, 1);

    let statuses: Vec<bool> = book.blocks().map(|b| b.status()).collect();
    assert_eq!(statuses, [true, false, true, true, true]);
    assert_eq!(
        *recorder.0.lock().unwrap(),
        ["start 5", "ok 1.1", "err 1.2", "ok 1.3", "ok 1.4", "ok 1.5", "done 4/5"]
    );
}

#[tokio::test]
async fn missing_font_fails_pdf_but_not_markdown() {
    let dir = tempfile::tempdir().unwrap();
    let config = TranslationConfig::builder()
        .font_path(dir.path().join("no-such-font.ttc"))
        .build()
        .unwrap();
    let t = translator(
        MemoryParser::new(vec![text_page(&["a"])]),
        Arc::new(ScriptedClient::default()),
        config,
    );
    let source = dir.path().join("doc.pdf");

    let err = t
        .translate_and_save(&source, "PDF", "EN", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TranslatorError::FontLoad { .. }));
    assert!(!dir.path().join("doc_translated.pdf").exists());

    let stats = t
        .translate_and_save(&source, "Markdown", "EN", None, None)
        .await
        .unwrap();
    assert_eq!(stats.output_path, Some(dir.path().join("doc_translated.md")));
}

#[tokio::test]
async fn two_page_document_saved_as_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("doc.pdf");
    let config = || {
        TranslationConfig::builder()
            .font_path(FIXTURE_FONT)
            .build()
            .unwrap()
    };
    let pages = || vec![text_page(&["Hello", "broken", "there"]), text_page(&["World"])];

    let out = dir.path().join("out.pdf");
    let client = ScriptedClient::default().with("broken", failed());
    let stats = translator(MemoryParser::new(pages()), Arc::new(client), config())
        .translate_and_save(&source, "PDF", "EN", Some(&out), None)
        .await
        .unwrap();
    assert_eq!(stats.output_path.as_deref(), Some(out.as_path()));
    assert_eq!(stats.failed_blocks, 1);
    assert!(!dir.path().join("out.pdf.tmp").exists());

    // Same pages with nothing translated, to net out the fixed PDF content.
    let blank = dir.path().join("blank.pdf");
    let nothing = ["Hello", "broken", "there", "World"]
        .iter()
        .fold(ScriptedClient::default(), |c, key| c.with(key, failed()));
    translator(MemoryParser::new(pages()), Arc::new(nothing), config())
        .translate_and_save(&source, "pdf", "EN", Some(&blank), None)
        .await
        .unwrap();

    let pdf = std::fs::read(&out).unwrap();
    let blank = std::fs::read(&blank).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
    assert_eq!(page_objects(&pdf), 2);
    assert_eq!(page_objects(&blank), 2);
    // "Hello", "there" and "World", one line each; "broken" is left out.
    assert_eq!(occurrences(&pdf, b"BT\n") - occurrences(&blank, b"BT\n"), 3);
}

#[tokio::test]
async fn page_limit_past_the_end_is_clamped() {
    let t = translator(
        MemoryParser::new(vec![text_page(&["a"]), text_page(&["b"]), text_page(&["c"])]),
        Arc::new(ScriptedClient::default()),
        TranslationConfig::default(),
    );

    let all = t.parse("doc.pdf", Some(10)).await.unwrap();
    assert_eq!(all.pages.len(), 3);

    let md = t.translate_to_text("doc.pdf", "EN", Some(2)).await.unwrap();
    assert_eq!(md, "A\n\n---\n\nB\n\n");
}

#[tokio::test]
async fn explicit_output_path_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested/result.md");
    let t = translator(
        MemoryParser::new(vec![text_page(&["a"])]),
        Arc::new(ScriptedClient::default()),
        TranslationConfig::default(),
    );

    let stats = t
        .translate_and_save("elsewhere/doc.pdf", "Markdown", "EN", Some(&out), None)
        .await
        .unwrap();
    assert_eq!(stats.output_path.as_deref(), Some(out.as_path()));
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "A\n\n");
}

// ── Live test ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn live_translation_of_first_page() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let Ok(pdf) = std::env::var("E2E_PDF") else {
        println!("SKIP: set E2E_PDF=/path/to/file.pdf");
        return;
    };

    let translator = PdfTranslator::from_config(TranslationConfig::default())
        .await
        .expect("provider");
    let md = translator
        .translate_to_text(&pdf, "中文", Some(1))
        .await
        .expect("translation");

    assert!(!md.trim().is_empty(), "translation is empty");
    assert!(!md.starts_with("```"), "reply fences were not stripped");
    println!("{md}");
}
