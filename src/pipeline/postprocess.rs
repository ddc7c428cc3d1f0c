//! Post-processing: deterministic cleanup of model replies.
//!
//! Models asked for "only the translation" still wrap it in a code fence
//! now and then, announce it with a label such as `Translation:`, or leak
//! zero-width characters copied from the source PDF. The rules here remove
//! that packaging and leave the translated text itself alone. They run
//! before a reply is stored in a block, so both writers see the same text.

use once_cell::sync::Lazy;
use regex::Regex;

/// A single cleanup step.
type Rule = fn(&str) -> String;

/// Rules in application order. Fences come first so the label rule sees
/// the real first line; line-level rules need `\n` endings.
const RULES: &[Rule] = &[
    unwrap_fence,
    normalise_lines,
    drop_reply_label,
    squeeze_blank_runs,
    strip_invisible,
];

/// Apply every cleanup rule to a raw model reply and trim the result.
pub fn clean_reply(input: &str) -> String {
    RULES
        .iter()
        .fold(input.to_string(), |text, rule| rule(&text))
        .trim()
        .to_string()
}

static RE_FENCED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[\w-]*[ \t]*\r?\n(.*?)\r?\n```\s*$").unwrap());

/// Replace a reply that is one fenced block with the block's body.
fn unwrap_fence(input: &str) -> String {
    match RE_FENCED.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

/// LF line endings, no trailing whitespace on any line.
fn normalise_lines(input: &str) -> String {
    input
        .replace("\r\n", "\n")
        .split(['\n', '\r'])
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

static RE_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(translation|translated text|译文|翻译|翻譯|訳文)\s*[:：]\s*").unwrap()
});

/// Remove a leading "Translation:" style label, keeping any text after it.
fn drop_reply_label(input: &str) -> String {
    RE_LABEL.replace(input, "").into_owned()
}

static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// At most one empty line between paragraphs.
fn squeeze_blank_runs(input: &str) -> String {
    RE_BLANK_RUN.replace_all(input, "\n\n").into_owned()
}

fn strip_invisible(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'))
        .collect()
}
