//! Structural reformatting of the unprotected text.
//!
//! The converter emits one line per source block, separated by single
//! newlines, with blockquote markers spaced however the author typed them.
//! Markdown renderers would merge those lines into one paragraph and glue
//! the line after a quote onto the quote.
//!
//! Rather than chaining global substitutions, every line is first classified
//! into a [`LineKind`]; the rules below then look only at a line's kind and
//! the kind of the line after it:
//!
//! 1. `Quote` lines become `> ` + trimmed content.
//! 2. A quote run followed by a non-blank, non-quote line gets one blank line.
//! 3. A `Paragraph` line followed by another `Paragraph` line gets a break
//!    ([`ParagraphBreak`]); followed by a `Protected` line it gets a blank
//!    line.
//! 4. Runs of blank lines collapse to one.
//!
//! Placeholder tokens are never split: a line starting with one is
//! `Protected` and passes through unchanged.

use crate::config::ParagraphBreak;
use crate::pipeline::protect::starts_with_placeholder;

/// Structural class of one line of unprotected text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Quote,
    Blank,
    Protected,
    Paragraph,
}

/// Classify a single line (without its newline).
pub fn classify(line: &str) -> LineKind {
    if line.trim().is_empty() {
        LineKind::Blank
    } else if line.trim_start().starts_with('>') {
        LineKind::Quote
    } else if starts_with_placeholder(line) {
        LineKind::Protected
    } else {
        LineKind::Paragraph
    }
}

/// Apply every structural rule to `text`.
pub fn reformat(text: &str, style: ParagraphBreak) -> String {
    let text = normalise_line_endings(text);
    let classified: Vec<(LineKind, &str)> = text.lines().map(|l| (classify(l), l)).collect();

    let mut out: Vec<String> = Vec::with_capacity(classified.len() + 8);
    for (i, &(kind, line)) in classified.iter().enumerate() {
        let next = classified.get(i + 1).map(|&(k, _)| k);
        match kind {
            LineKind::Quote => {
                out.push(normalise_quote(line));
                if matches!(next, Some(LineKind::Paragraph | LineKind::Protected)) {
                    out.push(String::new());
                }
            }
            LineKind::Blank => out.push(String::new()),
            LineKind::Protected => out.push(line.to_string()),
            LineKind::Paragraph => match (next, style) {
                (Some(LineKind::Paragraph), ParagraphBreak::HardBreak) => {
                    out.push(format!("{}  ", line.trim_end()));
                }
                (Some(LineKind::Paragraph), ParagraphBreak::BlankLine)
                | (Some(LineKind::Protected), _) => {
                    out.push(line.to_string());
                    out.push(String::new());
                }
                _ => out.push(line.to_string()),
            },
        }
    }

    let mut result = collapse_blank_runs(out).join("\n");
    if text.ends_with('\n') {
        result.push('\n');
    }
    result
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

/// `  >  text ` → `> text`; a bare `>` stays bare.
fn normalise_quote(line: &str) -> String {
    let line = line.trim_start();
    let content = line.strip_prefix('>').unwrap_or(line).trim();
    if content.is_empty() {
        ">".to_string()
    } else {
        format!("> {content}")
    }
}

fn collapse_blank_runs(lines: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        let blank = line.is_empty();
        if blank && result.last().is_some_and(|prev| prev.is_empty()) {
            continue;
        }
        result.push(line);
    }
    result
}
