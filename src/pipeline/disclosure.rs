//! Finishing pass for protected `<details>` blocks.
//!
//! Disclosure blocks skip the structural reformatter, so they get their own
//! cleanup here, one block at a time and in extraction order:
//!
//! 1. the opening tag gets `markdown="1"` so the site renderer processes
//!    the markdown nested inside the raw HTML;
//! 2. the `<summary>` caption goes through [`inline::normalize_caption`];
//! 3. exactly one blank line follows `</summary>`;
//! 4. converter escapes (`\*`, `\_`, `&lt;`, `&gt;`, `&amp;`) in the body are
//!    undone;
//! 5. nested code placeholders are left alone, so fences come back
//!    byte-identical at restore time;
//! 6. runs of blank lines collapse to one.
//!
//! Every step is a no-op on an already finished block.

use crate::pipeline::inline;
use crate::pipeline::protect::Regions;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RE_OPEN_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<details\b([^>]*)>").unwrap());

static RE_MARKDOWN_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bmarkdown\s*=").unwrap());

static RE_SUMMARY_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</summary>[ \t]*(?:\n(?:[ \t]*\n)*)?").unwrap());

static RE_BLANK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").unwrap());

/// Finish every disclosure region in place.
pub fn finish_all(regions: &mut Regions) {
    for block in regions.disclosure.iter_mut() {
        *block = finish_block(block);
    }
}

/// Finish a single `<details>…</details>` block.
pub fn finish_block(block: &str) -> String {
    let s = ensure_markdown_attr(block);
    let s = inline::normalize_captions(&s);
    let s = space_after_summary(&s);
    let s = unescape_body(&s);
    RE_BLANK_RUN.replace_all(&s, "\n\n").into_owned()
}

fn ensure_markdown_attr(block: &str) -> String {
    RE_OPEN_TAG
        .replace(block, |caps: &Captures<'_>| {
            let attrs = &caps[1];
            if RE_MARKDOWN_ATTR.is_match(attrs) {
                caps[0].to_string()
            } else {
                format!("<details{} markdown=\"1\">", attrs.trim_end())
            }
        })
        .into_owned()
}

fn space_after_summary(block: &str) -> String {
    RE_SUMMARY_END.replace(block, "</summary>\n\n").into_owned()
}

/// Undo converter escapes after the caption; the caption itself was already
/// handled by the inline normaliser.
fn unescape_body(block: &str) -> String {
    let split = RE_SUMMARY_END
        .find(block)
        .map(|m| m.end())
        .or_else(|| RE_OPEN_TAG.find(block).map(|m| m.end()))
        .unwrap_or(0);
    let (head, body) = block.split_at(split);
    let body = body.replace("\\*", "*").replace("\\_", "_");
    format!("{head}{}", inline::decode_entities(&body))
}
