//! Region protection: lift verbatim spans out of the text before rewriting.
//!
//! Fenced code blocks and `<details>` disclosure blocks must survive the
//! reformatting rules untouched. [`extract`] swaps each of them for an opaque
//! placeholder token and returns the originals in a [`Regions`] value;
//! [`restore`] puts them back.
//!
//! ## Nesting
//!
//! Code spans are lifted first, then disclosure blocks are lifted from the
//! already code-stripped text. A fence inside a `<details>` block is thus
//! stored as a `{{CODE_BLOCK_n}}` token *inside* the disclosure region's
//! text. [`restore`] resolves disclosure tokens before code tokens so the
//! nested tokens come back too.
//!
//! Matching is always anchored on a closer: an unterminated fence or
//! `<details>` tag stays ordinary text.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RE_CODE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());

static RE_DISCLOSURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<details\b[^>]*>.*?</details>").unwrap());

static RE_DISCLOSURE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{DETAILS_BLOCK_(\d+)\}\}").unwrap());

static RE_CODE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{CODE_BLOCK_(\d+)\}\}").unwrap());

static RE_ANY_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(?:CODE|DETAILS)_BLOCK_\d+\}\}").unwrap());

/// Which kind of verbatim span a region holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    /// A triple-backtick fenced code block.
    Code,
    /// A `<details>…</details>` disclosure block.
    Disclosure,
}

impl RegionKind {
    fn label(self) -> &'static str {
        match self {
            RegionKind::Code => "CODE",
            RegionKind::Disclosure => "DETAILS",
        }
    }

    /// The placeholder token for the region at `index`.
    pub fn token(self, index: usize) -> String {
        format!("{{{{{}_BLOCK_{}}}}}", self.label(), index)
    }
}

/// Protected spans lifted out of one document, indexed per kind in
/// extraction order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Regions {
    pub code: Vec<String>,
    pub disclosure: Vec<String>,
}

impl Regions {
    pub fn len(&self) -> usize {
        self.code.len() + self.disclosure.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Replace every code span, then every disclosure block, with its token.
pub fn extract(text: &str) -> (String, Regions) {
    let mut regions = Regions::default();

    let stripped = RE_CODE_SPAN.replace_all(text, |caps: &Captures<'_>| {
        regions.code.push(caps[0].to_string());
        RegionKind::Code.token(regions.code.len() - 1)
    });

    let stripped = RE_DISCLOSURE.replace_all(&stripped, |caps: &Captures<'_>| {
        regions.disclosure.push(caps[0].to_string());
        RegionKind::Disclosure.token(regions.disclosure.len() - 1)
    });

    (stripped.into_owned(), regions)
}

/// Put every protected span back in place of its token.
///
/// Tokens whose index is out of range are left as they are.
pub fn restore(text: &str, regions: &Regions) -> String {
    let text = expand_disclosure(text, regions);
    RE_CODE_TOKEN
        .replace_all(&text, |caps: &Captures<'_>| {
            lookup(&regions.code, &caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Put only the disclosure blocks back; code tokens, including those nested
/// inside the blocks, stay in place.
///
/// The result reads in document order with every code span still hidden.
pub fn expand_disclosure(text: &str, regions: &Regions) -> String {
    RE_DISCLOSURE_TOKEN
        .replace_all(text, |caps: &Captures<'_>| {
            lookup(&regions.disclosure, &caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Whether `text` still contains any placeholder token.
pub fn has_placeholders(text: &str) -> bool {
    RE_ANY_TOKEN.is_match(text)
}

/// Whether `line` begins with a placeholder token.
pub fn starts_with_placeholder(line: &str) -> bool {
    RE_ANY_TOKEN
        .find(line.trim_start())
        .is_some_and(|m| m.start() == 0)
}

fn lookup(items: &[String], index: &str) -> Option<String> {
    index.parse::<usize>().ok().and_then(|i| items.get(i)).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_code_and_disclosure_in_order() {
        let input = "a\n```rust\nlet x = 1;\n```\nb\n<details><summary>S</summary>\nbody\n</details>\nc\n```\ntwo\n```";
        let (stripped, regions) = extract(input);
        assert_eq!(
            stripped,
            "a\n{{CODE_BLOCK_0}}\nb\n{{DETAILS_BLOCK_0}}\nc\n{{CODE_BLOCK_1}}"
        );
        assert_eq!(regions.code, vec!["```rust\nlet x = 1;\n```", "```\ntwo\n```"]);
        assert_eq!(regions.disclosure.len(), 1);
        assert_eq!(restore(&stripped, &regions), input);
    }

    #[test]
    fn code_inside_disclosure_is_nested() {
        let input = "<details>\n<summary>Code</summary>\n\n```sh\necho hi\n```\n</details>";
        let (stripped, regions) = extract(input);
        assert_eq!(stripped, "{{DETAILS_BLOCK_0}}");
        assert!(regions.disclosure[0].contains("{{CODE_BLOCK_0}}"));
        assert_eq!(restore(&stripped, &regions), input);
    }

    #[test]
    fn expand_disclosure_keeps_code_hidden() {
        let input = "```\ntop\n```\n<details><summary>S</summary>\n```\nin\n```\n![a](u)\n</details>";
        let (stripped, regions) = extract(input);
        let expanded = expand_disclosure(&stripped, &regions);
        assert_eq!(
            expanded,
            "{{CODE_BLOCK_0}}\n<details><summary>S</summary>\n{{CODE_BLOCK_1}}\n![a](u)\n</details>"
        );
    }

    #[test]
    fn unterminated_fence_is_plain_text() {
        let input = "before\n```python\nprint(1)\n";
        let (stripped, regions) = extract(input);
        assert_eq!(stripped, input);
        assert!(regions.is_empty());
    }

    #[test]
    fn unterminated_details_is_plain_text() {
        let input = "<details><summary>open</summary>\nnever closed";
        let (stripped, regions) = extract(input);
        assert_eq!(stripped, input);
        assert!(regions.disclosure.is_empty());
    }

    #[test]
    fn restore_is_idempotent() {
        let input = "x\n```\ny\n```\n";
        let (stripped, regions) = extract(input);
        let once = restore(&stripped, &regions);
        assert_eq!(restore(&once, &regions), once);
        assert!(!has_placeholders(&once));
    }

    #[test]
    fn out_of_range_token_is_left_in_place() {
        let regions = Regions::default();
        assert_eq!(restore("{{CODE_BLOCK_3}}", &regions), "{{CODE_BLOCK_3}}");
    }

    #[test]
    fn placeholder_line_detection() {
        assert!(starts_with_placeholder("{{CODE_BLOCK_12}}"));
        assert!(starts_with_placeholder("  {{DETAILS_BLOCK_0}} trailing"));
        assert!(!starts_with_placeholder("text {{CODE_BLOCK_0}}"));
        assert_eq!(RegionKind::Disclosure.token(4), "{{DETAILS_BLOCK_4}}");
    }
}
