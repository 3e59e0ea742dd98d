//! Inline markup inside `<summary>` captions.
//!
//! The converter writes a toggle block's caption as raw text inside an HTML
//! element, and markdown is not rendered inside raw HTML. Whatever inline
//! markdown the author typed there (`**bold**`, `*italic*`, `` `code` ``,
//! `[label](url)`) is therefore converted to literal HTML here.
//!
//! Body markdown outside captions renders natively and is left alone.
//!
//! ## Rule Order
//!
//! Code spans are split off first: their content stays literal, and no
//! emphasis rule can match across a span boundary. Bold runs before italic
//! so the single-asterisk rule never eats half of a `**` pair. Links are
//! built before entity decoding so an escaped `&lt;` inside a URL is not
//! decoded into a tag-breaking `<` before the link is built.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());

/// A backtick span, or a `<code>` element left by an earlier pass.
static RE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"`[^`\n]+`|<code>.*?</code>").unwrap());

static RE_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]\n]+)\]\(([^)\s]+)\)").unwrap());

static RE_SUMMARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(<summary\b[^>]*>)(.*?)(</summary>)").unwrap());

/// Convert the inline markdown subset in a caption's inner text to HTML.
pub fn normalize_caption(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len() + 16);
    let mut last = 0;
    for m in RE_CODE.find_iter(inner) {
        out.push_str(&convert_emphasis(&inner[last..m.start()]));
        let span = m.as_str();
        match span.strip_prefix('`').and_then(|s| s.strip_suffix('`')) {
            Some(code) => {
                out.push_str("<code>");
                out.push_str(code);
                out.push_str("</code>");
            }
            None => out.push_str(span),
        }
        last = m.end();
    }
    out.push_str(&convert_emphasis(&inner[last..]));
    decode_entities(&out)
}

/// Bold, italic and links over text that holds no code span.
fn convert_emphasis(text: &str) -> String {
    let s = RE_BOLD.replace_all(text, "<strong>$1</strong>");
    let s = convert_italic(&s);
    RE_LINK.replace_all(&s, r#"<a href="$2">$1</a>"#).into_owned()
}

/// Apply [`normalize_caption`] to every `<summary>` element in `text`.
pub fn normalize_captions(text: &str) -> String {
    RE_SUMMARY
        .replace_all(text, |caps: &Captures<'_>| {
            format!("{}{}{}", &caps[1], normalize_caption(&caps[2]), &caps[3])
        })
        .into_owned()
}

/// Decode the three entities the converter escapes. `&amp;` goes last so
/// `&amp;lt;` becomes the literal text `&lt;`.
pub fn decode_entities(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// `*X*` → `<em>X</em>` where neither delimiter touches another `*` and the
/// content does not start or end with whitespace.
fn convert_italic(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let is_lone_star = |i: usize| {
        chars[i] == '*'
            && (i == 0 || chars[i - 1] != '*')
            && chars.get(i + 1).is_none_or(|&c| c != '*')
    };

    let mut out = String::with_capacity(input.len() + 16);
    let mut i = 0;
    while i < chars.len() {
        if is_lone_star(i) && chars.get(i + 1).is_some_and(|c| !c.is_whitespace()) {
            let close = (i + 2..chars.len())
                .take_while(|&j| chars[j] != '\n')
                .find(|&j| is_lone_star(j) && !chars[j - 1].is_whitespace());
            if let Some(j) = close {
                out.push_str("<em>");
                out.extend(&chars[i + 1..j]);
                out.push_str("</em>");
                i = j + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_full_subset() {
        let input = "**hi** and *there* and `code` and [a](http://x)";
        assert_eq!(
            normalize_caption(input),
            r#"<strong>hi</strong> and <em>there</em> and <code>code</code> and <a href="http://x">a</a>"#
        );
    }

    #[test]
    fn bold_is_not_reread_as_italic() {
        assert_eq!(normalize_caption("**a** b"), "<strong>a</strong> b");
    }

    #[test]
    fn italic_needs_lone_asterisks() {
        assert_eq!(normalize_caption("2 * 3 * 4"), "2 * 3 * 4");
        assert_eq!(normalize_caption("*a* *b*"), "<em>a</em> <em>b</em>");
        assert_eq!(normalize_caption("*unclosed"), "*unclosed");
    }

    #[test]
    fn entities_decoded_last() {
        assert_eq!(normalize_caption("&lt;T&gt; &amp; more"), "<T> & more");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn link_built_before_entity_decoding() {
        assert_eq!(
            normalize_caption("[q](http://x?a=1&amp;b=2)"),
            r#"<a href="http://x?a=1&b=2">q</a>"#
        );
    }

    #[test]
    fn code_span_content_stays_literal() {
        assert_eq!(
            normalize_caption("call `f(**kwargs)` then **done**"),
            "call <code>f(**kwargs)</code> then <strong>done</strong>"
        );
        assert_eq!(normalize_caption("`*ptr*` deref"), "<code>*ptr*</code> deref");
        assert_eq!(
            normalize_caption("`[a](b)` and *c*"),
            "<code>[a](b)</code> and <em>c</em>"
        );
    }

    #[test]
    fn code_spans_survive_a_second_pass() {
        let once = normalize_caption("`*ptr*` and `**kw**` *x*");
        assert_eq!(once, "<code>*ptr*</code> and <code>**kw**</code> <em>x</em>");
        assert_eq!(normalize_caption(&once), once);
    }

    #[test]
    fn captions_inside_text_are_converted() {
        let text = "<summary>**Tip**</summary>\nbody *stays*";
        assert_eq!(
            normalize_captions(text),
            "<summary><strong>Tip</strong></summary>\nbody *stays*"
        );
    }

    #[test]
    fn caption_normalisation_is_idempotent() {
        let once = normalize_captions("<summary>**a** *b* `c`</summary>");
        assert_eq!(normalize_captions(&once), once);
    }
}
