//! Document records and the immutable [`Document`] built from them.
//!
//! A [`DocumentRecord`] mirrors one exported page as the source hands it
//! over: every property is optional because authors leave fields empty.
//! [`Document::from_record`] resolves all fallbacks once, so the pipeline
//! never has to ask "is there a slug?" again.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// Title used when a page has none.
pub const UNTITLED: &str = "Untitled";

/// Category used when a page has none.
pub const DEFAULT_CATEGORY: &str = "General";

/// One exported page, as read from a collection export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentRecord {
    /// Stable page identifier.
    pub id: String,
    pub title: Option<String>,
    pub slug: Option<String>,
    /// Explicit publication date (`YYYY-MM-DD`, or a datetime starting with one).
    pub date: Option<String>,
    /// Source-provided creation timestamp (RFC 3339).
    pub created_time: Option<String>,
    /// Multi-select category path, outermost first.
    pub categories: Option<Vec<String>>,
    /// Multi-select tags.
    pub tags: Option<Vec<String>>,
    /// Single-select tag, used only when `tags` is empty.
    pub tag: Option<String>,
    /// Publish flag. Records explicitly marked `false` are not synced.
    pub published: bool,
    /// Markdown produced by the block converter.
    pub body: String,
}

impl Default for DocumentRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: None,
            slug: None,
            date: None,
            created_time: None,
            categories: None,
            tags: None,
            tag: None,
            published: true,
            body: String::new(),
        }
    }
}

/// A document ready for the normalisation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub date: NaiveDate,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub body: String,
}

impl Document {
    /// Resolve every fallback of `record`.
    ///
    /// `today` is the last link of the date fallback chain
    /// (explicit date → creation timestamp → today).
    pub fn from_record(record: DocumentRecord, today: NaiveDate) -> Self {
        let title = non_blank(record.title.as_deref())
            .unwrap_or(UNTITLED)
            .to_string();

        let slug = non_blank(record.slug.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| slugify(&title));

        let date = record
            .date
            .as_deref()
            .and_then(parse_date)
            .or_else(|| record.created_time.as_deref().and_then(parse_date))
            .unwrap_or(today);

        let categories: Vec<String> = trimmed_list(record.categories.unwrap_or_default());
        let categories = if categories.is_empty() {
            vec![DEFAULT_CATEGORY.to_string()]
        } else {
            categories
        };

        let tags = trimmed_list(record.tags.unwrap_or_default());
        let tags = if tags.is_empty() {
            non_blank(record.tag.as_deref())
                .map(|t| vec![t.to_string()])
                .unwrap_or_default()
        } else {
            tags
        };

        Self {
            id: record.id,
            title,
            slug,
            date,
            categories,
            tags,
            body: record.body,
        }
    }

    /// Category segments joined with `/`, as written to front matter.
    pub fn category_path(&self) -> String {
        self.categories.join("/")
    }
}

/// Lower-case `title` and replace each whitespace run with `-`.
///
/// Non-ASCII letters are kept as-is so titles in any script still yield a
/// readable slug.
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Parse a calendar date from `YYYY-MM-DD`, an RFC 3339 timestamp, or any
/// string that starts with `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn trimmed_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    #[test]
    fn empty_record_uses_all_fallbacks() {
        let doc = Document::from_record(DocumentRecord::default(), today());
        assert_eq!(doc.title, "Untitled");
        assert_eq!(doc.slug, "untitled");
        assert_eq!(doc.date, today());
        assert_eq!(doc.categories, vec!["General"]);
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn slug_derived_from_title() {
        let record = DocumentRecord {
            title: Some("Hello   World".into()),
            ..Default::default()
        };
        let doc = Document::from_record(record, today());
        assert_eq!(doc.slug, "hello-world");
    }

    #[test]
    fn explicit_slug_wins() {
        let record = DocumentRecord {
            title: Some("Hello World".into()),
            slug: Some(" custom-slug ".into()),
            ..Default::default()
        };
        assert_eq!(Document::from_record(record, today()).slug, "custom-slug");
    }

    #[test]
    fn slugify_keeps_non_ascii_letters() {
        assert_eq!(slugify("자바 기본편  정리"), "자바-기본편-정리");
    }

    #[test]
    fn date_falls_back_to_created_time() {
        let record = DocumentRecord {
            date: Some("not a date".into()),
            created_time: Some("2023-03-04T10:20:00.000Z".into()),
            ..Default::default()
        };
        let doc = Document::from_record(record, today());
        assert_eq!(doc.date, NaiveDate::from_ymd_opt(2023, 3, 4).unwrap());
    }

    #[test]
    fn explicit_date_with_time_component() {
        assert_eq!(
            parse_date("2024-01-01T09:00:00.000+09:00"),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(parse_date("2024-01-01"), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(parse_date("soon"), None);
    }

    #[test]
    fn categories_and_tags_are_trimmed() {
        let record = DocumentRecord {
            categories: Some(vec![" JAVA ".into(), "".into(), "Basics".into()]),
            tags: Some(vec![" rust".into()]),
            ..Default::default()
        };
        let doc = Document::from_record(record, today());
        assert_eq!(doc.categories, vec!["JAVA", "Basics"]);
        assert_eq!(doc.category_path(), "JAVA/Basics");
        assert_eq!(doc.tags, vec!["rust"]);
    }

    #[test]
    fn single_select_tag_used_when_no_multi_select() {
        let record = DocumentRecord {
            tags: Some(vec![]),
            tag: Some(" notes ".into()),
            ..Default::default()
        };
        assert_eq!(Document::from_record(record, today()).tags, vec!["notes"]);
    }

    #[test]
    fn record_deserialises_with_missing_fields() {
        let record: DocumentRecord =
            serde_json::from_str(r#"{"id":"p1","title":"T","body":"x"}"#).unwrap();
        assert!(record.published);
        assert_eq!(record.slug, None);

        let hidden: DocumentRecord =
            serde_json::from_str(r#"{"id":"p2","published":false}"#).unwrap();
        assert!(!hidden.published);
    }
}
