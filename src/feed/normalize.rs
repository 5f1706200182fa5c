//! Entry Normalizer
//!
//! Filters parsed entries against the ledger and turns the unseen ones into
//! [`NewEntry`] values, oldest first.
//!
//! Body cleanup, in order:
//! 1. Drop the feed's own `<a href="...">Read More.</a>` anchor
//! 2. Rewrite remaining `<a href="url">text</a>` anchors as `[text](url)`
//! 3. Trim
//! 4. Truncate to [`MAX_BODY_CHARS`] characters plus `...`
//!
//! Truncation runs last so converted link syntax is counted, never cut first.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::models::{FeedDocument, FeedEntry, NewEntry, Renderable};
use crate::utils::{first_tokens, truncate_with_ellipsis};

/// Maximum body length before truncation
pub const MAX_BODY_CHARS: usize = 1000;

/// Category used when the entry has none
pub const DEFAULT_CATEGORY: &str = "General";

static READ_MORE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a href="[^"]*">Read More.</a>"#).unwrap());

static ANCHOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<a\s+href="([^"]+)"\s*>(.*?)</a>"#).unwrap());

/// Select unseen entries and build their renderables, oldest first
///
/// Entries without an identity, or whose identity is in `seen`, are skipped.
/// An identity repeated within the same document is yielded once.
pub fn normalize(document: &FeedDocument, seen: &HashSet<String>) -> Vec<NewEntry> {
    let mut yielded = HashSet::new();
    let mut new_entries = Vec::new();

    for entry in document.entries.iter().rev() {
        let Some(identity) = entry.identity() else {
            tracing::debug!(title = %entry.title, "Skipping entry without publication date");
            continue;
        };
        if seen.contains(identity) || !yielded.insert(identity) {
            continue;
        }

        new_entries.push(NewEntry {
            identity: identity.to_string(),
            renderable: render(entry, document.image_url.as_deref()),
        });
    }

    new_entries
}

/// Build the delivery-ready form of one entry
pub fn render(entry: &FeedEntry, thumbnail_url: Option<&str>) -> Renderable {
    Renderable {
        title: entry.title.clone(),
        link: entry.link.clone(),
        published: short_date(entry.published_at.as_deref().unwrap_or_default()),
        category: entry
            .category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string(),
        body: clean_body(&entry.body_raw),
        thumbnail_url: thumbnail_url.map(str::to_string),
    }
}

/// Display date: the first four tokens of the raw publication string
///
/// `"Mon, 03 Feb 2025 19:00:00 +0000"` becomes `"Mon, 03 Feb 2025"`.
pub fn short_date(raw: &str) -> String {
    first_tokens(raw, 4)
}

/// Strip the read-more anchor, convert anchors to text links, trim, truncate
pub fn clean_body(raw: &str) -> String {
    let without_read_more = READ_MORE_REGEX.replace_all(raw, "");
    let converted = ANCHOR_REGEX.replace_all(&without_read_more, "[$2]($1)");
    truncate_with_ellipsis(converted.trim(), MAX_BODY_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, published_at: Option<&str>) -> FeedEntry {
        FeedEntry {
            title: title.to_string(),
            body_raw: format!("{title} body"),
            link: format!("https://example.com/{title}"),
            category: None,
            published_at: published_at.map(str::to_string),
            guid: None,
        }
    }

    fn document(entries: Vec<FeedEntry>) -> FeedDocument {
        FeedDocument {
            entries,
            image_url: Some("https://example.com/logo.png".to_string()),
        }
    }

    #[test]
    fn test_anchor_conversion() {
        assert_eq!(
            clean_body(r#"click <a href="https://x/y">here</a> now"#),
            "click [here](https://x/y) now"
        );
        assert_eq!(
            clean_body(r#"<A HREF="https://a">one</A> and <a  href="https://b" >two</a>"#),
            "[one](https://a) and [two](https://b)"
        );
    }

    #[test]
    fn test_read_more_anchor_removed() {
        let raw = r#"New league announced. <a href="https://www.pathofexile.com/forum/view-thread/1">Read More.</a>"#;
        assert_eq!(clean_body(raw), "New league announced.");
    }

    #[test]
    fn test_read_more_removal_keeps_earlier_anchors() {
        let raw = r#"See <a href="https://a/notes">patch notes</a> for details. <a href="https://b/thread">Read More.</a>"#;
        assert_eq!(clean_body(raw), "See [patch notes](https://a/notes) for details.");
    }

    #[test]
    fn test_truncation_boundaries() {
        let long = "a".repeat(1050);
        let body = clean_body(&long);
        assert_eq!(body.chars().count(), MAX_BODY_CHARS + 3);
        assert!(body.ends_with("..."));
        assert_eq!(&body[..MAX_BODY_CHARS], &long[..MAX_BODY_CHARS]);

        let short = "a".repeat(999);
        assert_eq!(clean_body(&short), short);
    }

    #[test]
    fn test_truncation_after_conversion() {
        let raw = format!(r#"{}<a href="https://x/y">here</a>"#, "a".repeat(990));
        let body = clean_body(&raw);
        assert!(body.starts_with(&format!("{}[here](", "a".repeat(990))));
        assert!(body.ends_with("..."));
    }

    #[test]
    fn test_oldest_first_and_skips() {
        let doc = document(vec![
            entry("newest", Some("Wed, 05 Feb 2025 10:00:00 +0000")),
            entry("undated", None),
            entry("seen", Some("Tue, 04 Feb 2025 10:00:00 +0000")),
            entry("oldest", Some("Mon, 03 Feb 2025 10:00:00 +0000")),
        ]);
        let seen = HashSet::from(["Tue, 04 Feb 2025 10:00:00 +0000".to_string()]);

        let new_entries = normalize(&doc, &seen);
        let titles: Vec<_> = new_entries
            .iter()
            .map(|e| e.renderable.title.as_str())
            .collect();
        assert_eq!(titles, vec!["oldest", "newest"]);
        assert_eq!(new_entries[0].identity, "Mon, 03 Feb 2025 10:00:00 +0000");
    }

    #[test]
    fn test_duplicate_identity_in_one_document() {
        let doc = document(vec![
            entry("b", Some("Mon, 03 Feb 2025 10:00:00 +0000")),
            entry("a", Some("Mon, 03 Feb 2025 10:00:00 +0000")),
        ]);
        assert_eq!(normalize(&doc, &HashSet::new()).len(), 1);
    }

    #[test]
    fn test_renderable_fields() {
        let mut item = entry("Patch", Some("Mon, 03 Feb 2025 19:00:00 +0000"));
        item.category = Some("  ".to_string());

        let renderable = render(&item, Some("https://example.com/logo.png"));
        assert_eq!(renderable.published, "Mon, 03 Feb 2025");
        assert_eq!(renderable.category, DEFAULT_CATEGORY);
        assert_eq!(
            renderable.thumbnail_url.as_deref(),
            Some("https://example.com/logo.png")
        );

        item.category = Some("Announcements".to_string());
        assert_eq!(render(&item, None).category, "Announcements");
    }
}
