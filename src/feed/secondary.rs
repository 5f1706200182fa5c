//! Secondary content stream
//!
//! A second feed (social posts mirrored to RSS) whose entries are delivered as
//! plain links to tenants with the `secondary_stream` feature. Entries are keyed
//! by the numeric provider id after `status/` in their guid, e.g.
//! `https://nitter.example/pathofexile/status/1887000000000000001#m`.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::models::{FeedDocument, OutgoingMessage};

/// Placeholder replaced by the provider id in the link template
pub const ID_PLACEHOLDER: &str = "{id}";

static STATUS_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"status/(\d+)").unwrap());

/// An unseen secondary-stream post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryPost {
    /// Provider id, the dedup key
    pub id: String,

    /// Link delivered to tenants
    pub link: String,
}

impl SecondaryPost {
    /// Text-only message carrying the link
    pub fn message(&self) -> OutgoingMessage {
        OutgoingMessage::text(&self.link)
    }
}

/// Extract the provider id from a guid
pub fn extract_status_id(guid: &str) -> Option<String> {
    STATUS_ID_REGEX
        .captures(guid)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
}

/// Substitute the provider id into the link template
pub fn render_link(template: &str, id: &str) -> String {
    template.replace(ID_PLACEHOLDER, id)
}

/// Unseen posts, oldest first
///
/// Entries whose guid carries no provider id are skipped.
pub fn unseen_posts(
    document: &FeedDocument,
    seen: &HashSet<String>,
    link_template: &str,
) -> Vec<SecondaryPost> {
    let mut yielded = HashSet::new();

    document
        .entries
        .iter()
        .rev()
        .filter_map(|entry| entry.guid.as_deref().and_then(extract_status_id))
        .filter(|id| !seen.contains(id) && yielded.insert(id.clone()))
        .map(|id| SecondaryPost {
            link: render_link(link_template, &id),
            id,
        })
        .collect()
}
