// Core data structures for the feedcast relay

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Feature flag that opts a tenant into the secondary content stream
pub const SECONDARY_STREAM_FLAG: &str = "secondary_stream";

/// One item from the upstream feed, as produced by a feed parser
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub body_raw: String,
    pub link: String,
    pub category: Option<String>,
    pub published_at: Option<String>, // raw publication string, e.g. "Mon, 03 Feb 2025 19:00:00 +0000"
    pub guid: Option<String>,
}

impl FeedEntry {
    /// Stable dedup key: the raw publication string, used verbatim
    ///
    /// Entries without one never participate in delivery.
    pub fn identity(&self) -> Option<&str> {
        self.published_at
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
    }
}

/// A parsed feed: entries in feed order plus channel-level metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedDocument {
    /// Entries as they appear in the feed (newest first for typical RSS)
    pub entries: Vec<FeedEntry>,

    /// Channel-wide image, reused as thumbnail for every entry
    pub image_url: Option<String>,
}

/// Ledger row for a delivered entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub identity: String,
    pub title: String,
    pub link: String,
}

impl DeliveryRecord {
    /// Build the ledger row for a new entry
    pub fn from_entry(entry: &NewEntry) -> Self {
        Self {
            identity: entry.identity.clone(),
            title: entry.renderable.title.clone(),
            link: entry.renderable.link.clone(),
        }
    }
}

/// Per-tenant delivery configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantConfig {
    /// Opaque handle the delivery gateway resolves to an endpoint
    #[serde(default)]
    pub destination_id: String,

    /// Prefix prepended to deliveries; empty means no tag
    #[serde(default)]
    pub tag: String,

    /// Named boolean toggles; absent means false
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
}

impl TenantConfig {
    /// Create a config pointing at a destination
    pub fn with_destination(destination_id: impl Into<String>) -> Self {
        Self {
            destination_id: destination_id.into(),
            ..Default::default()
        }
    }

    /// Whether a destination has been configured
    pub fn has_destination(&self) -> bool {
        !self.destination_id.trim().is_empty()
    }

    /// Read a feature flag, defaulting to false
    pub fn feature(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }

    /// Tag as an optional prefix
    pub fn tag(&self) -> Option<&str> {
        let tag = self.tag.trim();
        (!tag.is_empty()).then_some(tag)
    }
}

/// Delivery-ready representation of a feed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Renderable {
    pub title: String,
    pub link: String,
    pub published: String, // short display date, e.g. "Mon, 03 Feb 2025"
    pub category: String,
    pub body: String,
    pub thumbnail_url: Option<String>,
}

/// An unseen entry ready for fan-out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub identity: String,
    pub renderable: Renderable,
}

/// Message handed to the delivery gateway for one tenant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    pub text: Option<String>,
    pub renderable: Option<Renderable>,
}

impl OutgoingMessage {
    /// Rich message carrying a rendered entry
    pub fn rich(renderable: Renderable) -> Self {
        Self {
            text: None,
            renderable: Some(renderable),
        }
    }

    /// Plain text message
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            renderable: None,
        }
    }

    /// Prefix the message with a tenant tag, if one is set
    pub fn tagged(&self, tag: Option<&str>) -> Self {
        let Some(tag) = tag else {
            return self.clone();
        };

        let text = match &self.text {
            Some(text) => format!("{tag} {text}"),
            None => tag.to_string(),
        };

        Self {
            text: Some(text),
            renderable: self.renderable.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_identity_requires_publication_string() {
        let mut entry = FeedEntry {
            title: "Patch notes".to_string(),
            ..Default::default()
        };
        assert_eq!(entry.identity(), None);

        entry.published_at = Some("   ".to_string());
        assert_eq!(entry.identity(), None);

        entry.published_at = Some("Mon, 03 Feb 2025 19:00:00 +0000".to_string());
        assert_eq!(entry.identity(), Some("Mon, 03 Feb 2025 19:00:00 +0000"));
    }

    #[test]
    fn test_tenant_config_defaults() {
        let config = TenantConfig::with_destination("news-channel");
        assert!(config.has_destination());
        assert_eq!(config.tag(), None);
        assert!(!config.feature(SECONDARY_STREAM_FLAG));

        assert!(!TenantConfig::default().has_destination());
    }

    #[test]
    fn test_outgoing_message_tagging() {
        let plain = OutgoingMessage::text("https://example.com/status/1");
        assert_eq!(plain.tagged(None), plain);
        assert_eq!(
            plain.tagged(Some("@news")).text.as_deref(),
            Some("@news https://example.com/status/1")
        );

        let renderable = Renderable {
            title: "t".to_string(),
            link: "l".to_string(),
            published: "p".to_string(),
            category: "General".to_string(),
            body: "b".to_string(),
            thumbnail_url: None,
        };
        let tagged = OutgoingMessage::rich(renderable.clone()).tagged(Some("@here"));
        assert_eq!(tagged.text.as_deref(), Some("@here"));
        assert_eq!(tagged.renderable, Some(renderable));
    }

    #[test]
    fn test_tenant_config_serde_defaults() {
        let config: TenantConfig = serde_json::from_str(r#"{"destination_id":"abc"}"#).unwrap();
        assert_eq!(config.destination_id, "abc");
        assert!(config.tag.is_empty());
        assert!(config.features.is_empty());
    }
}
