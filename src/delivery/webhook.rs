//! Webhook delivery gateway
//!
//! Delivers entries as chat-webhook JSON payloads (Discord-compatible embeds).
//!
//! # Destination resolution
//!
//! A tenant's destination id is either a key of `[delivery.destinations]` or a
//! literal `http(s)` webhook URL. Anything else resolves to
//! [`SendError::DestinationUnavailable`].
//!
//! # Payload Format
//!
//! ```json
//! {
//!   "content": "@news",
//!   "embeds": [{
//!     "title": "Patch 3.25.3",
//!     "url": "https://www.pathofexile.com/forum/view-thread/2",
//!     "description": "Fixes [here](https://x/y)\n\n[Read More](https://www.pathofexile.com/forum/view-thread/2)",
//!     "color": 15548997,
//!     "fields": [
//!       {"name": "📅 Published", "value": "Tue, 04 Feb 2025", "inline": true},
//!       {"name": "📂 Category", "value": "Announcements", "inline": true}
//!     ],
//!     "thumbnail": {"url": "https://web.poecdn.com/image/logo.png"}
//!   }]
//! }
//! ```
//!
//! Text-only messages (secondary stream) send just `content`. Requests are
//! bounded by `delivery.timeout_secs` and never retried.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use url::Url;

use super::gateway::{DeliveryGateway, DestinationHandle};
use crate::config::DeliveryConfig;
use crate::error::Result;
use crate::models::{OutgoingMessage, Renderable};
use crate::utils::error::{NotifyError, SendError};

/// Embed accent color
pub const EMBED_COLOR: u32 = 0xED4245;

/// Webhook-backed delivery gateway
#[derive(Debug, Clone)]
pub struct WebhookGateway {
    client: Client,
    destinations: BTreeMap<String, String>,
    owners: BTreeMap<String, String>,
}

impl WebhookGateway {
    /// Create a gateway from the `[delivery]` config section
    pub fn new(config: &DeliveryConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            destinations: config.destinations.clone(),
            owners: config.owners.clone(),
        })
    }

    /// Register a named destination
    pub fn with_destination(mut self, id: impl Into<String>, url: impl Into<String>) -> Self {
        self.destinations.insert(id.into(), url.into());
        self
    }

    /// Register an owner webhook for a tenant
    pub fn with_owner(mut self, tenant_id: impl Into<String>, url: impl Into<String>) -> Self {
        self.owners.insert(tenant_id.into(), url.into());
        self
    }

    /// Build the JSON body for a message
    pub fn build_payload(message: &OutgoingMessage) -> Value {
        let mut payload = serde_json::Map::new();

        if let Some(text) = &message.text {
            payload.insert("content".to_string(), json!(text));
        }
        if let Some(renderable) = &message.renderable {
            payload.insert("embeds".to_string(), json!([Self::build_embed(renderable)]));
        }

        Value::Object(payload)
    }

    fn build_embed(renderable: &Renderable) -> Value {
        let mut embed = json!({
            "title": renderable.title,
            "url": renderable.link,
            "description": format!("{}\n\n[Read More]({})", renderable.body, renderable.link),
            "color": EMBED_COLOR,
            "fields": [
                {"name": "📅 Published", "value": renderable.published, "inline": true},
                {"name": "📂 Category", "value": renderable.category, "inline": true},
            ],
        });

        if let Some(thumbnail) = &renderable.thumbnail_url {
            embed["thumbnail"] = json!({ "url": thumbnail });
        }

        embed
    }

    async fn post(&self, url: &str, payload: &Value) -> std::result::Result<(), PostFailure> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| PostFailure::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        Err(PostFailure::Status(status, body))
    }
}

enum PostFailure {
    Transport(String),
    Status(StatusCode, String),
}

fn destination_gone(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND
        || status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
}

fn is_webhook_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[async_trait]
impl DeliveryGateway for WebhookGateway {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn resolve_destination(
        &self,
        destination_id: &str,
    ) -> std::result::Result<DestinationHandle, SendError> {
        if let Some(url) = self.destinations.get(destination_id) {
            return Ok(DestinationHandle::new(destination_id, url));
        }
        if is_webhook_url(destination_id) {
            return Ok(DestinationHandle::new(destination_id, destination_id));
        }

        Err(SendError::DestinationUnavailable(format!(
            "unknown destination '{destination_id}'"
        )))
    }

    async fn send(
        &self,
        destination: &DestinationHandle,
        message: &OutgoingMessage,
    ) -> std::result::Result<(), SendError> {
        let payload = Self::build_payload(message);

        match self.post(&destination.endpoint, &payload).await {
            Ok(()) => {
                tracing::debug!(destination = %destination, "Webhook delivered");
                Ok(())
            }
            // deleted or revoked webhook
            Err(PostFailure::Status(status, body)) if destination_gone(status) => Err(
                SendError::DestinationUnavailable(format!("HTTP {status}: {body}")),
            ),
            Err(PostFailure::Status(status, body)) => {
                Err(SendError::TransportFailure(format!("HTTP {status}: {body}")))
            }
            Err(PostFailure::Transport(reason)) => Err(SendError::TransportFailure(reason)),
        }
    }

    async fn notify_owner(
        &self,
        tenant_id: &str,
        message: &str,
    ) -> std::result::Result<(), NotifyError> {
        let url = self
            .owners
            .get(tenant_id)
            .ok_or_else(|| NotifyError::NoOwner(tenant_id.to_string()))?;

        match self.post(url, &json!({ "content": message })).await {
            Ok(()) => Ok(()),
            Err(PostFailure::Status(status, body)) => Err(NotifyError::TransportFailure(format!(
                "HTTP {status}: {body}"
            ))),
            Err(PostFailure::Transport(reason)) => Err(NotifyError::TransportFailure(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderable() -> Renderable {
        Renderable {
            title: "Patch 3.25.3".to_string(),
            link: "https://www.pathofexile.com/forum/view-thread/2".to_string(),
            published: "Tue, 04 Feb 2025".to_string(),
            category: "Announcements".to_string(),
            body: "Fixes".to_string(),
            thumbnail_url: Some("https://example.com/logo.png".to_string()),
        }
    }

    fn gateway() -> WebhookGateway {
        WebhookGateway::new(&DeliveryConfig::default())
            .unwrap()
            .with_destination("news", "https://hooks.example.com/news")
    }

    #[test]
    fn test_rich_payload() {
        let payload = WebhookGateway::build_payload(&OutgoingMessage::rich(renderable()));

        assert!(payload.get("content").is_none());
        let embed = &payload["embeds"][0];
        assert_eq!(embed["title"], "Patch 3.25.3");
        assert_eq!(
            embed["description"],
            "Fixes\n\n[Read More](https://www.pathofexile.com/forum/view-thread/2)"
        );
        assert_eq!(embed["fields"][0]["value"], "Tue, 04 Feb 2025");
        assert_eq!(embed["fields"][1]["value"], "Announcements");
        assert_eq!(embed["thumbnail"]["url"], "https://example.com/logo.png");
        assert_eq!(embed["color"], EMBED_COLOR);
    }

    #[test]
    fn test_tagged_and_text_payloads() {
        let tagged = OutgoingMessage::rich(renderable()).tagged(Some("@news"));
        let payload = WebhookGateway::build_payload(&tagged);
        assert_eq!(payload["content"], "@news");
        assert!(payload["embeds"].is_array());

        let payload = WebhookGateway::build_payload(&OutgoingMessage::text("https://x/status/1"));
        assert_eq!(payload["content"], "https://x/status/1");
        assert!(payload.get("embeds").is_none());
    }

    #[test]
    fn test_embed_without_thumbnail() {
        let mut item = renderable();
        item.thumbnail_url = None;
        let payload = WebhookGateway::build_payload(&OutgoingMessage::rich(item));
        assert!(payload["embeds"][0].get("thumbnail").is_none());
    }

    #[tokio::test]
    async fn test_resolve_destination() {
        let gateway = gateway();

        let handle = gateway.resolve_destination("news").await.unwrap();
        assert_eq!(handle.endpoint, "https://hooks.example.com/news");

        let handle = gateway
            .resolve_destination("https://hooks.example.com/direct")
            .await
            .unwrap();
        assert_eq!(handle.endpoint, "https://hooks.example.com/direct");

        assert!(matches!(
            gateway.resolve_destination("123456789").await,
            Err(SendError::DestinationUnavailable(_))
        ));
        assert!(matches!(
            gateway.resolve_destination("ftp://files.example.com").await,
            Err(SendError::DestinationUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_notify_owner_without_contact() {
        let err = gateway().notify_owner("guild-1", "hello").await.unwrap_err();
        assert!(matches!(err, NotifyError::NoOwner(id) if id == "guild-1"));
    }
}
