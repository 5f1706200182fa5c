//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use feedcast::delivery::{DeliveryGateway, DestinationHandle, FanoutDispatcher};
use feedcast::feed::FeedFetcher;
use feedcast::models::{OutgoingMessage, TenantConfig};
use feedcast::relay::Relay;
use feedcast::storage::{DeliveryLedger, TenantMap, TenantStore};
use feedcast::utils::error::{NotifyError, SendError};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const FEED_PATH: &str = "/news/rss";

// ============================================================================
// Fixtures
// ============================================================================

/// One `<item>` of a test feed
pub struct Item {
    pub title: &'static str,
    pub pub_date: Option<&'static str>,
    pub category: Option<&'static str>,
}

impl Item {
    pub fn new(title: &'static str, pub_date: &'static str) -> Self {
        Self {
            title,
            pub_date: Some(pub_date),
            category: Some("Announcements"),
        }
    }

    pub fn undated(title: &'static str) -> Self {
        Self {
            title,
            pub_date: None,
            category: None,
        }
    }
}

/// Build an RSS document; items are given newest first, as feeds list them
pub fn rss_feed(items: &[Item]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>News</title>
<image><url>https://example.com/logo.png</url></image>
"#,
    );

    for (i, item) in items.iter().enumerate() {
        xml.push_str("<item>");
        xml.push_str(&format!("<title>{}</title>", item.title));
        xml.push_str(&format!(
            "<link>https://example.com/forum/view-thread/{i}</link>"
        ));
        xml.push_str(&format!(
            "<description><![CDATA[Body of {}]]></description>",
            item.title
        ));
        if let Some(category) = item.category {
            xml.push_str(&format!("<category>{category}</category>"));
        }
        if let Some(date) = item.pub_date {
            xml.push_str(&format!("<pubDate>{date}</pubDate>"));
        }
        xml.push_str("</item>\n");
    }

    xml.push_str("</channel></rss>");
    xml
}

/// Secondary feed of status links, newest first
pub fn status_feed(ids: &[&str]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0"?><rss version="2.0"><channel>"#);
    for id in ids {
        xml.push_str(&format!(
            "<item><title>post {id}</title><link>https://nitter.example/poe/status/{id}#m</link><guid>https://nitter.example/poe/status/{id}#m</guid><pubDate>Mon, 03 Feb 2025 19:00:00 +0000</pubDate></item>"
        ));
    }
    xml.push_str("</channel></rss>");
    xml
}

pub async fn mount_feed(server: &MockServer, feed_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(feed_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

// ============================================================================
// Recording Gateway
// ============================================================================

/// In-memory gateway that records every call
#[derive(Default)]
pub struct RecordingGateway {
    /// Destinations whose resolution fails
    pub missing: HashSet<String>,

    /// Destinations whose sends fail
    pub failing: HashSet<String>,

    pub sent: Mutex<Vec<(String, OutgoingMessage)>>,
    pub notified: Mutex<Vec<(String, String)>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing(mut self, destination: &str) -> Self {
        self.missing.insert(destination.to_string());
        self
    }

    pub fn with_failing(mut self, destination: &str) -> Self {
        self.failing.insert(destination.to_string());
        self
    }

    pub fn sent(&self) -> Vec<(String, OutgoingMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, destination: &str) -> Vec<OutgoingMessage> {
        self.sent()
            .into_iter()
            .filter(|(id, _)| id == destination)
            .map(|(_, message)| message)
            .collect()
    }

    pub fn sent_titles(&self, destination: &str) -> Vec<String> {
        self.sent_to(destination)
            .into_iter()
            .filter_map(|message| message.renderable.map(|r| r.title))
            .collect()
    }

    pub fn notified(&self) -> Vec<(String, String)> {
        self.notified.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryGateway for RecordingGateway {
    fn name(&self) -> &str {
        "recording"
    }

    async fn resolve_destination(&self, destination_id: &str) -> Result<DestinationHandle, SendError> {
        if self.missing.contains(destination_id) {
            return Err(SendError::DestinationUnavailable(destination_id.to_string()));
        }
        Ok(DestinationHandle::new(destination_id, destination_id))
    }

    async fn send(
        &self,
        destination: &DestinationHandle,
        message: &OutgoingMessage,
    ) -> Result<(), SendError> {
        if self.failing.contains(&destination.id) {
            return Err(SendError::TransportFailure("connection reset".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination.id.clone(), message.clone()));
        Ok(())
    }

    async fn notify_owner(&self, tenant_id: &str, message: &str) -> Result<(), NotifyError> {
        self.notified
            .lock()
            .unwrap()
            .push((tenant_id.to_string(), message.to_string()));
        Ok(())
    }
}

// ============================================================================
// Relay Harness
// ============================================================================

/// A relay wired to a mock feed server and a scratch data directory
pub struct Harness {
    pub server: MockServer,
    pub dir: TempDir,
    pub gateway: Arc<RecordingGateway>,
}

impl Harness {
    pub async fn start(gateway: RecordingGateway) -> Self {
        Self {
            server: MockServer::start().await,
            dir: TempDir::new().unwrap(),
            gateway: Arc::new(gateway),
        }
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.dir.path().join("posted_news.json")
    }

    pub fn tenants_path(&self) -> PathBuf {
        self.dir.path().join("tenants.json")
    }

    pub fn feed_url(&self, feed_path: &str) -> String {
        format!("{}{}", self.server.uri(), feed_path)
    }

    pub fn tenant_store(&self) -> TenantStore {
        TenantStore::new(self.tenants_path())
    }

    pub async fn set_tenants(&self, tenants: &[(&str, TenantConfig)]) {
        let map: TenantMap = tenants
            .iter()
            .map(|(id, config)| (id.to_string(), config.clone()))
            .collect();
        self.tenant_store().save(&map).await.unwrap();
    }

    /// Build a fresh relay, as a restarted process would
    pub async fn relay(&self) -> Relay {
        let fetcher = FeedFetcher::with_url(&self.feed_url(FEED_PATH), Duration::from_secs(5))
            .unwrap()
            .with_user_agent("feedcast-test");
        let dispatcher = FanoutDispatcher::new(self.gateway.clone())
            .with_call_timeout(Duration::from_secs(2));

        Relay::new(
            self.tenant_store(),
            DeliveryLedger::open(self.ledger_path()).await.unwrap(),
            fetcher,
            dispatcher,
        )
    }
}
