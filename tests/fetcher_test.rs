//! Integration tests for FeedFetcher using wiremock
//!
//! These tests validate the fetcher's behavior with mock servers.

use feedcast::config::FeedConfig;
use feedcast::feed::normalize::clean_body;
use feedcast::feed::{FeedFetcher, FeedParser, RssParser};
use feedcast::utils::error::FetchError;
use std::time::Duration;
use wiremock::matchers::{header, header_exists, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
<item><title>Dungeons & Dragons & more</title><link>https://example.com/1</link><pubDate>Mon, 03 Feb 2025 19:00:00 +0000</pubDate></item>
</channel></rss>"#;

fn fetcher(server: &MockServer) -> FeedFetcher {
    FeedFetcher::with_url(&format!("{}/news/rss", server.uri()), Duration::from_secs(5)).unwrap()
}

/// Test successful fetch from mock server
#[tokio::test]
async fn test_fetch_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news/rss"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = fetcher(&mock_server).fetch().await;

    assert!(result.is_ok(), "Fetch should succeed: {:?}", result.err());
    assert!(result.unwrap().contains("<rss"));
}

/// Test that the repaired payload parses
#[tokio::test]
async fn test_bare_ampersands_repaired() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news/rss"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
        .mount(&mock_server)
        .await;

    let payload = fetcher(&mock_server).fetch().await.unwrap();
    assert!(payload.contains("Dungeons &amp; Dragons &amp; more"));

    let document = RssParser::new().parse(&payload).unwrap();
    assert_eq!(document.entries[0].title, "Dungeons & Dragons & more");
}

/// Test that query strings inside CDATA descriptions survive repair
#[tokio::test]
async fn test_cdata_links_untouched() {
    let mock_server = MockServer::start().await;
    let feed = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
<item><title>Q&A</title><description><![CDATA[Go <a href="https://x/y?a=1&b=2">here</a>]]></description><pubDate>Mon, 03 Feb 2025 19:00:00 +0000</pubDate></item>
</channel></rss>"#;

    Mock::given(method("GET"))
        .and(path("/news/rss"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed))
        .mount(&mock_server)
        .await;

    let payload = fetcher(&mock_server).fetch().await.unwrap();
    let document = RssParser::new().parse(&payload).unwrap();
    let entry = &document.entries[0];

    assert_eq!(entry.title, "Q&A");
    assert_eq!(clean_body(&entry.body_raw), "Go [here](https://x/y?a=1&b=2)");
}

/// Test that feed requests carry browser-like headers
#[tokio::test]
async fn test_request_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news/rss"))
        .and(header_regex("accept", "^application/xml"))
        .and(header("user-agent", "feedcast-test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = fetcher(&mock_server)
        .with_user_agent("feedcast-test/1.0")
        .fetch()
        .await;

    assert!(result.is_ok(), "Headers should match: {:?}", result.err());
}

/// Test that a rotated User-Agent is always sent when none is configured
#[tokio::test]
async fn test_rotating_user_agent_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news/rss"))
        .and(header_exists("user-agent"))
        .and(header_exists("accept-language"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
        .expect(2)
        .mount(&mock_server)
        .await;

    let fetcher = fetcher(&mock_server);
    fetcher.fetch().await.unwrap();
    fetcher.fetch().await.unwrap();
}

/// Test configured fetcher picks up the URL and User-Agent
#[tokio::test]
async fn test_fetcher_from_config() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feed"))
        .and(header("user-agent", "configured-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = FeedConfig {
        url: format!("{}/feed", mock_server.uri()),
        user_agent: Some("configured-agent".to_string()),
        request_timeout_secs: 5,
    };

    let fetcher = FeedFetcher::new(&config).unwrap();
    assert!(fetcher.fetch().await.is_ok());
}

/// Test server errors surface as network errors, with no retry
#[tokio::test]
async fn test_server_error_no_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news/rss"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = fetcher(&mock_server).fetch().await;

    assert!(matches!(result, Err(FetchError::Network(_))));
}

/// Test challenge page detection
#[tokio::test]
async fn test_challenge_page_blocked() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news/rss"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_string("<!DOCTYPE html><html><body>Checking your browser - Cloudflare</body></html>"),
        )
        .mount(&mock_server)
        .await;

    let result = fetcher(&mock_server).fetch().await;

    assert!(matches!(result, Err(FetchError::Blocked(_))));
}

/// Test that a challenge page served with 200 is still blocked
#[tokio::test]
async fn test_challenge_page_with_success_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news/rss"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Attention Required!</html>"))
        .mount(&mock_server)
        .await;

    let result = fetcher(&mock_server).fetch().await;

    assert!(matches!(result, Err(FetchError::Blocked(_))));
}

/// Test request timeout
#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news/rss"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(FEED)
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let fetcher = FeedFetcher::with_url(
        &format!("{}/news/rss", mock_server.uri()),
        Duration::from_millis(200),
    )
    .unwrap();

    let result = fetcher.fetch().await;

    assert!(matches!(result, Err(FetchError::Network(_))));
}

/// Test connection refused
#[tokio::test]
async fn test_connection_refused() {
    let fetcher =
        FeedFetcher::with_url("http://127.0.0.1:1/news/rss", Duration::from_secs(1)).unwrap();

    let result = fetcher.fetch().await;

    assert!(matches!(result, Err(FetchError::Network(_))));
}
