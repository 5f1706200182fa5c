//! Upstream feed fetcher
//!
//! One GET per call, no retries: a missed poll is picked up by the next cycle.
//! Features:
//! - Browser User-Agent (configured, or picked from a pool per request)
//! - XML `Accept` header
//! - Challenge-page detection, reported as [`FetchError::Blocked`]
//! - Bare-ampersand repair so strict XML readers accept the payload

use rand::seq::SliceRandom;
use reqwest::Client;
use std::time::Duration;

use super::headers::{build_feed_headers, BROWSER_USER_AGENTS};
use crate::config::FeedConfig;
use crate::utils::error::FetchError;

/// Body markers that identify an HTML challenge page instead of feed markup
const BLOCK_MARKERS: &[&str] = &["<html", "Cloudflare"];

/// Entity names accepted as already escaped
const NAMED_ENTITIES: &[&str] = &["amp", "lt", "gt", "quot", "apos"];

const CDATA_START: &str = "<![CDATA[";
const CDATA_END: &str = "]]>";

/// Fetches the raw feed payload from a single fixed URL
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    /// HTTP client with the request timeout applied
    client: Client,

    /// Feed URL
    url: String,

    /// Fixed User-Agent; `None` rotates through [`BROWSER_USER_AGENTS`]
    user_agent: Option<String>,
}

impl FeedFetcher {
    /// Create a fetcher from the `[feed]` config section
    pub fn new(config: &FeedConfig) -> Result<Self, FetchError> {
        let mut fetcher = Self::with_url(
            &config.url,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        fetcher.user_agent = config.user_agent.clone();
        Ok(fetcher)
    }

    /// Create a fetcher for an arbitrary URL (used for the secondary stream and mock servers)
    pub fn with_url(url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .cookie_store(true)
            .build()
            .map_err(FetchError::network)?;

        Ok(Self {
            client,
            url: url.to_string(),
            user_agent: None,
        })
    }

    /// Use a fixed User-Agent instead of rotating
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Feed URL this fetcher targets
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Retrieve the feed and return payload ready for an XML parser
    ///
    /// # Errors
    ///
    /// - [`FetchError::Blocked`] when the body is a challenge page
    /// - [`FetchError::Network`] on transport failure, timeout, or non-2xx status
    pub async fn fetch(&self) -> Result<String, FetchError> {
        let headers = build_feed_headers(self.user_agent());

        tracing::debug!(url = %self.url, "Fetching feed");
        let response = self.client.get(&self.url).headers(headers).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if is_blocked(&body) {
            tracing::warn!(url = %self.url, status = %status, "Feed request blocked by challenge page");
            return Err(FetchError::Blocked(format!(
                "challenge page returned with status {status}"
            )));
        }

        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP status {status}")));
        }

        tracing::debug!(url = %self.url, bytes = body.len(), "Feed fetched");
        Ok(repair_ampersands(&body))
    }

    fn user_agent(&self) -> &str {
        match &self.user_agent {
            Some(agent) => agent,
            None => {
                let mut rng = rand::thread_rng();
                BROWSER_USER_AGENTS
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or(BROWSER_USER_AGENTS[0])
            }
        }
    }
}

/// Heuristic check for an HTML challenge page
pub fn is_blocked(body: &str) -> bool {
    BLOCK_MARKERS.iter().any(|marker| body.contains(marker))
}

/// Escape every `&` that does not start a recognized entity reference
///
/// Recognized: `&amp;` `&lt;` `&gt;` `&quot;` `&apos;` and numeric references
/// (`&#38;`, `&#x26;`). CDATA sections are copied through unchanged.
pub fn repair_ampersands(payload: &str) -> String {
    let mut repaired = String::with_capacity(payload.len());
    let mut rest = payload;

    while let Some(start) = rest.find(CDATA_START) {
        repair_markup(&rest[..start], &mut repaired);

        let section = &rest[start..];
        // unterminated sections run to the end; the parser reports them
        let end = section
            .find(CDATA_END)
            .map_or(section.len(), |pos| pos + CDATA_END.len());
        repaired.push_str(&section[..end]);
        rest = &section[end..];
    }
    repair_markup(rest, &mut repaired);

    repaired
}

fn repair_markup(markup: &str, repaired: &mut String) {
    let mut rest = markup;

    while let Some(pos) = rest.find('&') {
        repaired.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if starts_with_entity(after) {
            repaired.push('&');
        } else {
            repaired.push_str("&amp;");
        }
        rest = after;
    }
    repaired.push_str(rest);
}

fn starts_with_entity(after_ampersand: &str) -> bool {
    let Some(end) = after_ampersand.find(';') else {
        return false;
    };
    let name = &after_ampersand[..end];

    if NAMED_ENTITIES.contains(&name) {
        return true;
    }

    match name.strip_prefix('#') {
        Some(hex) if hex.starts_with(['x', 'X']) => {
            hex.len() > 1 && hex[1..].chars().all(|c| c.is_ascii_hexdigit())
        }
        Some(dec) => !dec.is_empty() && dec.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}
