use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};

/// Accept header value for feed requests
pub const FEED_ACCEPT: &str = "application/xml, text/xml";

/// Pool of browser User-Agent strings; some feed providers reject default client signatures
pub const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Build browser-like headers for a feed request
///
/// An invalid user agent (e.g. containing control characters) falls back to
/// the first entry of [`BROWSER_USER_AGENTS`].
///
/// # Examples
///
/// ```
/// use feedcast::feed::headers::build_feed_headers;
///
/// let headers = build_feed_headers("Mozilla/5.0 (X11; Linux x86_64)");
/// assert_eq!(headers["accept"], "application/xml, text/xml");
/// ```
pub fn build_feed_headers(user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let user_agent = HeaderValue::from_str(user_agent)
        .unwrap_or_else(|_| HeaderValue::from_static(BROWSER_USER_AGENTS[0]));
    headers.insert(USER_AGENT, user_agent);
    headers.insert(ACCEPT, HeaderValue::from_static(FEED_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    headers
}
