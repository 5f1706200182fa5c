//! Feed ingestion
//!
//! Retrieval, parsing and normalization of the upstream feed.
//!
//! # Pipeline
//!
//! ```text
//! FeedFetcher::fetch ──► FeedParser::parse ──► normalize(document, seen)
//!   (raw payload,          (FeedDocument)        (NewEntry, oldest first)
//!    ampersands repaired)
//! ```
//!
//! The secondary stream reuses the fetcher and parser, then selects posts with
//! [`secondary::unseen_posts`].

pub mod fetcher;
pub mod headers;
pub mod normalize;
pub mod parser;
pub mod secondary;

pub use fetcher::{is_blocked, repair_ampersands, FeedFetcher};
pub use normalize::normalize;
pub use parser::{FeedParser, RssParser};
pub use secondary::SecondaryPost;
