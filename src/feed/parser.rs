//! Feed parsing
//!
//! [`FeedParser`] turns a repaired payload into a [`FeedDocument`]. The relay
//! only depends on the trait; [`RssParser`] is the RSS 2.0 implementation used
//! by the binary.
//!
//! Elements read by [`RssParser`]:
//!
//! | Path                         | Field            | Default           |
//! |------------------------------|------------------|-------------------|
//! | `rss/channel/item/title`       | `title`          | "No Title"        |
//! | `rss/channel/item/description` | `body_raw`       | "No Description"  |
//! | `rss/channel/item/link`        | `link`           | "#"               |
//! | `rss/channel/item/pubDate`     | `published_at`   | none (entry skipped later) |
//! | `rss/channel/item/category`    | `category`       | none              |
//! | `rss/channel/item/guid`        | `guid`           | none              |
//! | `rss/channel/image/url`        | `image_url`      | none              |

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::models::{FeedDocument, FeedEntry};
use crate::utils::error::FetchError;

/// Converts a raw feed payload into entries
pub trait FeedParser: Send + Sync {
    /// Parse a payload, rejecting documents without the expected structure
    fn parse(&self, payload: &str) -> Result<FeedDocument, FetchError>;
}

/// RSS 2.0 parser backed by quick-xml
#[derive(Debug, Clone, Copy, Default)]
pub struct RssParser;

impl RssParser {
    /// Create a new RSS parser
    pub fn new() -> Self {
        Self
    }
}

impl FeedParser for RssParser {
    fn parse(&self, payload: &str) -> Result<FeedDocument, FetchError> {
        let mut reader = Reader::from_reader(payload.as_bytes());
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut path: Vec<String> = Vec::new();
        let mut text = String::new();

        let mut saw_rss = false;
        let mut saw_channel = false;
        let mut entries = Vec::new();
        let mut current: Option<ItemBuilder> = None;
        let mut image_url: Option<String> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    path.push(name);
                    text.clear();

                    match path_str(&path).as_slice() {
                        ["rss"] => saw_rss = true,
                        ["rss", "channel"] => saw_channel = true,
                        ["rss", "channel", "item"] => current = Some(ItemBuilder::default()),
                        _ => {}
                    }
                }
                Ok(Event::End(_)) => {
                    let value = text.trim().to_string();
                    text.clear();

                    match path_str(&path).as_slice() {
                        ["rss", "channel", "item"] => {
                            if let Some(item) = current.take() {
                                entries.push(item.build());
                            }
                        }
                        ["rss", "channel", "item", field] => {
                            if let Some(item) = current.as_mut() {
                                item.set(field, value);
                            }
                        }
                        ["rss", "channel", "image", "url"] => {
                            if !value.is_empty() && image_url.is_none() {
                                image_url = Some(value);
                            }
                        }
                        _ => {}
                    }
                    path.pop();
                }
                Ok(Event::Text(e)) => {
                    let chunk = e.unescape().map_err(|err| {
                        FetchError::malformed(format!(
                            "invalid text at byte {}: {err}",
                            reader.buffer_position()
                        ))
                    })?;
                    text.push_str(&chunk);
                }
                Ok(Event::CData(e)) => {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(FetchError::malformed(format!(
                        "XML parse error at byte {}: {e}",
                        reader.error_position()
                    )))
                }
                _ => {}
            }
            buf.clear();
        }

        if !saw_rss {
            return Err(FetchError::malformed("missing <rss> root element"));
        }
        if !saw_channel {
            return Err(FetchError::malformed("missing <channel> element"));
        }
        if entries.is_empty() {
            return Err(FetchError::malformed("channel contains no <item> elements"));
        }

        tracing::debug!(entries = entries.len(), has_image = image_url.is_some(), "Feed parsed");
        Ok(FeedDocument {
            entries,
            image_url,
        })
    }
}

fn path_str(path: &[String]) -> Vec<&str> {
    path.iter().map(String::as_str).collect()
}

#[derive(Default)]
struct ItemBuilder {
    title: Option<String>,
    description: Option<String>,
    link: Option<String>,
    pub_date: Option<String>,
    category: Option<String>,
    guid: Option<String>,
}

impl ItemBuilder {
    /// Keep the first non-empty value of each field
    fn set(&mut self, field: &str, value: String) {
        let slot = match field {
            "title" => &mut self.title,
            "description" => &mut self.description,
            "link" => &mut self.link,
            "pubDate" => &mut self.pub_date,
            "category" => &mut self.category,
            "guid" => &mut self.guid,
            _ => return,
        };
        if slot.is_none() && !value.is_empty() {
            *slot = Some(value);
        }
    }

    fn build(self) -> FeedEntry {
        FeedEntry {
            title: self.title.unwrap_or_else(|| "No Title".to_string()),
            body_raw: self
                .description
                .unwrap_or_else(|| "No Description".to_string()),
            link: self.link.unwrap_or_else(|| "#".to_string()),
            category: self.category,
            published_at: self.pub_date,
            guid: self.guid,
        }
    }
}
