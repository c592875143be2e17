// src/ingest/providers/rss.rs
//! RSS 2.0 / Atom feed source.
//!
//! Parsing is a small streaming pass over the document: every `<item>` (RSS) or
//! `<entry>` (Atom) yields its `title` and `description`/`summary`. Namespace
//! prefixes are ignored. Text is kept raw; entity decoding happens in
//! [`normalize_text`](crate::ingest::normalize_text), so feeds full of HTML
//! entities (`&nbsp;`, `&rsquo;`) do not trip the XML layer.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::ingest::fetch::{fetch_bounded, Fetcher};
use crate::ingest::filter::Collector;
use crate::ingest::types::{RawItem, SourceError, SourceProvider, Timeouts};

/// Bodies shorter than this are treated as an empty response.
pub const DEFAULT_MIN_BODY_LEN: usize = 100;
/// Only the head of each feed is examined.
pub const DEFAULT_ITEMS_PER_FEED: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub summary: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Title,
    Summary,
}

/// Parse RSS 2.0 or Atom into entries, in document order.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let mut reader = Reader::from_str(xml);

    let mut entries = Vec::new();
    let mut current: Option<FeedEntry> = None;
    let mut field = Field::None;
    let mut buf = String::new();
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        let ev = reader
            .read_event()
            .map_err(|e| anyhow!("xml error at {}: {e}", reader.buffer_position()))?;
        match ev {
            Event::Start(e) => {
                depth += 1;
                saw_root = true;
                let name = e.local_name();
                match name.as_ref() {
                    b"item" | b"entry" => {
                        current = Some(FeedEntry::default());
                        field = Field::None;
                    }
                    b"title" if current.is_some() && field == Field::None => {
                        field = Field::Title;
                        buf.clear();
                    }
                    b"description" | b"summary" if current.is_some() && field == Field::None => {
                        field = Field::Summary;
                        buf.clear();
                    }
                    _ => {}
                }
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                let name = e.local_name();
                match (name.as_ref(), field) {
                    (b"title", Field::Title) => {
                        if let Some(cur) = current.as_mut() {
                            cur.title.get_or_insert_with(|| buf.trim().to_string());
                        }
                        field = Field::None;
                    }
                    (b"description" | b"summary", Field::Summary) => {
                        if let Some(cur) = current.as_mut() {
                            cur.summary.get_or_insert_with(|| buf.trim().to_string());
                        }
                        field = Field::None;
                    }
                    (b"item" | b"entry", _) => {
                        if let Some(done) = current.take() {
                            entries.push(done);
                        }
                        field = Field::None;
                    }
                    _ => {}
                }
            }
            Event::Empty(_) => saw_root = true,
            Event::Text(t) if field != Field::None => {
                buf.push_str(&String::from_utf8_lossy(&t));
            }
            Event::CData(c) if field != Field::None => {
                buf.push_str(&String::from_utf8_lossy(&c));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(anyhow!("no xml root element"));
    }
    if depth != 0 {
        return Err(anyhow!("truncated document ({depth} unclosed elements)"));
    }
    Ok(entries)
}

/// One RSS/Atom feed in the chain.
#[derive(Debug, Clone)]
pub struct RssFeedProvider {
    name: String,
    url: String,
    items_per_feed: usize,
    min_body_len: usize,
}

impl RssFeedProvider {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            items_per_feed: DEFAULT_ITEMS_PER_FEED,
            min_body_len: DEFAULT_MIN_BODY_LEN,
        }
    }

    pub fn with_items_per_feed(mut self, n: usize) -> Self {
        self.items_per_feed = n;
        self
    }

    pub fn with_min_body_len(mut self, n: usize) -> Self {
        self.min_body_len = n;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SourceProvider for RssFeedProvider {
    async fn collect(
        &self,
        fetcher: &dyn Fetcher,
        timeouts: Timeouts,
        sink: &mut Collector,
    ) -> Result<(), SourceError> {
        let body = fetch_bounded(fetcher, &self.name, &self.url, timeouts.source).await?;
        if body.trim().len() < self.min_body_len {
            return Err(SourceError::unavailable(&self.name, "empty response"));
        }

        let entries = parse_feed(&body).map_err(|e| SourceError::parse(&self.name, e.to_string()))?;
        if entries.is_empty() {
            return Err(SourceError::Empty {
                name: self.name.clone(),
            });
        }

        for entry in entries.into_iter().take(self.items_per_feed) {
            let Some(title) = entry.title.filter(|t| !t.is_empty()) else {
                continue;
            };
            let item = RawItem {
                source: self.name.clone(),
                title,
                snippet: entry.summary.filter(|s| !s.is_empty()),
            };
            if sink.offer(item).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
