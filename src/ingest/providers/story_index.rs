// src/ingest/providers/story_index.rs
//! Two-step "story index" source (Hacker News Firebase API shape): one request
//! lists story ids, then each story is fetched on its own with a shorter
//! timeout. A failed story is skipped; only a failed index fails the source.

use async_trait::async_trait;
use serde::Deserialize;

use crate::ingest::fetch::{fetch_bounded, Fetcher};
use crate::ingest::filter::Collector;
use crate::ingest::types::{RawItem, SourceError, SourceProvider, Timeouts};

pub const HN_TOP_STORIES: &str = "https://hacker-news.firebaseio.com/v0/topstories.json";
pub const HN_ITEM: &str = "https://hacker-news.firebaseio.com/v0/item/{id}.json";

#[derive(Debug, Deserialize)]
struct Story {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StoryIndexProvider {
    label: String,
    index_url: String,
    /// Item URL with an `{id}` placeholder.
    item_url: String,
    max_ids: usize,
}

impl StoryIndexProvider {
    pub fn new(
        label: impl Into<String>,
        index_url: impl Into<String>,
        item_url: impl Into<String>,
        max_ids: usize,
    ) -> Self {
        Self {
            label: label.into(),
            index_url: index_url.into(),
            item_url: item_url.into(),
            max_ids,
        }
    }

    pub fn hacker_news(label: impl Into<String>, max_ids: usize) -> Self {
        Self::new(label, HN_TOP_STORIES, HN_ITEM, max_ids)
    }

    pub fn item_url_for(&self, id: u64) -> String {
        self.item_url.replace("{id}", &id.to_string())
    }

    async fn fetch_story(&self, fetcher: &dyn Fetcher, id: u64, timeouts: Timeouts) -> Option<String> {
        let url = self.item_url_for(id);
        let body = match fetch_bounded(fetcher, &self.label, &url, timeouts.item).await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!(target: "briefing", error = %e, id, "story fetch skipped");
                return None;
            }
        };
        // `null` is a valid answer for deleted stories.
        match serde_json::from_str::<Option<Story>>(&body) {
            Ok(story) => story.and_then(|s| s.title).filter(|t| !t.trim().is_empty()),
            Err(e) => {
                tracing::debug!(target: "briefing", error = %e, id, "story parse skipped");
                None
            }
        }
    }
}

#[async_trait]
impl SourceProvider for StoryIndexProvider {
    async fn collect(
        &self,
        fetcher: &dyn Fetcher,
        timeouts: Timeouts,
        sink: &mut Collector,
    ) -> Result<(), SourceError> {
        let body = fetch_bounded(fetcher, &self.label, &self.index_url, timeouts.source).await?;
        if body.trim().is_empty() {
            return Err(SourceError::unavailable(&self.label, "empty response"));
        }
        let ids: Vec<u64> = serde_json::from_str(&body)
            .map_err(|e| SourceError::parse(&self.label, format!("story index: {e}")))?;
        if ids.is_empty() {
            return Err(SourceError::Empty {
                name: self.label.clone(),
            });
        }

        for id in ids.into_iter().take(self.max_ids) {
            let Some(title) = self.fetch_story(fetcher, id, timeouts).await else {
                continue;
            };
            if sink.offer(RawItem::new(self.label.as_str(), title)).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.label
    }
}
