// src/ingest/types.rs
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::ingest::fetch::Fetcher;
use crate::ingest::filter::Collector;

/// Label used for the synthesized item when nothing could be collected.
pub const PLACEHOLDER_SOURCE: &str = "Note";

/// One item as listed by a source, before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    pub source: String, // e.g., "Reuters", "Hacker News"
    pub title: String,
    pub snippet: Option<String>,
}

impl RawItem {
    pub fn new(source: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            title: title.into(),
            snippet: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

/// An item that passed the relevance + dedup filter. Title is normalized.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct AcceptedItem {
    pub source: String,
    pub title: String,
}

/// Source-level failure. Never aborts the chain.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// Network error, timeout, non-success status or empty body.
    #[error("{name}: {reason}")]
    Unavailable { name: String, reason: String },

    /// Body could not be parsed as the source's native format.
    #[error("{name}: {reason}")]
    Parse { name: String, reason: String },

    /// Body parsed but listed nothing.
    #[error("{name}: no items")]
    Empty { name: String },

    /// No API key configured; the source does not apply to this run.
    #[error("{name}: no api key")]
    AuthMissing { name: String },
}

impl SourceError {
    pub fn unavailable(name: &str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn parse(name: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_auth_missing(&self) -> bool {
        matches!(self, Self::AuthMissing { .. })
    }
}

/// Timeouts handed to every source call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Bound for a source's main request (feed body, story index, API page).
    pub source: Duration,
    /// Bound for each follow-up item request of a story-index source.
    pub item: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            source: Duration::from_secs(5),
            item: Duration::from_secs(2),
        }
    }
}

/// A source in the chain: a label plus the capability to fetch and list items.
///
/// Implementations offer each parsed item to the collector and stop as soon as
/// the collector reports it is full.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    async fn collect(
        &self,
        fetcher: &dyn Fetcher,
        timeouts: Timeouts,
        sink: &mut Collector,
    ) -> Result<(), SourceError>;

    fn name(&self) -> &str;
}
