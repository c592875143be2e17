//! Relevance + dedup filter and the bounded collector built on top of it.
//!
//! A title is accepted when, in this order:
//! - its normalized form is longer than `min_title_len` chars,
//! - it is not a near-duplicate of an earlier title (one lowercase title is a
//!   substring of the other, either way round),
//! - it contains at least one keyword as a substring (keyword mode only).
//!
//! The seen-title list lives only as long as one run.

use metrics::counter;
use std::ops::ControlFlow;

use crate::ingest::normalize_text;
use crate::ingest::types::{AcceptedItem, RawItem};

/// Whether the keyword gate applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Keyword,
    /// Secondary pass: only the length and dedup rules apply.
    Broadening,
}

/// Outcome of offering one title to the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Normalized title, already recorded as seen.
    Accepted(String),
    TooShort,
    Duplicate,
    Irrelevant,
}

impl Verdict {
    pub fn reason(&self) -> &'static str {
        match self {
            Verdict::Accepted(_) => "accepted",
            Verdict::TooShort => "too_short",
            Verdict::Duplicate => "duplicate",
            Verdict::Irrelevant => "irrelevant",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
    min_title_len: usize,
    seen: Vec<String>,
}

impl RelevanceFilter {
    pub fn new<S: AsRef<str>>(keywords: &[S], min_title_len: usize) -> Self {
        let keywords = keywords
            .iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            keywords,
            min_title_len,
            seen: Vec::new(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Lowercase titles accepted so far, in acceptance order.
    pub fn seen(&self) -> &[String] {
        &self.seen
    }

    /// True if any keyword occurs anywhere in `text` (case-insensitive).
    /// Substring containment, so "teslas" matches "tesla".
    pub fn is_relevant(&self, text: &str) -> bool {
        let hay = text.to_lowercase();
        self.keywords.iter().any(|kw| hay.contains(kw.as_str()))
    }

    /// Symmetric containment against every seen title.
    pub fn is_duplicate(&self, title_lower: &str) -> bool {
        self.seen
            .iter()
            .any(|s| s.contains(title_lower) || title_lower.contains(s.as_str()))
    }

    pub fn evaluate(&mut self, title: &str, snippet: Option<&str>, mode: FilterMode) -> Verdict {
        let clean = normalize_text(title);
        if clean.chars().count() <= self.min_title_len {
            return Verdict::TooShort;
        }

        let lower = clean.to_lowercase();
        if self.is_duplicate(&lower) {
            return Verdict::Duplicate;
        }

        if mode == FilterMode::Keyword {
            let relevant = match snippet {
                Some(sn) if !sn.trim().is_empty() => {
                    self.is_relevant(&format!("{lower} {}", normalize_text(sn)))
                }
                _ => self.is_relevant(&lower),
            };
            if !relevant {
                return Verdict::Irrelevant;
            }
        }

        self.seen.push(lower);
        Verdict::Accepted(clean)
    }
}

/// Accumulates accepted items for one run, up to `cap`.
#[derive(Debug)]
pub struct Collector {
    filter: RelevanceFilter,
    cap: usize,
    mode: FilterMode,
    items: Vec<AcceptedItem>,
    offered: usize,
}

impl Collector {
    pub fn new(filter: RelevanceFilter, cap: usize) -> Self {
        Self {
            filter,
            cap,
            mode: FilterMode::Keyword,
            items: Vec::with_capacity(cap),
            offered: 0,
        }
    }

    pub fn set_mode(&mut self, mode: FilterMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.cap
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items offered so far, accepted or not.
    pub fn offered(&self) -> usize {
        self.offered
    }

    pub fn items(&self) -> &[AcceptedItem] {
        &self.items
    }

    /// Offer one raw item. Returns `Break` once the cap is reached, telling the
    /// source to stop listing.
    pub fn offer(&mut self, item: RawItem) -> ControlFlow<()> {
        if self.is_full() {
            return ControlFlow::Break(());
        }
        self.offered += 1;
        counter!("briefing_items_offered_total").increment(1);

        match self
            .filter
            .evaluate(&item.title, item.snippet.as_deref(), self.mode)
        {
            Verdict::Accepted(title) => {
                counter!("briefing_items_accepted_total").increment(1);
                self.items.push(AcceptedItem {
                    source: item.source,
                    title,
                });
            }
            rejected => {
                counter!("briefing_items_rejected_total", "reason" => rejected.reason())
                    .increment(1);
                tracing::debug!(
                    target: "briefing",
                    source = %item.source,
                    reason = rejected.reason(),
                    "item rejected"
                );
            }
        }

        if self.is_full() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    pub fn into_items(self) -> Vec<AcceptedItem> {
        self.items
    }
}
