// src/ingest/chain.rs
//! Ordered source chain with per-source error containment.
//!
//! Sources run one after another in priority order so that, when the cap is
//! hit, earlier sources win. A failing source is recorded and skipped. If the
//! primary sources leave the briefing thin, the broadening sources run with the
//! keyword gate off. An empty result is replaced by a single "Note" item that
//! names the first recorded error.

use metrics::{counter, histogram};

use crate::ingest::ensure_metrics_described;
use crate::ingest::fetch::Fetcher;
use crate::ingest::filter::{Collector, FilterMode, RelevanceFilter};
use crate::ingest::types::{AcceptedItem, SourceError, SourceProvider, Timeouts, PLACEHOLDER_SOURCE};

/// Longest error reason quoted in the placeholder title.
const MAX_ERROR_CHARS: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSettings {
    pub keywords: Vec<String>,
    /// Max accepted items.
    pub cap: usize,
    /// Broadening runs when fewer than this many items were accepted.
    pub min_results: usize,
    /// Titles must be strictly longer than this (chars).
    pub min_title_len: usize,
    pub timeouts: Timeouts,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            cap: 8,
            min_results: 4,
            min_title_len: 15,
            timeouts: Timeouts::default(),
        }
    }
}

/// What happened during one run, besides the items themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainReport {
    pub items: Vec<AcceptedItem>,
    /// Source-level errors in encounter order (credential skips excluded).
    pub errors: Vec<SourceError>,
    /// Sources skipped for missing credentials.
    pub skipped: Vec<String>,
    /// Sources actually invoked, in order.
    pub queried: Vec<String>,
    pub broadened: bool,
    pub placeholder: bool,
}

impl ChainReport {
    pub fn first_error(&self) -> Option<&SourceError> {
        self.errors.first()
    }
}

pub struct SourceChain {
    settings: ChainSettings,
    primary: Vec<Box<dyn SourceProvider>>,
    broadening: Vec<Box<dyn SourceProvider>>,
}

impl SourceChain {
    pub fn new(settings: ChainSettings) -> Self {
        Self {
            settings,
            primary: Vec::new(),
            broadening: Vec::new(),
        }
    }

    /// Append a primary source (keyword-gated). Order = priority.
    pub fn source(mut self, p: impl SourceProvider + 'static) -> Self {
        self.primary.push(Box::new(p));
        self
    }

    /// Append a fallback source for the broadening pass.
    pub fn broadening(mut self, p: impl SourceProvider + 'static) -> Self {
        self.broadening.push(Box::new(p));
        self
    }

    pub fn with_sources(mut self, sources: Vec<Box<dyn SourceProvider>>) -> Self {
        self.primary.extend(sources);
        self
    }

    pub fn with_broadening(mut self, sources: Vec<Box<dyn SourceProvider>>) -> Self {
        self.broadening.extend(sources);
        self
    }

    pub fn settings(&self) -> &ChainSettings {
        &self.settings
    }

    /// Source names in evaluation order (primary, then broadening).
    pub fn source_names(&self) -> Vec<String> {
        self.primary
            .iter()
            .chain(self.broadening.iter())
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Run the chain once. Never fails; the result is never empty.
    pub async fn run(&self, fetcher: &dyn Fetcher) -> ChainReport {
        ensure_metrics_described();

        let filter = RelevanceFilter::new(&self.settings.keywords, self.settings.min_title_len);
        let mut sink = Collector::new(filter, self.settings.cap);
        let mut report = ChainReport::default();

        self.run_pass(&self.primary, fetcher, &mut sink, &mut report).await;

        if sink.len() < self.settings.min_results && !sink.is_full() && !self.broadening.is_empty() {
            tracing::info!(
                target: "briefing",
                have = sink.len(),
                min = self.settings.min_results,
                "broadening"
            );
            report.broadened = true;
            sink.set_mode(FilterMode::Broadening);
            self.run_pass(&self.broadening, fetcher, &mut sink, &mut report)
                .await;
        }

        report.items = sink.into_items();
        if report.items.is_empty() {
            counter!("briefing_placeholder_total").increment(1);
            report.placeholder = true;
            report.items.push(placeholder_item(report.first_error()));
        }

        tracing::info!(
            target: "briefing",
            items = report.items.len(),
            errors = report.errors.len(),
            skipped = report.skipped.len(),
            placeholder = report.placeholder,
            "briefing run finished"
        );
        report
    }

    async fn run_pass(
        &self,
        sources: &[Box<dyn SourceProvider>],
        fetcher: &dyn Fetcher,
        sink: &mut Collector,
        report: &mut ChainReport,
    ) {
        for src in sources {
            if sink.is_full() {
                tracing::debug!(target: "briefing", source = src.name(), "cap reached, stopping");
                break;
            }
            report.queried.push(src.name().to_string());

            let t0 = std::time::Instant::now();
            let before = sink.len();
            let res = src.collect(fetcher, self.settings.timeouts, sink).await;
            histogram!("briefing_source_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

            match res {
                Ok(()) => tracing::debug!(
                    target: "briefing",
                    source = src.name(),
                    accepted = sink.len() - before,
                    "source done"
                ),
                Err(e) if e.is_auth_missing() => {
                    counter!("briefing_sources_skipped_total").increment(1);
                    tracing::debug!(target: "briefing", source = src.name(), "no credentials, skipped");
                    report.skipped.push(src.name().to_string());
                }
                Err(e) => {
                    counter!("briefing_source_errors_total").increment(1);
                    tracing::warn!(target: "briefing", error = %e, source = src.name(), "source error");
                    report.errors.push(e);
                }
            }
        }
    }
}

/// The single diagnostic item returned when nothing could be collected.
pub fn placeholder_item(first_error: Option<&SourceError>) -> AcceptedItem {
    let title = match first_error {
        Some(e) => {
            let mut why = e.to_string();
            if why.chars().count() > MAX_ERROR_CHARS {
                why = why.chars().take(MAX_ERROR_CHARS).collect();
            }
            format!("News unavailable ({why})")
        }
        None => "News feeds temporarily unavailable".to_string(),
    };
    AcceptedItem {
        source: PLACEHOLDER_SOURCE.to_string(),
        title,
    }
}
