// src/ingest/mod.rs
pub mod chain;
pub mod config;
pub mod fetch;
pub mod filter;
pub mod providers;
pub mod types;

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// Upper bound for a normalized title, in chars.
const MAX_TITLE_CHARS: usize = 300;

/// One-time metrics registration (so series show up once a recorder is installed).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "briefing_items_offered_total",
            "Items handed to the relevance filter."
        );
        describe_counter!(
            "briefing_items_accepted_total",
            "Items accepted into the briefing."
        );
        describe_counter!(
            "briefing_items_rejected_total",
            "Items rejected by the filter, by reason."
        );
        describe_counter!(
            "briefing_source_errors_total",
            "Source-level fetch/parse errors."
        );
        describe_counter!(
            "briefing_sources_skipped_total",
            "Sources skipped for missing credentials."
        );
        describe_counter!(
            "briefing_placeholder_total",
            "Runs that ended with the diagnostic placeholder."
        );
        describe_histogram!("briefing_source_ms", "Per-source wall time in milliseconds.");
    });
}

/// Normalize a feed title or snippet: unwrap CDATA, decode entities, strip tags,
/// fold typographic quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) CDATA wrappers leaked through by sloppy feeds
    let mut out = s.replace("<![CDATA[", "").replace("]]>", "");

    // 2) HTML entity decode
    out = html_escape::decode_html_entities(&out).to_string();

    // 3) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 4) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 5) Collapse whitespace (incl. nbsp)
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 6) Length cap
    if out.chars().count() > MAX_TITLE_CHARS {
        out = out.chars().take(MAX_TITLE_CHARS).collect();
    }

    out
}
