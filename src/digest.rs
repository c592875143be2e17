// src/digest.rs
//! Rendering of the news section for the terminal and for the daily note.

use chrono::NaiveDate;
use std::fmt::Write as _;

use crate::ingest::types::AcceptedItem;

pub const TEXT_HEADER: &str = "📰 Overnight Finance & Tech News (US/UK):";

/// Plain-text block: header, then `  • [source] title` per item.
pub fn render_text(items: &[AcceptedItem]) -> String {
    let mut out = String::new();
    out.push_str(TEXT_HEADER);
    if items.is_empty() {
        out.push_str("\n  Unable to fetch news");
        return out;
    }
    for it in items {
        let _ = write!(out, "\n  • [{}] {}", it.source, it.title);
    }
    out
}

/// Markdown section for appending to a dated note.
pub fn render_markdown(items: &[AcceptedItem], date: NaiveDate) -> String {
    let mut out = format!("## 📰 Overnight News ({})\n\n", date.format("%Y-%m-%d"));
    if items.is_empty() {
        out.push_str("_No news available._\n");
        return out;
    }
    for it in items {
        let _ = writeln!(out, "- **{}** — {}", it.source, escape_md(&it.title));
    }
    out
}

// Titles are free text; keep them from turning into emphasis or links.
fn escape_md(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '*' | '_' | '[' | ']' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
