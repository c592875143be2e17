// tests/providers_rss.rs
use std::time::Duration;

use daily_briefing::ingest::fetch::StaticFetcher;
use daily_briefing::ingest::filter::{Collector, RelevanceFilter};
use daily_briefing::ingest::providers::rss::{parse_feed, RssFeedProvider};
use daily_briefing::ingest::types::{SourceError, SourceProvider, Timeouts};

const MARKETS_XML: &str = include_str!("fixtures/markets_rss.xml");
const TECH_XML: &str = include_str!("fixtures/tech_atom.xml");

fn timeouts() -> Timeouts {
    Timeouts {
        source: Duration::from_secs(1),
        item: Duration::from_secs(1),
    }
}

#[test]
fn rss_fixture_parses_all_items_in_order() {
    let entries = parse_feed(MARKETS_XML).expect("rss parse ok");
    assert_eq!(entries.len(), 6);
    assert_eq!(
        entries[0].title.as_deref(),
        Some("Nasdaq closes at record as chip stocks rally")
    );
    assert_eq!(
        entries[0].summary.as_deref(),
        Some("Semiconductors led the gains.")
    );
    assert!(entries.iter().all(|e| e.title.is_some()));
}

#[test]
fn atom_fixture_parses_entries_and_summaries() {
    let entries = parse_feed(TECH_XML).expect("atom parse ok");
    assert_eq!(entries.len(), 3);
    assert_eq!(
        entries[0].summary.as_deref(),
        Some("Azure growth accelerated.")
    );
    assert_eq!(
        entries[1].title.as_deref(),
        Some("A startup builds a better bicycle lock")
    );
}

#[tokio::test]
async fn only_the_head_of_a_feed_is_examined() {
    let fetcher = StaticFetcher::new().body("http://f", MARKETS_XML);
    let provider = RssFeedProvider::new("Markets", "http://f").with_items_per_feed(2);
    let mut sink = Collector::new(RelevanceFilter::new(&["tesla", "nasdaq"], 15), 8);

    provider
        .collect(&fetcher, timeouts(), &mut sink)
        .await
        .expect("collect ok");

    // the Tesla headline sits at position 6
    assert_eq!(sink.len(), 1);
    assert_eq!(sink.offered(), 2);
    assert_eq!(provider.name(), "Markets");
}

#[tokio::test]
async fn feed_without_items_is_reported_empty() {
    let xml = format!(
        "<rss version=\"2.0\"><channel><title>Quiet</title><description>{}</description></channel></rss>",
        "nothing today ".repeat(10)
    );
    let fetcher = StaticFetcher::new().body("http://q", xml);
    let provider = RssFeedProvider::new("Quiet", "http://q");
    let mut sink = Collector::new(RelevanceFilter::new(&["x"], 15), 8);

    let err = provider
        .collect(&fetcher, timeouts(), &mut sink)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SourceError::Empty {
            name: "Quiet".into()
        }
    );
    assert_eq!(err.to_string(), "Quiet: no items");
}
