// tests/chain_fallback.rs
// End-to-end behaviour of the source chain against canned HTTP bodies.

use std::time::Duration;

use daily_briefing::ingest::chain::{ChainSettings, SourceChain};
use daily_briefing::ingest::fetch::StaticFetcher;
use daily_briefing::ingest::providers::newsapi::NewsApiProvider;
use daily_briefing::ingest::providers::rss::RssFeedProvider;
use daily_briefing::ingest::providers::story_index::StoryIndexProvider;
use daily_briefing::ingest::types::{SourceError, Timeouts};

const MARKETS_XML: &str = include_str!("fixtures/markets_rss.xml");
const TECH_XML: &str = include_str!("fixtures/tech_atom.xml");

const MARKETS: &str = "https://feeds.test/markets";
const TECH: &str = "https://feeds.test/tech";
const BROKEN: &str = "https://feeds.test/broken";

fn settings(keywords: &[&str]) -> ChainSettings {
    ChainSettings {
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        cap: 8,
        min_results: 4,
        min_title_len: 15,
        timeouts: Timeouts {
            source: Duration::from_secs(2),
            item: Duration::from_secs(1),
        },
    }
}

fn market_keywords() -> ChainSettings {
    settings(&["nasdaq", "earnings", "fed", "tesla", "inflation", "revenue"])
}

fn rss_with_titles(titles: &[String]) -> String {
    let items: String = titles
        .iter()
        .map(|t| format!("<item><title>{t}</title><link>https://x.test/</link></item>\n"))
        .collect();
    format!(r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Gen</title>{items}</channel></rss>"#)
}

#[tokio::test]
async fn every_source_failing_yields_single_note() {
    let fetcher = StaticFetcher::new()
        .fail(MARKETS, "connection refused")
        .fail(TECH, "502 Bad Gateway");
    let chain = SourceChain::new(market_keywords())
        .source(RssFeedProvider::new("Markets", MARKETS))
        .source(RssFeedProvider::new("Tech", TECH))
        .broadening(StoryIndexProvider::new(
            "Hacker News",
            "https://hn.test/top.json",
            "https://hn.test/item/{id}.json",
            5,
        ));

    let report = chain.run(&fetcher).await;

    assert!(report.placeholder);
    assert!(report.broadened);
    assert_eq!(report.items.len(), 1);
    assert_eq!(report.items[0].source, "Note");
    assert_eq!(report.items[0].title, "News unavailable (Markets: fetch failed)");
    assert_eq!(report.errors.len(), 3);
}

#[tokio::test]
async fn full_first_source_stops_the_chain() {
    let titles: Vec<String> = (1..=10)
        .map(|i| format!("Market update number {i:02} for investors"))
        .collect();
    let fetcher = StaticFetcher::new()
        .body(MARKETS, rss_with_titles(&titles))
        .body(TECH, TECH_XML);
    let chain = SourceChain::new(settings(&["market"]))
        .source(RssFeedProvider::new("Markets", MARKETS).with_items_per_feed(10))
        .source(RssFeedProvider::new("Tech", TECH));

    let report = chain.run(&fetcher).await;

    assert_eq!(report.items.len(), 8);
    assert!(!fetcher.was_requested(TECH));
    assert_eq!(report.queried, vec!["Markets".to_string()]);
    assert_eq!(report.items[0].title, "Market update number 01 for investors");
    assert_eq!(report.items[7].title, "Market update number 08 for investors");
}

#[tokio::test]
async fn malformed_feed_does_not_block_later_feeds() {
    let broken = format!(
        "<rss><channel><item><title>cut off</title><description>{}",
        "x".repeat(120)
    );
    let fetcher = StaticFetcher::new()
        .body(BROKEN, broken)
        .body(MARKETS, MARKETS_XML);
    let chain = SourceChain::new(market_keywords())
        .source(RssFeedProvider::new("Broken", BROKEN))
        .source(RssFeedProvider::new("Markets", MARKETS));

    let report = chain.run(&fetcher).await;

    assert!(matches!(report.errors[0], SourceError::Parse { .. }));
    assert!(!report.placeholder);
    let titles: Vec<&str> = report.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Nasdaq closes at record as chip stocks rally",
            "AT&T beats quarterly earnings estimates",
            "Investors weigh inflation data ahead of the Fed's meeting",
        ]
    );
    assert!(report.items.iter().all(|i| i.source == "Markets"));
}

#[tokio::test]
async fn duplicates_across_feeds_are_suppressed() {
    let fetcher = StaticFetcher::new()
        .body(MARKETS, MARKETS_XML)
        .body(TECH, TECH_XML);
    let chain = SourceChain::new(market_keywords())
        .source(RssFeedProvider::new("Markets", MARKETS))
        .source(RssFeedProvider::new("Tech", TECH));

    let report = chain.run(&fetcher).await;

    let titles: Vec<&str> = report.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles.len(), 4);
    assert_eq!(titles[3], "Microsoft's cloud revenue tops forecasts");
    assert!(!titles
        .iter()
        .any(|t| t.ends_with("chip stocks rally again")));
    assert!(!report.broadened);
}

#[tokio::test]
async fn thin_results_trigger_unfiltered_broadening() {
    let fetcher = StaticFetcher::new()
        .body(MARKETS, MARKETS_XML)
        .body("https://hn.test/top.json", "[11, 12, 13, 14]")
        .body(
            "https://hn.test/item/11.json",
            r#"{"id": 11, "title": "Show HN: a tiny text editor written in Rust"}"#,
        )
        .fail("https://hn.test/item/12.json", "timeout")
        .body("https://hn.test/item/13.json", "null")
        .body(
            "https://hn.test/item/14.json",
            r#"{"id": 14, "title": "Nasdaq closes at record"}"#,
        );
    let chain = SourceChain::new(market_keywords())
        .source(RssFeedProvider::new("Markets", MARKETS))
        .broadening(StoryIndexProvider::new(
            "Hacker News",
            "https://hn.test/top.json",
            "https://hn.test/item/{id}.json",
            5,
        ));

    let report = chain.run(&fetcher).await;

    assert!(report.broadened);
    assert!(report.errors.is_empty());
    assert_eq!(report.items.len(), 4);
    let last = report.items.last().unwrap();
    assert_eq!(last.source, "Hacker News");
    assert_eq!(last.title, "Show HN: a tiny text editor written in Rust");
    // id 14 is a truncated repeat of an accepted headline
    assert!(fetcher.was_requested("https://hn.test/item/14.json"));
}

#[tokio::test]
async fn slow_source_times_out_and_chain_continues() {
    let fetcher = StaticFetcher::new()
        .slow(TECH, Duration::from_millis(500), TECH_XML)
        .body(MARKETS, MARKETS_XML);
    let mut s = market_keywords();
    s.timeouts.source = Duration::from_millis(30);
    let chain = SourceChain::new(s)
        .source(RssFeedProvider::new("Tech", TECH))
        .source(RssFeedProvider::new("Markets", MARKETS));

    let report = chain.run(&fetcher).await;

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].to_string().starts_with("Tech: timed out"));
    assert_eq!(report.items.len(), 3);
}

#[tokio::test]
async fn missing_api_key_is_skipped_not_reported() {
    let fetcher = StaticFetcher::new();
    let chain = SourceChain::new(market_keywords())
        .source(NewsApiProvider::new(None, vec!["business".into()]));

    let report = chain.run(&fetcher).await;

    assert_eq!(report.skipped, vec!["NewsAPI".to_string()]);
    assert!(report.errors.is_empty());
    assert!(fetcher.requested().is_empty());
    assert_eq!(report.items[0].title, "News feeds temporarily unavailable");
}

#[tokio::test]
async fn rejected_api_key_is_skipped_not_reported() {
    let api = "http://api/top?category=business&language=en&apiKey=bad";
    let fetcher = StaticFetcher::new()
        .body(
            api,
            r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid or incorrect."}"#,
        )
        .fail(MARKETS, "connection refused");
    let chain = SourceChain::new(market_keywords())
        .source(
            NewsApiProvider::new(Some("bad".into()), vec!["business".into()])
                .with_endpoint("http://api/top"),
        )
        .source(RssFeedProvider::new("Markets", MARKETS));

    let report = chain.run(&fetcher).await;

    assert_eq!(report.skipped, vec!["NewsAPI".to_string()]);
    assert_eq!(report.errors, vec![SourceError::unavailable("Markets", "fetch failed")]);
    assert!(report.placeholder);
    assert_eq!(report.items[0].title, "News unavailable (Markets: fetch failed)");
}

#[tokio::test]
async fn rss_item_can_qualify_through_its_description() {
    let xml = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Wire</title>
<item><title>Automaker shares jump in late trading</title>
<description><![CDATA[<p>Tesla stock rose after the bell.</p>]]></description></item>
<item><title>Gardening club opens new community plot</title>
<description>Volunteers planted tomatoes.</description></item>
</channel></rss>"#;
    let fetcher = StaticFetcher::new().body(MARKETS, xml);
    let chain = SourceChain::new(market_keywords()).source(RssFeedProvider::new("Markets", MARKETS));

    let report = chain.run(&fetcher).await;

    let titles: Vec<&str> = report.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles[0], "Automaker shares jump in late trading");
    assert!(!titles.contains(&"Gardening club opens new community plot"));
}

#[tokio::test]
async fn short_body_counts_as_empty_response() {
    let fetcher = StaticFetcher::new().body(MARKETS, "<rss/>");
    let chain = SourceChain::new(market_keywords()).source(RssFeedProvider::new("Markets", MARKETS));

    let report = chain.run(&fetcher).await;

    assert_eq!(
        report.errors,
        vec![SourceError::unavailable("Markets", "empty response")]
    );
    assert_eq!(report.items[0].title, "News unavailable (Markets: empty response)");
}

#[tokio::test]
async fn results_are_capped_relevant_and_distinct() {
    let titles: Vec<String> = vec![
        "Tesla recalls vehicles over software flaw".into(),
        "Tesla recalls vehicles".into(),
        "Nvidia earnings smash expectations again".into(),
        "NVIDIA EARNINGS SMASH EXPECTATIONS".into(),
        "Gardening club opens new community plot".into(),
        "Teslas are selling faster in Europe this year".into(),
    ];
    let fetcher = StaticFetcher::new()
        .body(MARKETS, rss_with_titles(&titles))
        .body(TECH, TECH_XML);
    let mut s = settings(&["tesla", "earnings", "revenue"]);
    s.cap = 3;
    let chain = SourceChain::new(s)
        .source(RssFeedProvider::new("Markets", MARKETS).with_items_per_feed(10))
        .source(RssFeedProvider::new("Tech", TECH));

    let report = chain.run(&fetcher).await;

    assert!(report.items.len() <= 3);
    for (i, a) in report.items.iter().enumerate() {
        let la = a.title.to_lowercase();
        assert!(["tesla", "earnings", "revenue"].iter().any(|k| la.contains(k)));
        for b in report.items.iter().skip(i + 1) {
            let lb = b.title.to_lowercase();
            assert!(!la.contains(&lb) && !lb.contains(&la), "{la} vs {lb}");
        }
    }
    assert_eq!(
        report.items.iter().map(|i| i.title.as_str()).collect::<Vec<_>>(),
        vec![
            "Tesla recalls vehicles over software flaw",
            "Nvidia earnings smash expectations again",
            "Teslas are selling faster in Europe this year",
        ]
    );
    assert!(!fetcher.was_requested(TECH));
}
