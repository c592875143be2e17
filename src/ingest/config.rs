// src/ingest/config.rs
//! Briefing configuration: keywords, limits, timeouts and the ordered source
//! list. Loaded from TOML or JSON; every field has a default.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::chain::{ChainSettings, SourceChain};
use crate::ingest::providers::newsapi::{NewsApiProvider, NEWSAPI_TOP_HEADLINES};
use crate::ingest::providers::rss::{RssFeedProvider, DEFAULT_ITEMS_PER_FEED, DEFAULT_MIN_BODY_LEN};
use crate::ingest::providers::story_index::{StoryIndexProvider, HN_ITEM, HN_TOP_STORIES};
use crate::ingest::types::Timeouts;

pub const ENV_CONFIG_PATH: &str = "BRIEFING_CONFIG_PATH";
pub const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";

const DEFAULT_KEYWORDS: &[&str] = &[
    "stock", "market", "earnings", "trade", "nasdaq", "dow", "s&p",
    "investment", "ipo", "merger", "acquisition", "revenue", "profit",
    "apple", "google", "microsoft", "amazon", "meta", "tesla", "nvidia",
    "ai", "artificial intelligence", "tech", "startup", "funding",
    "fed", "federal reserve", "interest rate", "inflation", "economy",
];

const DEFAULT_FEEDS: &[(&str, &str)] = &[
    ("Reuters", "https://www.reutersagency.com/feed/?taxonomy=markets&post_type=reuters-best"),
    ("Bloomberg", "https://feeds.bloomberg.com/markets/news.rss"),
    ("CNBC", "https://www.cnbc.com/id/10000664/device/rss/rss.html"),
    ("TechCrunch", "https://techcrunch.com/feed/"),
    ("Ars Technica", "https://feeds.arstechnica.com/arstechnica/technology"),
    ("The Verge", "https://www.theverge.com/rss/index.xml"),
];

fn default_cap() -> usize {
    8
}
fn default_min_results() -> usize {
    4
}
fn default_min_title_len() -> usize {
    15
}
fn default_items_per_feed() -> usize {
    DEFAULT_ITEMS_PER_FEED
}
fn default_source_timeout_secs() -> u64 {
    5
}
fn default_item_timeout_secs() -> u64 {
    2
}
fn default_min_response_len() -> usize {
    DEFAULT_MIN_BODY_LEN
}
fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect()
}
fn default_feeds() -> Vec<FeedCfg> {
    DEFAULT_FEEDS
        .iter()
        .map(|(name, url)| FeedCfg {
            name: name.to_string(),
            url: url.to_string(),
        })
        .collect()
}
fn default_categories() -> Vec<String> {
    vec!["business".into(), "technology".into()]
}
fn default_newsapi_endpoint() -> String {
    NEWSAPI_TOP_HEADLINES.to_string()
}
fn default_story_passes() -> Vec<StoryPassCfg> {
    vec![
        StoryPassCfg {
            label: "Market News".into(),
            index_url: HN_TOP_STORIES.into(),
            item_url: HN_ITEM.into(),
            max_ids: 10,
            broadening: false,
        },
        StoryPassCfg {
            label: "Hacker News".into(),
            index_url: HN_TOP_STORIES.into(),
            item_url: HN_ITEM.into(),
            max_ids: 5,
            broadening: true,
        },
    ]
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BriefingConfig {
    #[serde(default)]
    pub news: NewsCfg,
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedCfg>,
    #[serde(default)]
    pub newsapi: NewsApiCfg,
    #[serde(default = "default_story_passes")]
    pub story_passes: Vec<StoryPassCfg>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NewsCfg {
    /// Keyword gate for the primary pass. Must list at least one keyword after
    /// cleaning; an empty gate would reject every headline.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,
    #[serde(default = "default_cap")]
    pub cap: usize,
    #[serde(default = "default_min_results")]
    pub min_results: usize,
    #[serde(default = "default_min_title_len")]
    pub min_title_len: usize,
    #[serde(default = "default_items_per_feed")]
    pub items_per_feed: usize,
    #[serde(default = "default_source_timeout_secs")]
    pub source_timeout_secs: u64,
    #[serde(default = "default_item_timeout_secs")]
    pub item_timeout_secs: u64,
    /// RSS bodies shorter than this count as an empty response.
    #[serde(default = "default_min_response_len")]
    pub min_response_len: usize,
}

impl Default for NewsCfg {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            cap: default_cap(),
            min_results: default_min_results(),
            min_title_len: default_min_title_len(),
            items_per_feed: default_items_per_feed(),
            source_timeout_secs: default_source_timeout_secs(),
            item_timeout_secs: default_item_timeout_secs(),
            min_response_len: default_min_response_len(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeedCfg {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NewsApiCfg {
    /// Literal key, or "ENV" to read `$NEWS_API_KEY`. Absent also reads the env.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    #[serde(default = "default_newsapi_endpoint")]
    pub endpoint: String,
}

impl Default for NewsApiCfg {
    fn default() -> Self {
        Self {
            api_key: None,
            categories: default_categories(),
            endpoint: default_newsapi_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StoryPassCfg {
    pub label: String,
    #[serde(default = "default_hn_index")]
    pub index_url: String,
    /// Must contain `{id}`.
    #[serde(default = "default_hn_item")]
    pub item_url: String,
    pub max_ids: usize,
    /// Run only in the broadening pass, without the keyword gate.
    #[serde(default)]
    pub broadening: bool,
}

fn default_hn_index() -> String {
    HN_TOP_STORIES.to_string()
}
fn default_hn_item() -> String {
    HN_ITEM.to_string()
}

impl Default for BriefingConfig {
    fn default() -> Self {
        Self {
            news: NewsCfg::default(),
            feeds: default_feeds(),
            newsapi: NewsApiCfg::default(),
            story_passes: default_story_passes(),
        }
    }
}

impl BriefingConfig {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            source: Duration::from_secs(self.news.source_timeout_secs),
            item: Duration::from_secs(self.news.item_timeout_secs),
        }
    }

    pub fn chain_settings(&self) -> ChainSettings {
        ChainSettings {
            keywords: self.news.keywords.clone(),
            cap: self.news.cap,
            min_results: self.news.min_results,
            min_title_len: self.news.min_title_len,
            timeouts: self.timeouts(),
        }
    }

    /// API key after resolving "ENV"/absent against `$NEWS_API_KEY`.
    pub fn resolved_api_key(&self) -> Option<String> {
        let from_env = || std::env::var(ENV_NEWS_API_KEY).ok();
        let key = match self.newsapi.api_key.as_deref().map(str::trim) {
            None | Some("") => from_env(),
            Some(k) if k.eq_ignore_ascii_case("env") => from_env(),
            Some(k) => Some(k.to_string()),
        };
        key.filter(|k| !k.trim().is_empty())
    }

    /// Chain in priority order: keyed API, RSS feeds, keyword-gated story
    /// passes; broadening story passes last.
    pub fn build_chain(&self) -> SourceChain {
        let mut chain = SourceChain::new(self.chain_settings()).source(
            NewsApiProvider::new(self.resolved_api_key(), self.newsapi.categories.clone())
                .with_endpoint(self.newsapi.endpoint.clone()),
        );

        for f in &self.feeds {
            chain = chain.source(
                RssFeedProvider::new(f.name.clone(), f.url.clone())
                    .with_items_per_feed(self.news.items_per_feed)
                    .with_min_body_len(self.news.min_response_len),
            );
        }

        for pass in &self.story_passes {
            let p = StoryIndexProvider::new(
                pass.label.clone(),
                pass.index_url.clone(),
                pass.item_url.clone(),
                pass.max_ids,
            );
            chain = if pass.broadening {
                chain.broadening(p)
            } else {
                chain.source(p)
            };
        }
        chain
    }

    fn sanitize(mut self) -> Result<Self> {
        self.news.keywords = clean_list(self.news.keywords, true);
        self.newsapi.categories = clean_list(self.newsapi.categories, true);
        if self.news.keywords.is_empty() {
            return Err(anyhow!("news.keywords must not be empty"));
        }
        if self.news.cap == 0 {
            return Err(anyhow!("news.cap must be at least 1"));
        }
        if self.news.source_timeout_secs == 0 || self.news.item_timeout_secs == 0 {
            return Err(anyhow!("timeouts must be at least 1 second"));
        }
        for pass in &self.story_passes {
            if !pass.item_url.contains("{id}") {
                return Err(anyhow!(
                    "story pass '{}': item_url must contain {{id}}",
                    pass.label
                ));
            }
        }
        Ok(self)
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<BriefingConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading briefing config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing briefing config {}", path.display()))
}

/// Load config using env var + fallbacks:
/// 1) $BRIEFING_CONFIG_PATH
/// 2) config/briefing.toml
/// 3) config/briefing.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<BriefingConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("BRIEFING_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/briefing.toml");
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from("config/briefing.json");
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Ok(BriefingConfig::default())
}

pub fn parse_config(s: &str, hint_ext: &str) -> Result<BriefingConfig> {
    let looks_json = s.trim_start().starts_with('{');
    let cfg = if hint_ext == "json" || (hint_ext != "toml" && looks_json) {
        serde_json::from_str::<BriefingConfig>(s).context("invalid json config")?
    } else {
        toml::from_str::<BriefingConfig>(s).context("invalid toml config")?
    };
    cfg.sanitize()
}

/// Trim, drop empties, de-duplicate keeping first occurrence.
fn clean_list(items: Vec<String>, lowercase: bool) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if t.is_empty() {
            continue;
        }
        let t = if lowercase { t.to_lowercase() } else { t.to_string() };
        if !out.contains(&t) {
            out.push(t);
        }
    }
    out
}
