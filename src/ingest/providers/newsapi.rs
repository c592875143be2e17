// src/ingest/providers/newsapi.rs
//! Keyed top-headlines source (NewsAPI.org shape). Without a key the source
//! does not apply and reports `AuthMissing`.

use async_trait::async_trait;
use serde::Deserialize;

use crate::ingest::fetch::{fetch_with_timeout, FetchFailure, Fetcher};
use crate::ingest::filter::Collector;
use crate::ingest::types::{RawItem, SourceError, SourceProvider, Timeouts};

pub const NEWSAPI_TOP_HEADLINES: &str = "https://newsapi.org/v2/top-headlines";
const FALLBACK_SOURCE_NAME: &str = "News";

/// Error codes meaning the key itself is unusable, as opposed to a transient failure.
const AUTH_ERROR_CODES: &[&str] = &["apiKeyInvalid", "apiKeyMissing", "apiKeyDisabled"];

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    source: Option<ArticleSource>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewsApiProvider {
    name: String,
    endpoint: String,
    api_key: Option<String>,
    categories: Vec<String>,
}

impl NewsApiProvider {
    pub fn new(api_key: Option<String>, categories: Vec<String>) -> Self {
        Self {
            name: "NewsAPI".to_string(),
            endpoint: NEWSAPI_TOP_HEADLINES.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            categories,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn url_for(&self, category: &str, key: &str) -> String {
        format!(
            "{}?category={category}&language=en&apiKey={key}",
            self.endpoint
        )
    }

    fn auth_missing(&self) -> SourceError {
        SourceError::AuthMissing {
            name: self.name.clone(),
        }
    }

    async fn collect_category(
        &self,
        fetcher: &dyn Fetcher,
        url: &str,
        timeouts: Timeouts,
        sink: &mut Collector,
    ) -> Result<(), SourceError> {
        let body = match fetch_with_timeout(fetcher, url, timeouts.source).await {
            Ok(body) => body,
            Err(FetchFailure::Status(401)) => return Err(self.auth_missing()),
            Err(f) => return Err(f.into_source_error(&self.name, url)),
        };
        if body.trim().is_empty() {
            return Err(SourceError::unavailable(&self.name, "empty response"));
        }
        let resp: Response = serde_json::from_str(&body)
            .map_err(|e| SourceError::parse(&self.name, format!("json: {e}")))?;
        if resp
            .code
            .as_deref()
            .is_some_and(|c| AUTH_ERROR_CODES.contains(&c))
        {
            return Err(self.auth_missing());
        }
        if resp.status != "ok" {
            let why = resp.message.unwrap_or_else(|| format!("status {}", resp.status));
            return Err(SourceError::unavailable(&self.name, why));
        }

        for a in resp.articles {
            let Some(title) = a.title.filter(|t| !t.trim().is_empty()) else {
                continue;
            };
            let source = a
                .source
                .and_then(|s| s.name)
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_SOURCE_NAME.to_string());
            let item = RawItem {
                source,
                title,
                snippet: a.description,
            };
            if sink.offer(item).is_break() {
                break;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SourceProvider for NewsApiProvider {
    async fn collect(
        &self,
        fetcher: &dyn Fetcher,
        timeouts: Timeouts,
        sink: &mut Collector,
    ) -> Result<(), SourceError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(self.auth_missing());
        };

        // A category failing is fine as long as another one answered.
        let mut first_err = None;
        let mut any_ok = false;
        for category in &self.categories {
            if sink.is_full() {
                break;
            }
            let url = self.url_for(category, key);
            match self.collect_category(fetcher, &url, timeouts, sink).await {
                Ok(()) => any_ok = true,
                // A rejected key fails every category the same way.
                Err(e) if e.is_auth_missing() => return Err(e),
                Err(e) => {
                    tracing::debug!(target: "briefing", error = %e, %category, "category failed");
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) if !any_ok => Err(e),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
