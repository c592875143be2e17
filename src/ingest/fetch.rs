// src/ingest/fetch.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::ingest::types::SourceError;

const USER_AGENT: &str = concat!("daily-briefing/", env!("CARGO_PKG_VERSION"));

/// Fetch capability shared by all sources: GET a URL and return the body text.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String>;
}

/// Non-success HTTP status, kept typed so callers can tell auth failures apart.
#[derive(Debug, thiserror::Error)]
#[error("http status {0}")]
pub struct HttpStatus(pub u16);

/// Why a bounded fetch produced no body.
#[derive(Debug)]
pub enum FetchFailure {
    TimedOut(Duration),
    Status(u16),
    Other(anyhow::Error),
}

impl FetchFailure {
    /// Collapse into the error a source reports. `url` is only logged, without its query.
    pub fn into_source_error(self, name: &str, url: &str) -> SourceError {
        let url = redact_query(url);
        match self {
            FetchFailure::TimedOut(t) => {
                SourceError::unavailable(name, format!("timed out after {}s", t.as_secs_f32()))
            }
            FetchFailure::Status(code) => {
                tracing::debug!(target: "briefing", status = code, source = name, %url, "fetch rejected");
                SourceError::unavailable(name, format!("http {code}"))
            }
            FetchFailure::Other(e) => {
                tracing::debug!(target: "briefing", error = ?e, source = name, %url, "fetch failed");
                SourceError::unavailable(name, "fetch failed")
            }
        }
    }
}

/// Strip the query string (API keys travel there) so a URL is safe to log.
pub fn redact_query(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(mut u) => {
            let had_query = u.query().is_some();
            u.set_query(None);
            let mut out = u.to_string();
            if had_query {
                out.push_str("?<redacted>");
            }
            out
        }
        Err(_) => match url.split_once('?') {
            Some((base, _)) => format!("{base}?<redacted>"),
            None => url.to_string(),
        },
    }
}

/// Run one fetch under a hard timeout, keeping the failure kind.
pub async fn fetch_with_timeout(
    fetcher: &dyn Fetcher,
    url: &str,
    timeout: Duration,
) -> Result<String, FetchFailure> {
    match tokio::time::timeout(timeout, fetcher.get_text(url, timeout)).await {
        Ok(Ok(body)) => Ok(body),
        Ok(Err(e)) => match e.downcast_ref::<HttpStatus>() {
            Some(HttpStatus(code)) => Err(FetchFailure::Status(*code)),
            None => Err(FetchFailure::Other(e)),
        },
        Err(_) => Err(FetchFailure::TimedOut(timeout)),
    }
}

/// Run one fetch under a hard timeout and map every failure to a source error.
pub async fn fetch_bounded(
    fetcher: &dyn Fetcher,
    name: &str,
    url: &str,
    timeout: Duration,
) -> Result<String, SourceError> {
    fetch_with_timeout(fetcher, url, timeout)
        .await
        .map_err(|f| f.into_source_error(name, url))
}

/// reqwest-backed fetcher. Non-success statuses are [`HttpStatus`] errors.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String> {
        // reqwest errors embed the full URL; drop it and name the redacted one instead.
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("GET {}", redact_query(url)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(HttpStatus(status.as_u16()).into());
        }
        resp.text()
            .await
            .map_err(|e| e.without_url())
            .context("reading response body")
    }
}

// --- Test helper ---

/// Canned response of a [`StaticFetcher`] route.
#[derive(Debug, Clone)]
pub enum Canned {
    Body(String),
    Fail(String),
    /// Non-success HTTP status.
    Status(u16),
    /// Sleep before answering, to exercise timeouts.
    Slow(Duration, String),
}

/// In-memory fetcher: serves canned bodies by URL and records every request.
/// Unknown URLs fail like a 404.
pub struct StaticFetcher {
    routes: HashMap<String, Canned>,
    pub calls: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            calls: Mutex::new(vec![]),
        }
    }

    pub fn body(mut self, url: &str, body: impl Into<String>) -> Self {
        self.routes.insert(url.to_string(), Canned::Body(body.into()));
        self
    }

    pub fn fail(mut self, url: &str, reason: impl Into<String>) -> Self {
        self.routes.insert(url.to_string(), Canned::Fail(reason.into()));
        self
    }

    pub fn status(mut self, url: &str, code: u16) -> Self {
        self.routes.insert(url.to_string(), Canned::Status(code));
        self
    }

    pub fn slow(mut self, url: &str, delay: Duration, body: impl Into<String>) -> Self {
        self.routes
            .insert(url.to_string(), Canned::Slow(delay, body.into()));
        self
    }

    /// URLs requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn was_requested(&self, url: &str) -> bool {
        self.requested().iter().any(|u| u == url)
    }
}

impl Default for StaticFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn get_text(&self, url: &str, _timeout: Duration) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }
        match self.routes.get(url) {
            Some(Canned::Body(b)) => Ok(b.clone()),
            Some(Canned::Fail(reason)) => Err(anyhow!("{reason}")),
            Some(Canned::Status(code)) => Err(HttpStatus(*code).into()),
            Some(Canned::Slow(delay, b)) => {
                tokio::time::sleep(*delay).await;
                Ok(b.clone())
            }
            None => Err(anyhow!("404 Not Found: {}", redact_query(url))),
        }
    }
}
