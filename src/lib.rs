// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod digest;
pub mod ingest;

// ---- Re-exports for stable public API ----
pub use crate::ingest::chain::{ChainReport, ChainSettings, SourceChain};
pub use crate::ingest::config::{load_config_default, BriefingConfig};
pub use crate::ingest::fetch::{Fetcher, HttpFetcher};
pub use crate::ingest::types::{AcceptedItem, RawItem, SourceError, SourceProvider};

use tracing::info;

/// Build the configured chain and run it once over HTTP.
///
/// Never fails because of a source; errors here come from building the client.
pub async fn run_briefing(cfg: &BriefingConfig) -> anyhow::Result<ChainReport> {
    let fetcher = HttpFetcher::new()?;
    let chain = cfg.build_chain();
    let report = chain.run(&fetcher).await;
    info!(
        target: "briefing",
        queried = report.queried.len(),
        broadened = report.broadened,
        "briefing ready"
    );
    Ok(report)
}
