//! Daily briefing — binary entrypoint.
//! Loads config, runs the news chain once and prints the digest.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use daily_briefing::{digest, load_config_default, run_briefing};

/// Compact logs on stderr; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("briefing=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; NEWS_API_KEY and BRIEFING_CONFIG_PATH may live there.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = load_config_default().context("loading briefing config")?;
    let report = run_briefing(&cfg).await?;

    if let Some(e) = report.first_error() {
        tracing::debug!(target: "briefing", error = %e, total = report.errors.len(), "first source error");
    }

    println!("{}", digest::render_text(&report.items));
    Ok(())
}
