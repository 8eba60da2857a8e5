//! ci-funnel: records one CI event in the metrics store.
//!
//! Normalizes the event named by `--ci-type`/`CI_TYPE`, merges it with any
//! document already stored under the same build identity and upserts the
//! result. Meant to run as a post-build or post-test step in a CI job.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use funnel_cli::cli::FunnelArgs;
use funnel_cli::pipeline;
use funnel_core::config::load_dotenv;
use funnel_core::event::RawEvent;
use funnel_store::{ArchLookup, HttpArchLookup, HttpDocStore, NullArchLookup};

#[tokio::main]
async fn main() -> Result<()> {
    // .env before parsing so env-backed flags can see it
    load_dotenv();
    let args = FunnelArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(if args.debug { "debug" } else { "info" })
            }),
        )
        .with_target(false)
        .init();

    let config = args.to_config()?;
    config.log_summary();

    let event_type = args
        .ci_type
        .clone()
        .context("No event type; pass --ci-type or set CI_TYPE")?;
    let payload = args
        .ci_message
        .clone()
        .context("No event payload; pass --ci-message or set CI_MESSAGE")?;
    let event = RawEvent::parse(&payload)?;

    let store = HttpDocStore::new(&config.store)?;
    let registry: Box<dyn ArchLookup> = match config.registry.base_url() {
        Some(url) => Box::new(HttpArchLookup::new(url, config.registry.timeout_secs)?),
        None => Box::new(NullArchLookup),
    };

    let report = pipeline::run(
        &event_type,
        &event,
        &config.build,
        &store,
        registry.as_ref(),
        args.dry_run,
    )
    .await?;

    if let Some(path) = &args.docid_file {
        pipeline::write_docid(path, &report.docid)
            .with_context(|| format!("Failed to write docid to {}", path.display()))?;
    }

    info!(docid = %report.docid, fields = report.document.len(), "Done");
    Ok(())
}
