//! funnel-coverage: flags packages with no CI results in the metrics index.
//!
//! Takes a package list and a distro label, asks the store which package
//! names already have documents and inserts a marker for every listed
//! package without one, plus a final coverage-percent summary.

use std::fs;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{debug, info};

use funnel_core::config::{StoreConfig, DEFAULT_INDEX};
use funnel_core::document::{Document, FieldValue};
use funnel_store::{DocStore, HttpDocStore};

// ── CLI ─────────────────────────────────────────────────────────────

/// Report CI coverage gaps for a package list.
#[derive(Parser, Debug)]
#[command(name = "funnel-coverage", about)]
struct Cli {
    /// File containing the package names to check, one per line
    #[arg(short = 'f', long)]
    file: Option<String>,

    /// Distro to record in base_distro on every marker
    #[arg(short = 'd', long)]
    distro: Option<String>,

    /// Field key that carries the untested package name
    #[arg(short = 'k', long)]
    key: Option<String>,

    /// Elastic Search server to use
    #[arg(short = 'e', long)]
    elastic: Option<String>,

    /// Index being processed
    #[arg(long, default_value = DEFAULT_INDEX)]
    ci_index: String,

    /// Store request timeout in seconds
    #[arg(long, default_value_t = 10)]
    store_timeout: u64,

    /// Don't actually do anything
    #[arg(long)]
    dry_run: bool,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let (Some(file), Some(distro), Some(key)) = (&cli.file, &cli.distro, &cli.key) else {
        bail!("You must provide a package file, a distro and a field key");
    };
    let Some(elastic) = &cli.elastic else {
        bail!("You must specify an Elastic Search server (--elastic)");
    };

    let listing = fs::read_to_string(file)
        .with_context(|| format!("Failed to read package list {}", file))?;
    let packages: Vec<&str> = listing.lines().filter(|l| !l.is_empty()).collect();
    if packages.is_empty() {
        bail!("Package list {} is empty", file);
    }

    let store = HttpDocStore::new(&StoreConfig {
        host: elastic.clone(),
        index: cli.ci_index.clone(),
        doc_type: funnel_core::config::DEFAULT_DOC_TYPE.to_string(),
        timeout_secs: cli.store_timeout,
    })?;

    // Single-character buckets are aggregation noise, not package names
    let tested: Vec<String> = store
        .terms("name.raw", 200)
        .await?
        .into_iter()
        .filter(|name| name.len() > 1)
        .collect();
    debug!(tested = tested.len(), listed = packages.len(), "Comparing coverage");

    let mut untested = 0usize;
    for pkg in &packages {
        if tested.iter().any(|t| t == pkg) {
            continue;
        }
        untested += 1;
        let mut marker = Document::new();
        marker.insert(key.clone(), *pkg);
        marker.insert("timestamp", Utc::now().timestamp() * 1000);
        marker.insert("base_distro", distro.clone());
        marker.insert("CI Testing Done", "false");
        if cli.dry_run {
            info!(package = %pkg, "Dry run, would flag as untested");
        } else {
            store.insert(&marker).await?;
            debug!(package = %pkg, "Flagged as untested");
        }
    }

    let percent = (packages.len() - untested) as f64 / packages.len() as f64 * 100.0;
    let mut summary = Document::new();
    summary.insert(key.replace("_not", "") + "_percent", FieldValue::Float(percent));
    summary.insert("base_distro", distro.clone());
    summary.insert("timestamp", Utc::now().timestamp() * 1000);
    if cli.dry_run {
        info!(percent, "Dry run, not inserting the summary");
    } else {
        store.insert(&summary).await?;
    }

    info!(
        listed = packages.len(),
        untested,
        percent,
        "Coverage report complete"
    );
    Ok(())
}
