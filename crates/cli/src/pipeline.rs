//! One event end to end: identify, fetch, normalize, enrich, upsert.

use std::io;
use std::path::Path;

use anyhow::Result;
use tracing::{debug, info};

use funnel_core::config::BuildContext;
use funnel_core::document::Document;
use funnel_core::event::RawEvent;
use funnel_normalize::{normalize, SchemaVariant, VariantRegistry};
use funnel_store::{ArchLookup, DocStore, StoreError};

/// What a run produced, for the final log line and the docid file.
pub struct RunReport {
    pub docid: String,
    pub document: Document,
}

/// Push one event through the pipeline. A dry run skips every write but
/// keeps the reads, so the merged document can still be inspected.
pub async fn run(
    event_type: &str,
    event: &RawEvent,
    ctx: &BuildContext,
    store: &dyn DocStore,
    registry: &dyn ArchLookup,
    dry_run: bool,
) -> Result<RunReport> {
    let variant = VariantRegistry::new().select(event_type)?;
    let docid = variant.derive_id(event, ctx)?;
    debug!(docid = %docid, tag = event_type, "Derived document identity");

    store.ensure_index(!dry_run).await?;

    let base = match store.fetch(&docid).await? {
        Some(stored) => {
            debug!(docid = %docid, "Merging with stored document");
            stored
        }
        None => Document::new(),
    };

    let outcome = normalize(variant, event, ctx, base);
    let mut document = outcome.document;
    if !outcome.warnings.is_empty() {
        debug!(
            docid = %docid,
            warnings = outcome.warnings.len(),
            "Normalization produced warnings"
        );
    }

    // Arch enrichment applies to the build variant only; the field is
    // written even when the registry has nothing to say.
    if variant == SchemaVariant::BuildCompletion {
        document.insert("expected_archs", lookup_archs(registry, ctx).await?);
    }

    debug!(docid = %docid, payload = %document.to_json(), "Outgoing document");

    if dry_run {
        info!(docid = %docid, "Dry run, not upserting");
    } else {
        store.upsert(&docid, &document).await?;
        info!(docid = %docid, "Document upserted");
    }

    Ok(RunReport { docid, document })
}

async fn lookup_archs(
    registry: &dyn ArchLookup,
    ctx: &BuildContext,
) -> Result<String, StoreError> {
    match (&ctx.name, &ctx.version, &ctx.release) {
        (Some(name), Some(version), Some(release)) => {
            registry.expected_archs(name, version, release).await
        }
        // Identity derivation already required the full NVR; nothing to ask
        _ => Ok(String::new()),
    }
}

/// Record the derived identity for downstream pipeline steps.
pub fn write_docid(path: &Path, docid: &str) -> io::Result<()> {
    std::fs::write(path, format!("{}\n", docid))
}
