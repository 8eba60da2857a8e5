//! Schema variants: one per recognized event type. Each variant owns its
//! field table, its identity rule and its finish markers.

mod build;
mod test_result;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use funnel_core::{BuildContext, Document, FunnelError, RawEvent};

use crate::handler::{HandlerOutcome, Warning};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    /// Build-system task completion ("brew-taskstatechange").
    BuildCompletion,
    /// CI test-run results ("ci-metricsdata").
    TestResult,
}

impl SchemaVariant {
    /// Wire tag that selects this variant.
    pub fn tag(&self) -> &'static str {
        match self {
            SchemaVariant::BuildCompletion => "brew-taskstatechange",
            SchemaVariant::TestResult => "ci-metricsdata",
        }
    }

    /// Derive the document id for `event`. Fails when the parts the rule
    /// needs are absent.
    pub fn derive_id(&self, event: &RawEvent, ctx: &BuildContext) -> Result<String, FunnelError> {
        match self {
            SchemaVariant::BuildCompletion => build::derive_id(event, ctx),
            SchemaVariant::TestResult => test_result::derive_id(event),
        }
    }

    /// The slice of the event this variant scans for fields.
    pub(crate) fn record<'a>(&self, event: &'a RawEvent) -> Option<&'a Map<String, Value>> {
        match self {
            SchemaVariant::BuildCompletion => event.nested_object("info"),
            SchemaVariant::TestResult => Some(event.as_object()),
        }
    }

    pub(crate) fn recognizes(&self, key: &str) -> bool {
        match self {
            SchemaVariant::BuildCompletion => build::classify(key).is_some(),
            SchemaVariant::TestResult => test_result::classify(key).is_some(),
        }
    }

    /// Policy for keys outside the field table. Build events carry a fixed
    /// schema, so a stray key is worth a warning; test events routinely
    /// haul transport metadata and only get a debug line.
    pub(crate) fn on_unrecognized(&self, key: &str, warnings: &mut Vec<Warning>) {
        match self {
            SchemaVariant::BuildCompletion => {
                warn!(key = %key, "Unrecognized field in build event");
                warnings.push(Warning::UnrecognizedField { key: key.to_string() });
            }
            SchemaVariant::TestResult => {
                debug!(key = %key, "Skipping non-schema field in test event");
            }
        }
    }

    pub(crate) fn apply(
        &self,
        key: &str,
        value: &Value,
        event: &RawEvent,
        doc: &mut Document,
        warnings: &mut Vec<Warning>,
    ) -> HandlerOutcome {
        match self {
            SchemaVariant::BuildCompletion => build::apply(key, value, doc, warnings),
            SchemaVariant::TestResult => test_result::apply(key, value, event, doc, warnings),
        }
    }

    /// Markers and context fields written after the field loop.
    pub(crate) fn finish(&self, doc: &mut Document, ctx: &BuildContext) {
        match self {
            SchemaVariant::BuildCompletion => build::finish(doc, ctx),
            SchemaVariant::TestResult => test_result::finish(doc),
        }
    }
}
