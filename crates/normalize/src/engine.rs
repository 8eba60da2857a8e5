//! The normalization loop. Recognized fields drain through a FIFO work
//! list; a handler with unmet dependencies goes to the back of the queue
//! once, then its field is dropped. Every field is therefore visited at
//! most twice regardless of wire order.

use std::collections::{HashSet, VecDeque};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

use funnel_core::{BuildContext, Document, RawEvent};

use crate::handler::{HandlerOutcome, Warning};
use crate::variant::SchemaVariant;

/// The merged document plus every non-fatal finding along the way.
#[derive(Debug)]
pub struct NormalizeOutcome {
    pub document: Document,
    pub warnings: Vec<Warning>,
}

/// Run `event` through `variant`'s field table on top of `base`.
pub fn normalize(
    variant: SchemaVariant,
    event: &RawEvent,
    ctx: &BuildContext,
    base: Document,
) -> NormalizeOutcome {
    let mut doc = base;
    let mut warnings = Vec::new();

    let mut queue: VecDeque<(String, Value)> = VecDeque::new();
    match variant.record(event) {
        Some(record) => {
            for (key, value) in record {
                if variant.recognizes(key) {
                    queue.push_back((key.clone(), value.clone()));
                } else {
                    variant.on_unrecognized(key, &mut warnings);
                }
            }
        }
        None => debug!(tag = variant.tag(), "Event carries no record to scan"),
    }

    let mut retried: HashSet<String> = HashSet::new();
    while let Some((key, value)) = queue.pop_front() {
        match variant.apply(&key, &value, event, &mut doc, &mut warnings) {
            HandlerOutcome::Applied => {}
            HandlerOutcome::Deferred => {
                if retried.insert(key.clone()) {
                    debug!(key = %key, "Dependencies not ready, requeueing field");
                    queue.push_back((key, value));
                } else {
                    warn!(key = %key, "Dropping field, dependencies never settled");
                    warnings.push(Warning::UnsatisfiedDependency { key });
                }
            }
        }
    }

    variant.finish(&mut doc, ctx);

    if !doc.contains_key("timestamp") {
        doc.insert("timestamp", Utc::now().timestamp_millis());
    }

    NormalizeOutcome { document: doc, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(body: Value) -> RawEvent {
        RawEvent::from_value(body).unwrap()
    }

    #[test]
    fn test_timestamp_injected_when_absent() {
        let ev = event(json!({"info": {"owner": "jdoe"}}));
        let out = normalize(
            SchemaVariant::BuildCompletion,
            &ev,
            &BuildContext::default(),
            Document::new(),
        );
        assert!(out.document.get_i64("timestamp").is_some());
    }

    #[test]
    fn test_timestamp_preserved_from_base() {
        let mut base = Document::new();
        base.insert("timestamp", 1483228800000i64);
        let ev = event(json!({"info": {}}));
        let out = normalize(SchemaVariant::BuildCompletion, &ev, &BuildContext::default(), base);
        assert_eq!(out.document.get_i64("timestamp"), Some(1483228800000));
    }

    #[test]
    fn test_missing_record_still_gets_markers() {
        // No "info" object at all: nothing to scan, markers still apply
        let ev = event(json!({"other": 1}));
        let out = normalize(
            SchemaVariant::BuildCompletion,
            &ev,
            &BuildContext::default(),
            Document::new(),
        );
        assert_eq!(out.document.get_str("Brew Built"), Some("true"));
    }

    #[test]
    fn test_unrecognized_key_policy_differs_by_variant() {
        let ev = event(json!({"info": {"mystery": 1}}));
        let out = normalize(
            SchemaVariant::BuildCompletion,
            &ev,
            &BuildContext::default(),
            Document::new(),
        );
        assert!(out
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::UnrecognizedField { key } if key == "mystery")));

        let ev = event(json!({"mystery": 1, "brew_task_id": "7"}));
        let out = normalize(
            SchemaVariant::TestResult,
            &ev,
            &BuildContext::default(),
            Document::new(),
        );
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_deferred_then_dropped_records_warning() {
        let ev = event(json!({
            "tests": [{"executor": "beaker", "arch": "", "executed": "1", "failed": "0"}]
        }));
        let out = normalize(
            SchemaVariant::TestResult,
            &ev,
            &BuildContext::default(),
            Document::new(),
        );
        assert!(!out.document.contains_key("beaker_job_1"));
        assert!(out
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::UnsatisfiedDependency { key } if key == "tests")));
    }
}
