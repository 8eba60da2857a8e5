//! Test-result events: field table over the top-level object, including
//! the deferrable `tests` handler.

use serde_json::Value;
use tracing::{debug, warn};

use funnel_core::{Document, FieldValue, FunnelError, RawEvent};

use crate::handler::{
    apply_time, capped_field, digit_i64, scalar_string, HandlerOutcome, Warning,
};
use crate::time;

const VALID_TRIGGERS: &[&str] =
    &["manual", "git", "commit", "git push", "rhpkg build", "brew build"];
const VALID_BUILD_TYPES: &[&str] = &["official", "scratch"];
const VALID_EXECUTORS: &[&str] = &["beaker", "ciosp"];

pub(crate) enum FieldClass {
    Component,
    Trigger,
    BuildType,
    Time,
    Digit,
    Capped(usize),
    Simple,
    Tests,
}

pub(crate) fn classify(key: &str) -> Option<FieldClass> {
    match key {
        "component" => Some(FieldClass::Component),
        "trigger" => Some(FieldClass::Trigger),
        "build_type" => Some(FieldClass::BuildType),
        "create_time" | "completion_time" => Some(FieldClass::Time),
        "compose_id" | "CI_tier" => Some(FieldClass::Digit),
        "owner" => Some(FieldClass::Capped(64)),
        "base_distro" | "job_names" => Some(FieldClass::Capped(256)),
        "CI_infra_failure_desc" => Some(FieldClass::Capped(1024)),
        "jenkins_job_url" | "jenkins_build_url" | "CI_infra_failure" | "content-length"
        | "destination" | "expires" | "xunit_links" => Some(FieldClass::Simple),
        "tests" => Some(FieldClass::Tests),
        _ => None,
    }
}

pub(crate) fn apply(
    key: &str,
    value: &Value,
    event: &RawEvent,
    doc: &mut Document,
    warnings: &mut Vec<Warning>,
) -> HandlerOutcome {
    match classify(key) {
        Some(FieldClass::Component) => apply_component(value, doc, warnings),
        Some(FieldClass::Trigger) => apply_enum(key, value, VALID_TRIGGERS, doc),
        Some(FieldClass::BuildType) => apply_enum(key, value, VALID_BUILD_TYPES, doc),
        Some(FieldClass::Time) => apply_time(key, value, time::parse_iso, doc, warnings),
        Some(FieldClass::Digit) => doc.insert(key, digit_i64(value)),
        Some(FieldClass::Capped(max)) => doc.insert(key, capped_field(value, max)),
        Some(FieldClass::Simple) => doc.insert(key, FieldValue::from_json(value)),
        Some(FieldClass::Tests) => return apply_tests(value, event, doc, warnings),
        None => {}
    }
    HandlerOutcome::Applied
}

/// Components follow the name-version-release convention, so fewer than
/// two dashes is suspect. The value is written regardless.
fn apply_component(value: &Value, doc: &mut Document, warnings: &mut Vec<Warning>) {
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if rendered.matches('-').count() < 2 {
        warn!(component = %rendered, "Component does not look like an NVR");
        warnings.push(Warning::MalformedComponent { value: rendered });
    }
    doc.insert("component", capped_field(value, 256));
}

/// Closed-set field: members are written verbatim, everything else is
/// omitted without a warning.
fn apply_enum(key: &str, value: &Value, members: &[&str], doc: &mut Document) {
    match value.as_str().filter(|s| members.contains(s)) {
        Some(s) => doc.insert(key, s),
        None => debug!(key = %key, "Value outside the closed set, omitting field"),
    }
}

/// Per-executor result records. Needs the normalized `create_time` and
/// `completion_time` already in the document; defers until they are.
fn apply_tests(
    value: &Value,
    event: &RawEvent,
    doc: &mut Document,
    warnings: &mut Vec<Warning>,
) -> HandlerOutcome {
    if !doc.contains_key("create_time") || !doc.contains_key("completion_time") {
        return HandlerOutcome::Deferred;
    }

    let Some(records) = value.as_array() else {
        warn!("tests value is not an array, skipping");
        warnings.push(Warning::MalformedRecord { detail: "tests value is not an array".to_string() });
        return HandlerOutcome::Applied;
    };

    for record in records {
        let Some(fields) = record.as_object() else {
            warn!("test record is not an object, skipping");
            warnings.push(Warning::MalformedRecord { detail: "test record is not an object".to_string() });
            continue;
        };
        let Some(executor) = fields.get("executor").and_then(Value::as_str) else {
            warn!("test record has no executor, skipping");
            warnings.push(Warning::MalformedRecord { detail: "test record has no executor".to_string() });
            continue;
        };
        if !VALID_EXECUTORS.contains(&executor) {
            debug!(executor = %executor, "Unknown executor, skipping record");
            continue;
        }

        let slot = next_slot(doc, executor);
        let job_name = event
            .get("job_names")
            .and_then(scalar_string)
            .unwrap_or_else(|| format!("DUMMY_{}", slot));
        let arch = fields.get("arch").and_then(scalar_string).unwrap_or_default();
        let executed = fields.get("executed").map(digit_i64).unwrap_or(-1);
        let failed = fields.get("failed").map(digit_i64).unwrap_or(-1);

        let create = time::canonical_or_epoch(doc.get_str("create_time"));
        let completion = time::canonical_or_epoch(doc.get_str("completion_time"));
        let time_spent = (completion - create).num_seconds().max(0);

        doc.insert(format!("{}_job_{}", executor, slot), job_name);
        doc.insert(format!("{}_arch_{}", executor, slot), arch);
        doc.insert(format!("{}_tests_exec_{}", executor, slot), executed);
        doc.insert(format!("{}_tests_failed_{}", executor, slot), failed);
        doc.insert(format!("{}_time_spent_{}", executor, slot), time_spent);
    }
    HandlerOutcome::Applied
}

/// Slot allocation continues from whatever the document already holds,
/// merged base included.
fn next_slot(doc: &Document, executor: &str) -> usize {
    let prefix = format!("{}_job_", executor);
    doc.keys().filter(|k| k.starts_with(&prefix)).count() + 1
}

/// `{component}-{brewTaskId}`, both verbatim. Missing or non-scalar parts
/// make the event unidentifiable.
pub(crate) fn derive_id(event: &RawEvent) -> Result<String, FunnelError> {
    let component = event.get("component").and_then(scalar_string).ok_or_else(|| {
        FunnelError::MissingIdentity("test events need a scalar component".to_string())
    })?;
    let task_id = event.get("brew_task_id").and_then(scalar_string).ok_or_else(|| {
        FunnelError::MissingIdentity("test events need a scalar brew_task_id".to_string())
    })?;
    Ok(format!("{}-{}", component, task_id))
}

pub(crate) fn finish(doc: &mut Document) {
    doc.insert("CI Testing Done", "true");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(body: Value) -> RawEvent {
        RawEvent::from_value(body).unwrap()
    }

    fn timed_doc() -> Document {
        let mut doc = Document::new();
        doc.insert("create_time", "2017-01-19T14:25:45Z");
        doc.insert("completion_time", "2017-01-19T14:33:43Z");
        doc
    }

    #[test]
    fn test_derive_id_verbatim() {
        let ev = event(json!({"component": "kernel-3.10.0-547.el7", "brew_task_id": "12388882"}));
        assert_eq!(derive_id(&ev).unwrap(), "kernel-3.10.0-547.el7-12388882");
        // Numeric task ids render through their JSON text
        let ev = event(json!({"component": "kernel-3.10.0-547.el7", "brew_task_id": 12388882}));
        assert_eq!(derive_id(&ev).unwrap(), "kernel-3.10.0-547.el7-12388882");
    }

    #[test]
    fn test_derive_id_missing_parts_fail() {
        let ev = event(json!({"brew_task_id": "1"}));
        assert!(matches!(derive_id(&ev), Err(FunnelError::MissingIdentity(_))));
        let ev = event(json!({"component": "a-b-c", "brew_task_id": null}));
        assert!(matches!(derive_id(&ev), Err(FunnelError::MissingIdentity(_))));
    }

    #[test]
    fn test_component_dash_rule() {
        let mut doc = Document::new();
        let mut warnings = Vec::new();
        apply_component(&json!("kernel"), &mut doc, &mut warnings);
        assert_eq!(doc.get_str("component"), Some("kernel"));
        assert_eq!(warnings.len(), 1);

        let mut doc = Document::new();
        let mut warnings = Vec::new();
        apply_component(&json!("kernel-3.10.0-547.el7"), &mut doc, &mut warnings);
        assert_eq!(doc.get_str("component"), Some("kernel-3.10.0-547.el7"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_enum_fields_are_closed() {
        let mut doc = Document::new();
        apply_enum("trigger", &json!("git push"), VALID_TRIGGERS, &mut doc);
        assert_eq!(doc.get_str("trigger"), Some("git push"));

        let mut doc = Document::new();
        apply_enum("trigger", &json!("cron"), VALID_TRIGGERS, &mut doc);
        assert!(!doc.contains_key("trigger"));
        apply_enum("build_type", &json!("nightly"), VALID_BUILD_TYPES, &mut doc);
        assert!(!doc.contains_key("build_type"));
        apply_enum("build_type", &json!(7), VALID_BUILD_TYPES, &mut doc);
        assert!(!doc.contains_key("build_type"));
    }

    #[test]
    fn test_tests_defer_without_times() {
        let mut doc = Document::new();
        let mut warnings = Vec::new();
        let ev = event(json!({}));
        let outcome = apply_tests(
            &json!([{"executor": "beaker", "arch": "x86_64", "executed": "1", "failed": "0"}]),
            &ev,
            &mut doc,
            &mut warnings,
        );
        assert_eq!(outcome, HandlerOutcome::Deferred);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_tests_slot_fields() {
        let mut doc = timed_doc();
        let mut warnings = Vec::new();
        let ev = event(json!({}));
        let outcome = apply_tests(
            &json!([{"executor": "beaker", "arch": "x86_64", "executed": "60", "failed": "5"}]),
            &ev,
            &mut doc,
            &mut warnings,
        );
        assert_eq!(outcome, HandlerOutcome::Applied);
        assert_eq!(doc.get_str("beaker_job_1"), Some("DUMMY_1"));
        assert_eq!(doc.get_str("beaker_arch_1"), Some("x86_64"));
        assert_eq!(doc.get_i64("beaker_tests_exec_1"), Some(60));
        assert_eq!(doc.get_i64("beaker_tests_failed_1"), Some(5));
        assert_eq!(doc.get_i64("beaker_time_spent_1"), Some(478));
    }

    #[test]
    fn test_tests_job_name_from_event() {
        let mut doc = timed_doc();
        let mut warnings = Vec::new();
        let ev = event(json!({"job_names": "kernel-general-rhel-kmod"}));
        apply_tests(
            &json!([{"executor": "ciosp", "arch": "s390x", "executed": "3", "failed": "0"}]),
            &ev,
            &mut doc,
            &mut warnings,
        );
        assert_eq!(doc.get_str("ciosp_job_1"), Some("kernel-general-rhel-kmod"));
    }

    #[test]
    fn test_tests_unknown_executor_skipped() {
        let mut doc = timed_doc();
        let mut warnings = Vec::new();
        let ev = event(json!({}));
        apply_tests(
            &json!([{"executor": "jenkins", "executed": "1", "failed": "0"}]),
            &ev,
            &mut doc,
            &mut warnings,
        );
        assert!(!doc.keys().any(|k| k.starts_with("jenkins_")));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_tests_malformed_records() {
        let mut doc = timed_doc();
        let mut warnings = Vec::new();
        let ev = event(json!({}));
        let outcome = apply_tests(&json!("not an array"), &ev, &mut doc, &mut warnings);
        assert_eq!(outcome, HandlerOutcome::Applied);
        assert_eq!(warnings.len(), 1);

        let mut warnings = Vec::new();
        apply_tests(&json!([42, {"no_executor": true}]), &ev, &mut doc, &mut warnings);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_tests_negative_span_clamps_to_zero() {
        let mut doc = Document::new();
        doc.insert("create_time", "2017-01-19T14:33:43Z");
        doc.insert("completion_time", "2017-01-19T14:25:45Z");
        let mut warnings = Vec::new();
        let ev = event(json!({}));
        apply_tests(
            &json!([{"executor": "beaker", "arch": "", "executed": "1", "failed": "0"}]),
            &ev,
            &mut doc,
            &mut warnings,
        );
        assert_eq!(doc.get_i64("beaker_time_spent_1"), Some(0));
    }
}
