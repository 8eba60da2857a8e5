//! Build-completion events: field table over the nested `info` object.

use serde_json::Value;

use funnel_core::{BuildContext, Document, FieldValue, FunnelError, RawEvent};

use crate::handler::{apply_time, digit_i64, HandlerOutcome, Warning};
use crate::time;

pub(crate) enum FieldClass {
    /// Typed passthrough, no cap.
    Simple,
    /// Digits-only coercion with the -1 sentinel.
    Digit,
    /// Fractional build-system timestamp.
    Time,
    /// Recognized but deliberately not stored.
    Ignore,
    /// The task id, written under `brew_task_id`.
    TaskId,
}

pub(crate) fn classify(key: &str) -> Option<FieldClass> {
    match key {
        "weight" | "parent" | "waiting" | "awaited" | "label" | "owner" | "method" | "arch"
        | "result" => Some(FieldClass::Simple),
        "channel_id" | "priority" | "state" | "host_id" => Some(FieldClass::Digit),
        "start_time" | "create_time" | "completion_time" => Some(FieldClass::Time),
        "request" => Some(FieldClass::Ignore),
        "id" => Some(FieldClass::TaskId),
        _ => None,
    }
}

pub(crate) fn apply(
    key: &str,
    value: &Value,
    doc: &mut Document,
    warnings: &mut Vec<Warning>,
) -> HandlerOutcome {
    match classify(key) {
        Some(FieldClass::Simple) => doc.insert(key, FieldValue::from_json(value)),
        Some(FieldClass::Digit) => doc.insert(key, digit_i64(value)),
        Some(FieldClass::Time) => apply_time(key, value, time::parse_build, doc, warnings),
        Some(FieldClass::Ignore) => {}
        Some(FieldClass::TaskId) => doc.insert("brew_task_id", digit_i64(value)),
        None => {}
    }
    HandlerOutcome::Applied
}

/// `{name}-{version}-{release}-{taskId}`. Name, version and release must
/// all be in the context; the task id degrades to -1 when `info.id` is
/// absent or not numeric.
pub(crate) fn derive_id(event: &RawEvent, ctx: &BuildContext) -> Result<String, FunnelError> {
    let nvr = ctx.nvr().ok_or_else(|| {
        FunnelError::MissingIdentity("build events need name, version and release".to_string())
    })?;
    let task_id = event
        .nested_object("info")
        .and_then(|info| info.get("id"))
        .map(digit_i64)
        .unwrap_or(-1);
    Ok(format!("{}-{}", nvr, task_id))
}

pub(crate) fn finish(doc: &mut Document, ctx: &BuildContext) {
    if let Some(nvr) = ctx.nvr() {
        doc.insert("nvr", nvr);
    }
    doc.insert("Brew Built", "true");
    if let Some(scratch) = ctx.scratch.as_deref().filter(|s| !s.is_empty()) {
        doc.insert("scratch", scratch);
    }
    if let Some(target) = ctx.target.as_deref().filter(|t| !t.is_empty()) {
        doc.insert("target", target);
    }
}
