//! Deep-merge of partial JSON onto a baseline content document.
//!
//! # Invariants
//! - Objects recurse key by key; every other patch value (arrays included)
//!   replaces the base value outright. Arrays are never concatenated.
//! - A patch that is not an object is an empty patch.
//! - [`merge_content`] never mutates its base; a failed validation leaves the
//!   caller's document untouched.

use crate::error::EngineResult;
use crate::validate::ensure_valid;
use log::{info, warn};
use serde_json::Value;

/// Merges `patch` onto `base` in place.
pub fn deep_merge(base: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        return;
    };
    if !base.is_object() {
        *base = Value::Object(Default::default());
    }
    let Value::Object(target) = base else {
        return;
    };
    for (key, value) in patch {
        match (target.get_mut(key), value) {
            (Some(existing @ Value::Object(_)), Value::Object(_)) => deep_merge(existing, value),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Returns `base` with `patch` merged in, without touching either input.
pub fn merged(base: &Value, patch: &Value) -> Value {
    let mut candidate = base.clone();
    deep_merge(&mut candidate, patch);
    candidate
}

/// Merges `patch` onto a content document and validates the candidate.
pub fn merge_content(base: &Value, patch: &Value) -> EngineResult<Value> {
    let candidate = merged(base, patch);
    match ensure_valid("merge", &candidate) {
        Ok(()) => {
            info!("event=content_merge module=merge status=ok");
            Ok(candidate)
        }
        Err(err) => {
            warn!(
                "event=content_merge module=merge status=error error_code={} issues={}",
                err.code(),
                err.issues().len()
            );
            Err(err)
        }
    }
}
