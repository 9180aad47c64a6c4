//! Style document factory.
//!
//! # Responsibility
//! - Load the bundled default style document once per process.
//! - Resolve effective per-item-type styles (base item merged with the
//!   type-specific entry).
//!
//! # Invariants
//! - Callers always receive owned clones; the shared defaults are never
//!   mutated.
//! - `options` on an item style falls back to the base item, which falls back
//!   to the global `itemOptions`.

use crate::model::section::SectionType;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};

/// Keys that only ever come from the style side of an item.
pub const ITEM_STYLE_KEYS: &[&str] = &["hidden", "options", "icon"];
/// Keys that only ever come from the style side of a section.
pub const SECTION_STYLE_KEYS: &[&str] = &["hidden", "columns"];
/// Style-document key holding view-only custom sections between unzip and zip.
pub const RETAINED_SECTIONS_KEY: &str = "retainedSections";

static DEFAULT_STYLES: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("default_styles.json"))
        .expect("bundled default styles must be valid JSON")
});

/// Returns a fresh copy of the default style document.
pub fn default_styles() -> Value {
    DEFAULT_STYLES.clone()
}

/// Returns the object stored under `key`, or an empty map.
pub fn style_entry(styles: &Value, key: &str) -> Map<String, Value> {
    styles
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Returns the default style object stored under `key`.
pub fn default_entry(key: &str) -> Map<String, Value> {
    style_entry(&DEFAULT_STYLES, key)
}

fn base_item_style(styles: &Value) -> Map<String, Value> {
    let mut base = style_entry(styles, "baseItem");
    if !base.contains_key("options") {
        if let Some(options) = styles.get("itemOptions") {
            base.insert("options".to_string(), options.clone());
        }
    }
    base
}

/// Resolves the effective style applied to every item of `kind`.
pub fn item_style(styles: &Value, kind: SectionType) -> Map<String, Value> {
    let mut resolved = base_item_style(styles);
    let base_options = resolved.get("options").cloned();
    let specific = styles
        .get("items")
        .and_then(|items| items.get(kind.style_key()))
        .and_then(Value::as_object);

    if let Some(specific) = specific {
        for (key, value) in specific {
            resolved.insert(key.clone(), value.clone());
        }
    }
    match (resolved.get("options"), base_options) {
        (Some(Value::Null) | None, Some(options)) => {
            resolved.insert("options".to_string(), options);
        }
        _ => {}
    }
    resolved
}

/// Effective default style for items of `kind`.
pub fn default_item_style(kind: SectionType) -> Map<String, Value> {
    item_style(&DEFAULT_STYLES, kind)
}

/// Default type-specific entry under `items`, without the base merge.
pub fn default_item_entry(kind: SectionType) -> Map<String, Value> {
    DEFAULT_STYLES
        .get("items")
        .and_then(|items| items.get(kind.style_key()))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}
