//! View composition: content + styles <-> view.
//!
//! # Responsibility
//! - `zip` overlays style onto content at every structural position.
//! - `unzip` strips style-only keys to recover content and samples one style
//!   document back out of the view.
//! - Keys outside the style key sets stay on the content side, including
//!   unknown extras on sections and custom sections.
//!
//! # Invariants
//! - Style keys win on collision during `zip`.
//! - Style recovery samples the first item of each item type (native section
//!   first, then custom sections of that type) and falls back to the bundled
//!   defaults. `zip(unzip(v)) == v` therefore only holds for views built with
//!   uniform per-type styling.
//! - Custom sections whose type is not a built-in section type never reach
//!   content. They ride along in the style document under
//!   [`RETAINED_SECTIONS_KEY`] with the id of the section they followed, and
//!   `zip` puts them back at that position. They are never dropped and never
//!   duplicated.

use crate::model::content::empty_content;
use crate::model::section::SectionType;
use crate::model::styles::{
    default_entry, default_item_entry, default_styles, item_style, style_entry,
    ITEM_STYLE_KEYS, RETAINED_SECTIONS_KEY, SECTION_STYLE_KEYS,
};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Result of [`unzip`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unzipped {
    pub content: Value,
    pub styles: Value,
}

fn overlay(base: Option<&Value>, style: &Map<String, Value>) -> Value {
    let mut merged = base.and_then(Value::as_object).cloned().unwrap_or_default();
    for (key, value) in style {
        merged.insert(key.clone(), value.clone());
    }
    Value::Object(merged)
}

fn overlay_items(items: Option<&Value>, style: &Map<String, Value>) -> Value {
    let items = items.and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
    Value::Array(items.iter().map(|item| overlay(Some(item), style)).collect())
}

fn without(value: &Value, keys: &[&str]) -> Value {
    let mut map = value.as_object().cloned().unwrap_or_default();
    for key in keys {
        map.remove(*key);
    }
    Value::Object(map)
}

fn pick(value: Option<&Value>, keys: &[&str]) -> Value {
    let mut map = Map::new();
    if let Some(source) = value {
        for key in keys {
            if let Some(field) = source.get(*key) {
                map.insert((*key).to_string(), field.clone());
            }
        }
    }
    Value::Object(map)
}

fn strip_items(items: Option<&Value>) -> Value {
    let items = items.and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
    Value::Array(items.iter().map(|item| without(item, ITEM_STYLE_KEYS)).collect())
}

fn declared_type(section: &Value) -> Option<SectionType> {
    section
        .get("type")
        .and_then(Value::as_str)
        .and_then(SectionType::parse)
}

/// Composes content and styles into a view.
pub fn zip(content: &Value, styles: &Value) -> Value {
    let mut view = Map::new();

    view.insert(
        "picture".to_string(),
        overlay(content.get("picture"), &style_entry(styles, "picture")),
    );

    let mut basics = content
        .get("basics")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let field_style = style_entry(styles, "customField");
    let fields = overlay_items(basics.get("customFields"), &field_style);
    basics.insert("customFields".to_string(), fields);
    view.insert("basics".to_string(), Value::Object(basics));

    view.insert(
        "summary".to_string(),
        overlay(content.get("summary"), &style_entry(styles, "summary")),
    );

    let section_style = style_entry(styles, "section");
    let mut sections = Map::new();
    for kind in SectionType::ALL {
        let Some(section) = content.get("sections").and_then(|all| all.get(kind.as_str())) else {
            continue;
        };
        let mut zipped = overlay(Some(section), &section_style);
        zipped["items"] = overlay_items(section.get("items"), &item_style(styles, kind));
        sections.insert(kind.as_str().to_string(), zipped);
    }
    view.insert("sections".to_string(), Value::Object(sections));

    let custom_style = style_entry(styles, "customSection");
    let mut custom: Vec<Value> = content
        .get("customSections")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .map(|section| {
            let mut zipped = overlay(Some(section), &custom_style);
            if let Some(kind) = declared_type(section) {
                zipped["items"] = overlay_items(section.get("items"), &item_style(styles, kind));
            }
            zipped
        })
        .collect();
    restore_retained(&mut custom, styles.get(RETAINED_SECTIONS_KEY));
    view.insert("customSections".to_string(), Value::Array(custom));

    view.insert(
        "metadata".to_string(),
        overlay(content.get("metadata"), &style_entry(styles, "metadata")),
    );

    Value::Object(view)
}

fn section_id(section: &Value) -> Option<&str> {
    section.get("id").and_then(Value::as_str)
}

fn restore_retained(custom: &mut Vec<Value>, retained: Option<&Value>) {
    let Some(entries) = retained.and_then(Value::as_array) else {
        return;
    };
    for entry in entries {
        let Some(section) = entry.get("section") else {
            continue;
        };
        if let Some(id) = section_id(section) {
            if custom.iter().any(|existing| section_id(existing) == Some(id)) {
                continue;
            }
        }
        let position = match entry.get("after").and_then(Value::as_str) {
            None => 0,
            Some(anchor) => custom
                .iter()
                .position(|existing| section_id(existing) == Some(anchor))
                .map_or(custom.len(), |index| index + 1),
        };
        custom.insert(position, section.clone());
    }
}

fn first_item_of<'v>(view: &'v Value, kind: SectionType) -> Option<&'v Value> {
    let native = view
        .get("sections")
        .and_then(|sections| sections.get(kind.as_str()))
        .and_then(|section| section.get("items"))
        .and_then(Value::as_array)
        .and_then(|items| items.first());
    native.or_else(|| {
        view.get("customSections")?
            .as_array()?
            .iter()
            .filter(|section| declared_type(section) == Some(kind))
            .find_map(|section| section.get("items")?.as_array()?.first())
    })
}

/// Overwrites each fallback key with the sample's value when present.
fn sample_keys(mut fallback: Map<String, Value>, sample: Option<&Value>) -> Value {
    if let Some(sample) = sample {
        let keys: Vec<String> = fallback.keys().cloned().collect();
        for key in keys {
            match sample.get(&key) {
                Some(Value::Null) | None => {}
                Some(value) => {
                    fallback.insert(key, value.clone());
                }
            }
        }
    }
    Value::Object(fallback)
}

fn style_keys_of(value: Option<&Value>, content_keys: &[&str]) -> Value {
    value.map_or_else(|| json!({}), |value| without(value, content_keys))
}

/// Splits a view into content and an approximated style document.
pub fn unzip(view: &Value) -> Unzipped {
    Unzipped {
        content: unzip_content(view),
        styles: unzip_styles(view),
    }
}

fn unzip_content(view: &Value) -> Value {
    let mut content = Map::new();
    content.insert("picture".to_string(), pick(view.get("picture"), &["url"]));

    if let Some(basics) = view.get("basics") {
        let mut basics = basics.as_object().cloned().unwrap_or_default();
        if let Some(fields) = basics.get("customFields") {
            let stripped = strip_items(Some(fields));
            basics.insert("customFields".to_string(), stripped);
        }
        content.insert("basics".to_string(), Value::Object(basics));
    }

    content.insert(
        "summary".to_string(),
        pick(view.get("summary"), &["title", "content"]),
    );

    let mut sections = Map::new();
    for kind in SectionType::ALL {
        let Some(section) = view.get("sections").and_then(|all| all.get(kind.as_str())) else {
            continue;
        };
        let mut stripped = without(section, SECTION_STYLE_KEYS);
        stripped["items"] = strip_items(section.get("items"));
        sections.insert(kind.as_str().to_string(), stripped);
    }
    content.insert("sections".to_string(), Value::Object(sections));

    let custom: Vec<Value> = view
        .get("customSections")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .filter(|section| declared_type(section).is_some())
        .map(|section| {
            let mut stripped = without(section, SECTION_STYLE_KEYS);
            stripped["items"] = strip_items(section.get("items"));
            stripped
        })
        .collect();
    content.insert("customSections".to_string(), Value::Array(custom));

    content.insert("metadata".to_string(), pick(view.get("metadata"), &["notes"]));
    Value::Object(content)
}

fn unzip_styles(view: &Value) -> Value {
    let defaults = default_styles();
    let mut styles = Map::new();

    for key in ["itemOptions", "baseItem"] {
        if let Some(value) = defaults.get(key) {
            styles.insert(key.to_string(), value.clone());
        }
    }

    styles.insert(
        "picture".to_string(),
        style_keys_of(view.get("picture"), &["url"]),
    );

    let first_field = view
        .get("basics")
        .and_then(|basics| basics.get("customFields"))
        .and_then(Value::as_array)
        .and_then(|fields| fields.first());
    styles.insert(
        "customField".to_string(),
        sample_keys(default_entry("customField"), first_field),
    );

    styles.insert(
        "summary".to_string(),
        style_keys_of(view.get("summary"), &["title", "content"]),
    );

    let profiles = view
        .get("sections")
        .and_then(|sections| sections.get(SectionType::Profiles.as_str()));
    styles.insert(
        "section".to_string(),
        match profiles {
            Some(section) => pick(Some(section), SECTION_STYLE_KEYS),
            None => Value::Object(default_entry("section")),
        },
    );

    let mut items = Map::new();
    for kind in SectionType::ALL {
        items.insert(
            kind.style_key().to_string(),
            sample_keys(default_item_entry(kind), first_item_of(view, kind)),
        );
    }
    styles.insert("items".to_string(), Value::Object(items));

    let custom_sections = view
        .get("customSections")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    styles.insert(
        "customSection".to_string(),
        match custom_sections.iter().find(|section| declared_type(section).is_some()) {
            Some(section) => sample_keys(default_entry("customSection"), Some(section)),
            None => Value::Object(default_entry("customSection")),
        },
    );

    if let Some(layout) = defaults.get("pageLayout") {
        styles.insert("pageLayout".to_string(), layout.clone());
    }

    styles.insert(
        "metadata".to_string(),
        style_keys_of(view.get("metadata"), &["notes"]),
    );

    let retained = retained_sections(custom_sections);
    if !retained.is_empty() {
        styles.insert(RETAINED_SECTIONS_KEY.to_string(), Value::Array(retained));
    }

    Value::Object(styles)
}

fn retained_sections(custom_sections: &[Value]) -> Vec<Value> {
    let mut retained = Vec::new();
    let mut previous: Option<&str> = None;
    for section in custom_sections {
        if declared_type(section).is_none() {
            retained.push(json!({ "after": previous, "section": section }));
        }
        previous = section_id(section).or(previous);
    }
    retained
}

/// View built from the empty content document and the default styles.
pub fn default_view() -> Value {
    zip(&empty_content(), &default_styles())
}
