//! Structural validation for content, style documents and page layouts.
//!
//! # Responsibility
//! - Check a candidate content document against the canonical shape.
//! - Check the value types of style keys; style entries themselves stay
//!   optional.
//! - Report every problem as a `{path, message}` issue instead of failing fast.
//!
//! # Invariants
//! - Validation never mutates its input.
//! - Unknown extra keys are tolerated; missing or mistyped known keys are not.
//! - Items must carry a string `id`; uniqueness is not enforced because `copy`
//!   legitimately duplicates an item together with its id.

use crate::error::{EngineError, EngineResult};
use crate::model::section::{FieldKind, FieldSpec, SectionType, CUSTOM_FIELD_FIELDS};
use crate::model::styles::RETAINED_SECTIONS_KEY;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One validation problem at a dot-delimited path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub issues: Vec<ValidationIssue>,
}

const BASICS_TEXT_FIELDS: &[&str] = &["name", "headline", "email", "phone", "location"];

/// Expected JSON type of an optional style key.
#[derive(Debug, Clone, Copy)]
enum StyleKind {
    Bool,
    Number,
    Text,
    Options,
}

impl StyleKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Bool => value.is_boolean(),
            Self::Number => value.is_number(),
            Self::Text => value.is_string(),
            Self::Options => value
                .as_object()
                .is_some_and(|options| options.values().all(Value::is_boolean)),
        }
    }

    fn expectation(self) -> &'static str {
        match self {
            Self::Bool => "expected boolean",
            Self::Number => "expected number",
            Self::Text => "expected string",
            Self::Options => "expected object of boolean flags",
        }
    }
}

type StyleSpec = (&'static str, StyleKind);

const PICTURE_STYLE: &[StyleSpec] = &[
    ("hidden", StyleKind::Bool),
    ("size", StyleKind::Number),
    ("rotation", StyleKind::Number),
    ("aspectRatio", StyleKind::Number),
    ("borderRadius", StyleKind::Number),
    ("borderColor", StyleKind::Text),
    ("borderWidth", StyleKind::Number),
    ("shadowColor", StyleKind::Text),
    ("shadowWidth", StyleKind::Number),
];
const BLOCK_STYLE: &[StyleSpec] = &[("hidden", StyleKind::Bool), ("columns", StyleKind::Number)];
const ITEM_STYLE: &[StyleSpec] = &[
    ("hidden", StyleKind::Bool),
    ("options", StyleKind::Options),
    ("icon", StyleKind::Text),
];
const FIELD_STYLE: &[StyleSpec] = &[("icon", StyleKind::Text)];

/// Validates a content document.
pub fn validate(doc: &Value) -> ValidationReport {
    let mut checker = Checker::default();
    checker.content(doc);
    checker.into_report()
}

/// Validates `doc` and converts failure into [`EngineError::Validation`].
pub fn ensure_valid(stage: &'static str, doc: &Value) -> EngineResult<()> {
    let report = validate(doc);
    if report.ok {
        Ok(())
    } else {
        Err(EngineError::validation(stage, report.issues))
    }
}

/// Validates `metadata.layout.pages` of a style document.
///
/// A style document without a layout is accepted; a present layout must be a
/// list of pages whose `main` and `sidebar` are string lists.
pub fn validate_layout(styles: &Value) -> Vec<ValidationIssue> {
    let mut checker = Checker::default();
    let Some(layout) = styles.get("metadata").and_then(|meta| meta.get("layout")) else {
        return Vec::new();
    };
    checker.path.extend(["metadata".to_string(), "layout".to_string()]);
    checker.with_key("pages", |c| match layout.get("pages") {
        Some(Value::Array(pages)) => {
            for (index, page) in pages.iter().enumerate() {
                c.with_key(&index.to_string(), |c| {
                    let Some(page) = c.object(page) else { return };
                    for slot in ["main", "sidebar"] {
                        c.with_key(slot, |c| c.field(page.get(slot), FieldKind::TextList));
                    }
                });
            }
        }
        _ => c.issue("expected array of pages"),
    });
    checker.issues
}

/// Validates the value types of a style document.
///
/// Entries and keys may be absent; present keys must carry the expected
/// type. Includes the [`validate_layout`] checks.
pub fn validate_styles(styles: &Value) -> Vec<ValidationIssue> {
    let mut checker = Checker::default();
    let Some(root) = checker.object(styles) else {
        return checker.issues;
    };

    let entries: [(&str, &[StyleSpec]); 6] = [
        ("picture", PICTURE_STYLE),
        ("customField", FIELD_STYLE),
        ("summary", BLOCK_STYLE),
        ("section", BLOCK_STYLE),
        ("customSection", BLOCK_STYLE),
        ("baseItem", ITEM_STYLE),
    ];
    for (key, specs) in entries {
        if let Some(entry) = root.get(key) {
            checker.with_key(key, |c| c.style_entry(entry, specs));
        }
    }
    if let Some(options) = root.get("itemOptions") {
        checker.with_key("itemOptions", |c| c.style_value(options, StyleKind::Options));
    }
    if let Some(items) = root.get("items") {
        checker.with_key("items", |c| {
            let Some(items) = c.object(items) else { return };
            for (key, entry) in items {
                c.with_key(key, |c| c.style_entry(entry, ITEM_STYLE));
            }
        });
    }
    if let Some(retained) = root.get(RETAINED_SECTIONS_KEY) {
        if !retained.is_array() {
            checker.with_key(RETAINED_SECTIONS_KEY, |c| c.issue("expected array"));
        }
    }

    checker.issues.extend(validate_layout(styles));
    checker.issues
}

#[derive(Default)]
struct Checker {
    path: Vec<String>,
    issues: Vec<ValidationIssue>,
}

impl Checker {
    fn into_report(self) -> ValidationReport {
        ValidationReport {
            ok: self.issues.is_empty(),
            issues: self.issues,
        }
    }

    fn issue(&mut self, message: impl Into<String>) {
        let path = if self.path.is_empty() {
            "<root>".to_string()
        } else {
            self.path.join(".")
        };
        self.issues.push(ValidationIssue {
            path,
            message: message.into(),
        });
    }

    fn with_key(&mut self, key: &str, check: impl FnOnce(&mut Self)) {
        self.path.push(key.to_string());
        check(self);
        self.path.pop();
    }

    fn object<'v>(&mut self, value: &'v Value) -> Option<&'v Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            _ => {
                self.issue("expected object");
                None
            }
        }
    }

    fn required<'v>(&mut self, map: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
        let value = map.get(key);
        if value.is_none() {
            self.with_key(key, |c| c.issue("required"));
        }
        value
    }

    fn field(&mut self, value: Option<&Value>, kind: FieldKind) {
        let Some(value) = value else {
            self.issue("required");
            return;
        };
        let ok = match kind {
            FieldKind::Text => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::TextList => value
                .as_array()
                .is_some_and(|list| list.iter().all(Value::is_string)),
            FieldKind::Link => value.as_object().is_some_and(|link| {
                link.get("label").is_some_and(Value::is_string)
                    && link.get("url").is_some_and(Value::is_string)
            }),
        };
        if !ok {
            self.issue(kind.expectation());
        }
    }

    fn style_value(&mut self, value: &Value, kind: StyleKind) {
        if !kind.accepts(value) {
            self.issue(kind.expectation());
        }
    }

    fn style_entry(&mut self, entry: &Value, specs: &[StyleSpec]) {
        let Some(entry) = self.object(entry) else { return };
        for (name, kind) in specs {
            if let Some(value) = entry.get(*name) {
                self.with_key(name, |c| c.style_value(value, *kind));
            }
        }
    }

    fn fields(&mut self, map: &Map<String, Value>, fields: &[FieldSpec]) {
        for (name, kind) in fields {
            self.with_key(name, |c| c.field(map.get(*name), *kind));
        }
    }

    fn item(&mut self, value: &Value, fields: &[FieldSpec]) {
        let Some(item) = self.object(value) else { return };
        self.with_key("id", |c| match item.get("id") {
            Some(Value::String(_)) => {}
            Some(_) => c.issue("expected string id"),
            None => c.issue("required"),
        });
        self.fields(item, fields);
    }

    fn items(&mut self, map: &Map<String, Value>, fields: &[FieldSpec]) {
        self.with_key("items", |c| match map.get("items") {
            Some(Value::Array(items)) => {
                for (index, item) in items.iter().enumerate() {
                    c.with_key(&index.to_string(), |c| c.item(item, fields));
                }
            }
            Some(_) => c.issue("expected array"),
            None => c.issue("required"),
        });
    }

    fn content(&mut self, doc: &Value) {
        let Some(root) = self.object(doc) else { return };

        if let Some(picture) = self.required(root, "picture") {
            self.with_key("picture", |c| {
                if let Some(picture) = c.object(picture) {
                    c.with_key("url", |c| c.field(picture.get("url"), FieldKind::Text));
                }
            });
        }

        if let Some(basics) = self.required(root, "basics") {
            self.with_key("basics", |c| c.basics(basics));
        }

        if let Some(summary) = self.required(root, "summary") {
            self.with_key("summary", |c| {
                if let Some(summary) = c.object(summary) {
                    c.fields(summary, &[("title", FieldKind::Text), ("content", FieldKind::Text)]);
                }
            });
        }

        if let Some(sections) = self.required(root, "sections") {
            self.with_key("sections", |c| c.sections(sections));
        }

        if let Some(custom) = self.required(root, "customSections") {
            self.with_key("customSections", |c| c.custom_sections(custom));
        }

        if let Some(metadata) = self.required(root, "metadata") {
            self.with_key("metadata", |c| {
                if let Some(metadata) = c.object(metadata) {
                    c.with_key("notes", |c| c.field(metadata.get("notes"), FieldKind::Text));
                }
            });
        }
    }

    fn basics(&mut self, basics: &Value) {
        let Some(basics) = self.object(basics) else { return };
        for name in BASICS_TEXT_FIELDS {
            self.with_key(name, |c| c.field(basics.get(*name), FieldKind::Text));
        }
        self.with_key("website", |c| c.field(basics.get("website"), FieldKind::Link));
        self.with_key("customFields", |c| match basics.get("customFields") {
            Some(Value::Array(fields)) => {
                for (index, field) in fields.iter().enumerate() {
                    c.with_key(&index.to_string(), |c| c.item(field, CUSTOM_FIELD_FIELDS));
                }
            }
            Some(_) => c.issue("expected array"),
            None => c.issue("required"),
        });
    }

    fn sections(&mut self, sections: &Value) {
        let Some(sections) = self.object(sections) else { return };
        for kind in SectionType::ALL {
            let Some(section) = self.required(sections, kind.as_str()) else {
                continue;
            };
            self.with_key(kind.as_str(), |c| {
                let Some(section) = c.object(section) else { return };
                c.with_key("title", |c| c.field(section.get("title"), FieldKind::Text));
                c.items(section, kind.fields());
            });
        }
    }

    fn custom_sections(&mut self, custom: &Value) {
        let Value::Array(list) = custom else {
            self.issue("expected array");
            return;
        };
        for (index, section) in list.iter().enumerate() {
            self.with_key(&index.to_string(), |c| {
                let Some(section) = c.object(section) else { return };
                c.with_key("id", |c| c.field(section.get("id"), FieldKind::Text));
                c.with_key("title", |c| c.field(section.get("title"), FieldKind::Text));
                let kind = section
                    .get("type")
                    .and_then(Value::as_str)
                    .and_then(SectionType::parse);
                match kind {
                    Some(kind) => c.items(section, kind.fields()),
                    None => c.with_key("type", |c| c.issue("expected one of the built-in section types")),
                }
            });
        }
    }
}
