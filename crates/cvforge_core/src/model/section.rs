//! Section catalogue and per-item field tables.
//!
//! # Responsibility
//! - Enumerate the twelve built-in section types and their wire names.
//! - Hold the single field table used for validation and item defaults.
//!
//! # Invariants
//! - Every section type has exactly one field table entry.
//! - Defaults derived from the table are shared by operation upserts and
//!   patch appends; no other module builds item defaults by hand.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt::{Display, Formatter};

/// Built-in section type. Also the declared type of a custom section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionType {
    Profiles,
    Experience,
    Education,
    Projects,
    Skills,
    Languages,
    Interests,
    Awards,
    Certifications,
    Publications,
    Volunteer,
    References,
}

/// Primitive shape of one item field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain string, defaults to `""`.
    Text,
    /// JSON number, defaults to `0`.
    Number,
    /// Array of strings, defaults to `[]`.
    TextList,
    /// `{label, url}` pair, defaults to `{label: "", url: ""}`.
    Link,
}

impl FieldKind {
    /// Returns the empty value for this field kind.
    pub fn default_value(self) -> Value {
        match self {
            Self::Text => Value::String(String::new()),
            Self::Number => json!(0),
            Self::TextList => Value::Array(Vec::new()),
            Self::Link => json!({ "label": "", "url": "" }),
        }
    }

    /// Human-readable expectation used in validation messages.
    pub fn expectation(self) -> &'static str {
        match self {
            Self::Text => "expected string",
            Self::Number => "expected number",
            Self::TextList => "expected array of strings",
            Self::Link => "expected {label, url} object",
        }
    }
}

/// One named field of an item shape.
pub type FieldSpec = (&'static str, FieldKind);

use FieldKind::{Link, Number, Text, TextList};

const PROFILE_FIELDS: &[FieldSpec] = &[("network", Text), ("username", Text), ("website", Link)];
const EXPERIENCE_FIELDS: &[FieldSpec] = &[
    ("company", Text),
    ("position", Text),
    ("location", Text),
    ("period", Text),
    ("website", Link),
    ("description", Text),
];
const EDUCATION_FIELDS: &[FieldSpec] = &[
    ("school", Text),
    ("degree", Text),
    ("area", Text),
    ("grade", Text),
    ("location", Text),
    ("period", Text),
    ("website", Link),
    ("description", Text),
];
const PROJECT_FIELDS: &[FieldSpec] = &[
    ("name", Text),
    ("period", Text),
    ("website", Link),
    ("description", Text),
];
const SKILL_FIELDS: &[FieldSpec] = &[
    ("name", Text),
    ("proficiency", Text),
    ("level", Number),
    ("keywords", TextList),
];
const LANGUAGE_FIELDS: &[FieldSpec] = &[("language", Text), ("fluency", Text), ("level", Number)];
const INTEREST_FIELDS: &[FieldSpec] = &[("name", Text), ("keywords", TextList)];
const AWARD_FIELDS: &[FieldSpec] = &[
    ("title", Text),
    ("awarder", Text),
    ("date", Text),
    ("website", Link),
    ("description", Text),
];
const CERTIFICATION_FIELDS: &[FieldSpec] = &[
    ("title", Text),
    ("issuer", Text),
    ("date", Text),
    ("website", Link),
    ("description", Text),
];
const PUBLICATION_FIELDS: &[FieldSpec] = &[
    ("title", Text),
    ("publisher", Text),
    ("date", Text),
    ("website", Link),
    ("description", Text),
];
const VOLUNTEER_FIELDS: &[FieldSpec] = &[
    ("organization", Text),
    ("location", Text),
    ("period", Text),
    ("website", Link),
    ("description", Text),
];
const REFERENCE_FIELDS: &[FieldSpec] = &[
    ("name", Text),
    ("position", Text),
    ("website", Link),
    ("phone", Text),
    ("description", Text),
];

/// Field table for basics custom fields.
pub const CUSTOM_FIELD_FIELDS: &[FieldSpec] = &[("text", Text), ("link", Text)];

impl SectionType {
    /// All section types in canonical document order.
    pub const ALL: [SectionType; 12] = [
        Self::Profiles,
        Self::Experience,
        Self::Education,
        Self::Projects,
        Self::Skills,
        Self::Languages,
        Self::Interests,
        Self::Awards,
        Self::Certifications,
        Self::Publications,
        Self::Volunteer,
        Self::References,
    ];

    /// Key used under `sections` and as custom-section `type`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Experience => "experience",
            Self::Education => "education",
            Self::Projects => "projects",
            Self::Skills => "skills",
            Self::Languages => "languages",
            Self::Interests => "interests",
            Self::Awards => "awards",
            Self::Certifications => "certifications",
            Self::Publications => "publications",
            Self::Volunteer => "volunteer",
            Self::References => "references",
        }
    }

    /// Parses a wire name; `None` for anything outside the built-in set.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Key of the matching entry under the style document's `items` map.
    pub fn style_key(self) -> &'static str {
        match self {
            Self::Profiles => "profile",
            Self::Experience => "experience",
            Self::Education => "education",
            Self::Projects => "project",
            Self::Skills => "skill",
            Self::Languages => "language",
            Self::Interests => "interest",
            Self::Awards => "award",
            Self::Certifications => "certification",
            Self::Publications => "publication",
            Self::Volunteer => "volunteer",
            Self::References => "reference",
        }
    }

    /// Item fields of this section type, excluding `id`.
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Self::Profiles => PROFILE_FIELDS,
            Self::Experience => EXPERIENCE_FIELDS,
            Self::Education => EDUCATION_FIELDS,
            Self::Projects => PROJECT_FIELDS,
            Self::Skills => SKILL_FIELDS,
            Self::Languages => LANGUAGE_FIELDS,
            Self::Interests => INTEREST_FIELDS,
            Self::Awards => AWARD_FIELDS,
            Self::Certifications => CERTIFICATION_FIELDS,
            Self::Publications => PUBLICATION_FIELDS,
            Self::Volunteer => VOLUNTEER_FIELDS,
            Self::References => REFERENCE_FIELDS,
        }
    }
}

impl Display for SectionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds an item object holding the empty value of every field plus `id`.
pub fn default_fields(fields: &[FieldSpec], id: &str) -> Map<String, Value> {
    let mut item = Map::new();
    item.insert("id".to_string(), Value::String(id.to_string()));
    for (name, kind) in fields {
        item.insert((*name).to_string(), kind.default_value());
    }
    item
}

/// Overlays `partial` onto the defaults for `fields`.
///
/// Keys of `partial` win; defaults only fill what is missing.
pub fn with_field_defaults(
    fields: &[FieldSpec],
    id: &str,
    partial: &Map<String, Value>,
) -> Map<String, Value> {
    let mut item = default_fields(fields, id);
    for (key, value) in partial {
        item.insert(key.clone(), value.clone());
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_wire_name() {
        for kind in SectionType::ALL {
            assert_eq!(SectionType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(SectionType::parse("coverLetter"), None);
    }

    #[test]
    fn serde_uses_lowercase_wire_names() {
        let value = serde_json::to_value(SectionType::Certifications).unwrap();
        assert_eq!(value, "certifications");
    }

    #[test]
    fn defaults_fill_link_and_list_shapes() {
        let item = default_fields(SectionType::Skills.fields(), "s1");
        assert_eq!(item["id"], "s1");
        assert_eq!(item["keywords"], json!([]));
        assert_eq!(item["level"], json!(0));

        let item = default_fields(SectionType::Awards.fields(), "a1");
        assert_eq!(item["website"], json!({ "label": "", "url": "" }));
    }
}
