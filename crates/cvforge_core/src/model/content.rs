//! Content document factory.
//!
//! # Responsibility
//! - Produce canonical empty content documents and empty collection entries.
//!
//! # Invariants
//! - An empty document carries all twelve native sections, each with an empty
//!   `items` list.
//! - Item factories always go through the shared field table in
//!   [`crate::model::section`].

use crate::model::section::{default_fields, SectionType, CUSTOM_FIELD_FIELDS};
use serde_json::{json, Map, Value};

/// Returns a fresh content document with every section present and empty.
pub fn empty_content() -> Value {
    let mut sections = Map::new();
    for kind in SectionType::ALL {
        sections.insert(kind.as_str().to_string(), json!({ "title": "", "items": [] }));
    }

    json!({
        "picture": { "url": "" },
        "basics": {
            "name": "",
            "headline": "",
            "email": "",
            "phone": "",
            "location": "",
            "website": { "label": "", "url": "" },
            "customFields": []
        },
        "summary": { "title": "", "content": "" },
        "sections": Value::Object(sections),
        "customSections": [],
        "metadata": { "notes": "" }
    })
}

/// Returns an empty item of the given section type.
pub fn empty_item(kind: SectionType, id: &str) -> Value {
    Value::Object(default_fields(kind.fields(), id))
}

/// Returns an empty basics custom field.
pub fn empty_custom_field(id: &str) -> Value {
    Value::Object(default_fields(CUSTOM_FIELD_FIELDS, id))
}

/// Returns an empty custom section reusing the item shape of `kind`.
pub fn empty_custom_section(id: &str, kind: SectionType) -> Value {
    json!({
        "id": id,
        "title": "",
        "type": kind.as_str(),
        "items": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_has_all_sections() {
        let content = empty_content();
        for kind in SectionType::ALL {
            let section = &content["sections"][kind.as_str()];
            assert_eq!(section["items"], json!([]));
            assert_eq!(section["title"], "");
        }
        assert_eq!(content["customSections"], json!([]));
    }

    #[test]
    fn empty_custom_section_records_type() {
        let section = empty_custom_section("c1", SectionType::Projects);
        assert_eq!(section["type"], "projects");
        assert_eq!(section["id"], "c1");
    }
}
