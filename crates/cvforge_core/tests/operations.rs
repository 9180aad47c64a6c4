use cvforge_core::{
    apply_operations, empty_content, parse_operations, DraftOperation, SequentialIdGenerator,
};
use serde_json::{json, Value};

fn batch(value: Value) -> Vec<DraftOperation> {
    parse_operations(&value).unwrap()
}

fn with_custom_section() -> Value {
    let mut content = empty_content();
    content["customSections"] = json!([{ "id": "extra", "title": "Extra", "type": "awards", "items": [] }]);
    content
}

#[test]
fn replace_section_is_idempotent() {
    let operations = batch(json!([{
        "op": "replaceSection",
        "section": "languages",
        "data": { "title": "Languages", "items": [
            { "id": "l1", "language": "Welsh", "fluency": "Native", "level": 5 }
        ] }
    }]));
    let mut ids = SequentialIdGenerator::new("op");

    let once = apply_operations(&empty_content(), &operations, &mut ids).unwrap();
    let twice = apply_operations(&once, &operations, &mut ids).unwrap();

    assert_eq!(once, twice);
    assert_eq!(once["sections"]["languages"]["title"], "Languages");
}

#[test]
fn upsert_populates_defaults_for_new_items() {
    let operations = batch(json!([{
        "op": "itemOps",
        "action": "upsert",
        "target": { "kind": "section", "section": "education" },
        "items": [{ "school": "Aberystwyth" }]
    }]));
    let mut ids = SequentialIdGenerator::new("op");

    let content = apply_operations(&empty_content(), &operations, &mut ids).unwrap();

    let item = &content["sections"]["education"]["items"][0];
    assert_eq!(item["id"], "op-1");
    assert_eq!(item["school"], "Aberystwyth");
    assert_eq!(item["degree"], "");
    assert_eq!(item["website"], json!({ "label": "", "url": "" }));
    assert!(item.get("hidden").is_none());
}

#[test]
fn upsert_into_custom_section_uses_its_declared_type() {
    let operations = batch(json!([{
        "op": "itemOps",
        "action": "upsert",
        "target": { "kind": "customSection", "sectionId": "extra" },
        "items": [{ "id": "a1", "title": "Best Talk" }]
    }]));
    let mut ids = SequentialIdGenerator::new("op");

    let content = apply_operations(&with_custom_section(), &operations, &mut ids).unwrap();

    let item = &content["customSections"][0]["items"][0];
    assert_eq!(item["id"], "a1");
    assert_eq!(item["awarder"], "");
    assert_eq!(item["date"], "");
}

#[test]
fn upsert_into_missing_custom_section_is_a_no_op() {
    let operations = batch(json!([{
        "op": "itemOps",
        "action": "upsert",
        "target": { "kind": "customSection", "sectionId": "ghost" },
        "items": [{ "title": "ignored" }]
    }]));
    let mut ids = SequentialIdGenerator::new("op");
    let base = with_custom_section();

    let content = apply_operations(&base, &operations, &mut ids).unwrap();
    assert_eq!(content, base);
}

#[test]
fn custom_fields_upsert_by_id() {
    let operations = batch(json!([
        { "op": "itemOps", "action": "upsert", "target": { "kind": "customField" }, "items": [{ "id": "f1", "text": "@ada" }] },
        { "op": "itemOps", "action": "upsert", "target": { "kind": "customField" }, "items": [{ "id": "f1", "link": "https://example.com" }] }
    ]));
    let mut ids = SequentialIdGenerator::new("op");

    let content = apply_operations(&empty_content(), &operations, &mut ids).unwrap();

    let fields = content["basics"]["customFields"].as_array().unwrap();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0]["text"], "@ada");
    assert_eq!(fields[0]["link"], "https://example.com");
}

#[test]
fn set_field_addresses_items_by_id_and_position() {
    let operations = batch(json!([
        { "op": "itemOps", "action": "upsert", "target": { "kind": "section", "section": "skills" }, "items": [
            { "id": "rust", "name": "Rust" },
            { "id": "go", "name": "Go" }
        ] },
        { "op": "setField", "path": "sections.skills.items.rust.level", "value": 5 },
        { "op": "setField", "path": "sections.skills.items.1.level", "value": 3 }
    ]));
    let mut ids = SequentialIdGenerator::new("op");

    let content = apply_operations(&empty_content(), &operations, &mut ids).unwrap();

    let items = content["sections"]["skills"]["items"].as_array().unwrap();
    assert_eq!(items[0]["level"], 5);
    assert_eq!(items[1]["level"], 3);
}

#[test]
fn operations_apply_in_order() {
    let operations = batch(json!([
        { "op": "setField", "path": "basics.name", "value": "First" },
        { "op": "replaceBasics", "data": {
            "name": "Second", "headline": "", "email": "", "phone": "", "location": "",
            "website": { "label": "", "url": "" }, "customFields": []
        } },
        { "op": "setField", "path": "basics.headline", "value": "Third" }
    ]));
    let mut ids = SequentialIdGenerator::new("op");

    let content = apply_operations(&empty_content(), &operations, &mut ids).unwrap();
    assert_eq!(content["basics"]["name"], "Second");
    assert_eq!(content["basics"]["headline"], "Third");
}

#[test]
fn invalid_batch_leaves_base_unchanged() {
    let operations = batch(json!([
        { "op": "setField", "path": "basics.name", "value": "Ada" },
        { "op": "setField", "path": "basics.headline", "value": "Engineer" },
        { "op": "replaceSummary", "data": { "title": "About" } }
    ]));
    let mut ids = SequentialIdGenerator::new("op");
    let base = empty_content();

    let err = apply_operations(&base, &operations, &mut ids).unwrap_err();

    assert_eq!(err.code(), "VALIDATION");
    assert_eq!(err.issues()[0].path, "summary.content");
    assert_eq!(base, empty_content());
}

#[test]
fn replace_custom_sections_is_validated_against_declared_types() {
    let operations = batch(json!([{
        "op": "replaceCustomSections",
        "data": [{ "id": "c1", "title": "", "type": "profiles", "items": [{ "id": "p1", "network": 7 }] }]
    }]));
    let mut ids = SequentialIdGenerator::new("op");

    let err = apply_operations(&empty_content(), &operations, &mut ids).unwrap_err();
    let paths: Vec<_> = err.issues().iter().map(|issue| issue.path.as_str()).collect();
    assert!(paths.contains(&"customSections.0.items.0.network"));
    assert!(paths.contains(&"customSections.0.items.0.username"));
}
