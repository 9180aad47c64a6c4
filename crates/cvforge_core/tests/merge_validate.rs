use cvforge_core::{deep_merge, empty_content, merge_content, validate, ErrorKind};
use serde_json::json;

#[test]
fn merge_replaces_arrays_wholesale() {
    let mut base = empty_content();
    base["sections"]["skills"]["items"] = json!([
        { "id": "a", "name": "Rust", "proficiency": "", "level": 0, "keywords": ["cargo"] },
        { "id": "b", "name": "Go", "proficiency": "", "level": 0, "keywords": [] }
    ]);

    let merged = merge_content(
        &base,
        &json!({ "sections": { "skills": { "items": [
            { "id": "c", "name": "Zig", "proficiency": "", "level": 1, "keywords": [] }
        ] } } }),
    )
    .unwrap();

    let items = merged["sections"]["skills"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "c");
}

#[test]
fn merge_recurses_into_objects_and_keeps_siblings() {
    let mut base = empty_content();
    base["basics"]["name"] = json!("Ada");

    let merged = merge_content(
        &base,
        &json!({ "basics": { "website": { "url": "https://example.com" } } }),
    )
    .unwrap();

    assert_eq!(merged["basics"]["name"], "Ada");
    assert_eq!(merged["basics"]["website"]["url"], "https://example.com");
    assert_eq!(merged["basics"]["website"]["label"], "");
}

#[test]
fn invalid_merge_is_rejected_without_touching_base() {
    let base = empty_content();
    let before = base.clone();

    let err = merge_content(&base, &json!({ "summary": { "content": ["not", "text"] } })).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.code(), "VALIDATION");
    assert_eq!(err.issues()[0].path, "summary.content");
    assert_eq!(base, before);
}

#[test]
fn deep_merge_ignores_non_object_patches() {
    let mut doc = empty_content();
    let before = doc.clone();
    deep_merge(&mut doc, &json!([1, 2, 3]));
    assert_eq!(doc, before);
}

#[test]
fn validator_lists_every_problem() {
    let mut doc = empty_content();
    doc["picture"]["url"] = json!(1);
    doc["sections"]["languages"]["items"] = json!([{ "language": "en" }]);
    doc.as_object_mut().unwrap().remove("metadata");

    let report = validate(&doc);
    assert!(!report.ok);
    let paths: Vec<_> = report.issues.iter().map(|issue| issue.path.as_str()).collect();
    assert!(paths.contains(&"picture.url"));
    assert!(paths.contains(&"sections.languages.items.0.id"));
    assert!(paths.contains(&"sections.languages.items.0.fluency"));
    assert!(paths.contains(&"metadata"));
}

#[test]
fn unknown_extra_keys_are_tolerated() {
    let mut doc = empty_content();
    doc["basics"]["pronouns"] = json!("they/them");
    doc["sections"]["skills"]["extra"] = json!({ "anything": true });
    assert!(validate(&doc).ok);
}
