use cvforge_core::db::{open_db, open_db_in_memory};
use cvforge_core::{
    default_styles, empty_content, parse_operations, zip, CreateResume, EngineConfig,
    LayoutPlacement, LayoutSlot, PatchOperation, ResumeService, ResumeStore,
    SequentialIdGenerator, SqliteResumeStore,
};
use rusqlite::Connection;
use serde_json::{json, Value};

const OWNER: &str = "owner-a";

fn service(conn: &Connection) -> ResumeService<SqliteResumeStore<'_>> {
    service_with(conn, EngineConfig::default())
}

fn service_with(conn: &Connection, config: EngineConfig) -> ResumeService<SqliteResumeStore<'_>> {
    ResumeService::with_id_generator(
        SqliteResumeStore::new(conn),
        config,
        Box::new(SequentialIdGenerator::new("item")),
    )
}

fn request(slug: &str) -> CreateResume {
    CreateResume {
        name: "My Resume".to_string(),
        slug: slug.to_string(),
        tags: vec!["rust".to_string()],
        is_public: false,
        data: None,
    }
}

fn patch(value: Value) -> Vec<PatchOperation> {
    serde_json::from_value(value).unwrap()
}

#[test]
fn create_merges_seed_data_onto_the_empty_document() {
    let conn = open_db_in_memory().unwrap();
    let mut service = service(&conn);

    let created = service
        .create(
            OWNER,
            CreateResume {
                data: Some(json!({ "basics": { "name": "Ada", "website": { "url": "https://ada.dev" } } })),
                ..request("ada")
            },
        )
        .unwrap();

    assert_eq!(created.content["basics"]["name"], "Ada");
    assert_eq!(created.content["basics"]["website"]["label"], "");
    assert_eq!(created.content["sections"]["skills"]["items"], json!([]));
    assert_eq!(created.styles, default_styles());
    assert!(created.created_at > 0);
    assert!(!created.is_locked);

    let id = created.id.to_string();
    assert_eq!(service.get_content(&id, OWNER).unwrap(), created.content);
    assert_eq!(
        service.get_view(&id, OWNER).unwrap(),
        zip(&created.content, &created.styles)
    );
}

#[test]
fn create_places_seeded_custom_sections_in_the_layout() {
    let conn = open_db_in_memory().unwrap();
    let config = EngineConfig {
        layout: LayoutPlacement {
            page: 0,
            slot: LayoutSlot::Sidebar,
        },
        ..EngineConfig::default()
    };
    let mut service = service_with(&conn, config);

    let created = service
        .create(
            OWNER,
            CreateResume {
                data: Some(json!({ "customSections": [
                    { "id": "talks", "title": "Talks", "type": "publications", "items": [] }
                ] })),
                ..request("talks")
            },
        )
        .unwrap();

    let sidebar = created.styles["metadata"]["layout"]["pages"][0]["sidebar"]
        .as_array()
        .unwrap();
    assert_eq!(sidebar.last(), Some(&json!("talks")));
}

#[test]
fn create_from_operations_applies_the_batch() {
    let conn = open_db_in_memory().unwrap();
    let mut service = service(&conn);
    let operations = parse_operations(&json!([
        { "op": "setField", "path": "basics.headline", "value": "Engineer" },
        { "op": "itemOps", "action": "upsert", "target": { "kind": "section", "section": "skills" }, "items": [{ "name": "Rust" }] }
    ]))
    .unwrap();

    let created = service
        .create_from_operations(OWNER, request("ops"), &operations)
        .unwrap();

    assert_eq!(created.content["basics"]["headline"], "Engineer");
    assert_eq!(created.content["sections"]["skills"]["items"][0]["id"], "item-1");
}

#[test]
fn malformed_and_unknown_ids_are_distinguished() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service.get("not-a-uuid", OWNER).unwrap_err();
    assert_eq!(err.code(), "INVALID_ID");

    let err = service
        .get("00000000-0000-4000-8000-000000000000", OWNER)
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[test]
fn other_owners_cannot_see_or_change_a_resume() {
    let conn = open_db_in_memory().unwrap();
    let mut service = service(&conn);
    let created = service.create(OWNER, request("private")).unwrap();
    let id = created.id.to_string();

    assert_eq!(service.get(&id, "owner-b").unwrap_err().code(), "NOT_FOUND");
    assert_eq!(
        service
            .merge_content(&id, "owner-b", &json!({ "basics": { "name": "Mallory" } }))
            .unwrap_err()
            .code(),
        "NOT_FOUND"
    );
    assert!(service.list("owner-b").unwrap().is_empty());
}

#[test]
fn merge_and_operations_persist() {
    let conn = open_db_in_memory().unwrap();
    let mut service = service(&conn);
    let id = service.create(OWNER, request("cv")).unwrap().id.to_string();

    service
        .merge_content(&id, OWNER, &json!({ "summary": { "content": "Hello" } }))
        .unwrap();
    let operations = parse_operations(&json!([
        { "op": "replaceCustomSections", "data": [{ "id": "oss", "title": "OSS", "type": "projects", "items": [] }] }
    ]))
    .unwrap();
    let updated = service.apply_operations(&id, OWNER, &operations).unwrap();

    let stored = service.get(&id, OWNER).unwrap();
    assert_eq!(stored, updated);
    assert_eq!(stored.content["summary"]["content"], "Hello");
    let main = stored.styles["metadata"]["layout"]["pages"][0]["main"]
        .as_array()
        .unwrap();
    assert_eq!(main.last(), Some(&json!("oss")));
}

#[test]
fn failed_updates_store_nothing() {
    let conn = open_db_in_memory().unwrap();
    let mut service = service(&conn);
    let created = service.create(OWNER, request("cv")).unwrap();
    let id = created.id.to_string();

    let err = service
        .merge_content(&id, OWNER, &json!({ "basics": { "email": 42 } }))
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION");

    let err = service
        .apply_patch(
            &id,
            OWNER,
            &patch(json!([
                { "op": "replace", "path": "/name", "value": "Changed" },
                { "op": "remove", "path": "/data/sections/skills/items/0" }
            ])),
        )
        .unwrap_err();
    assert_eq!(err.code(), "TARGET_NOT_FOUND");

    assert_eq!(service.get(&id, OWNER).unwrap(), created);
}

#[test]
fn patches_update_record_fields_and_documents() {
    let conn = open_db_in_memory().unwrap();
    let mut service = service(&conn);
    let id = service.create(OWNER, request("cv")).unwrap().id.to_string();

    let updated = service
        .apply_patch(
            &id,
            OWNER,
            &patch(json!([
                { "op": "replace", "path": "/name", "value": "Renamed" },
                { "op": "replace", "path": "/isPublic", "value": true },
                { "op": "add", "path": "/data/sections/experience/items/-", "value": { "company": "Acme" } },
                { "op": "add", "path": "/data/customSections/-", "value": { "type": "awards", "title": "Prizes" } }
            ])),
        )
        .unwrap();

    assert_eq!(updated.name, "Renamed");
    assert!(updated.is_public);
    let item = &updated.content["sections"]["experience"]["items"][0];
    assert_eq!(item["company"], "Acme");
    assert_eq!(item["id"], "item-1");
    assert!(item.get("hidden").is_none());
    assert_eq!(updated.content["customSections"][0]["id"], "item-2");

    let view = service.get_view(&id, OWNER).unwrap();
    assert_eq!(view["sections"]["experience"]["items"][0]["hidden"], false);
    let main = view["metadata"]["layout"]["pages"][0]["main"].as_array().unwrap();
    assert_eq!(main.last(), Some(&json!("item-2")));
}

#[test]
fn locked_resumes_reject_mutations_until_unlocked() {
    let conn = open_db_in_memory().unwrap();
    let mut service = service(&conn);
    let id = service.create(OWNER, request("cv")).unwrap().id.to_string();

    assert!(service.set_locked(&id, OWNER, true).unwrap().is_locked);

    let merge = json!({ "basics": { "name": "Ada" } });
    assert_eq!(
        service.merge_content(&id, OWNER, &merge).unwrap_err().code(),
        "RESUME_LOCKED"
    );
    assert_eq!(
        service
            .apply_patch(&id, OWNER, &patch(json!([{ "op": "replace", "path": "/slug", "value": "x" }])))
            .unwrap_err()
            .code(),
        "RESUME_LOCKED"
    );
    assert_eq!(service.delete(&id, OWNER).unwrap_err().code(), "RESUME_LOCKED");

    service.set_locked(&id, OWNER, false).unwrap();
    let merged = service.merge_content(&id, OWNER, &merge).unwrap();
    assert_eq!(merged.content["basics"]["name"], "Ada");
}

#[test]
fn list_and_delete_are_owner_scoped() {
    let conn = open_db_in_memory().unwrap();
    let mut service = service(&conn);
    let first = service.create(OWNER, request("one")).unwrap();
    service.create(OWNER, request("two")).unwrap();
    service.create("owner-b", request("one")).unwrap();

    assert_eq!(service.list(OWNER).unwrap().len(), 2);

    service.delete(&first.id.to_string(), OWNER).unwrap();
    assert_eq!(service.list(OWNER).unwrap().len(), 1);
    assert_eq!(
        service.get(&first.id.to_string(), OWNER).unwrap_err().code(),
        "NOT_FOUND"
    );
}

#[test]
fn duplicate_slugs_per_owner_are_a_storage_error() {
    let conn = open_db_in_memory().unwrap();
    let mut service = service(&conn);
    service.create(OWNER, request("same")).unwrap();

    let err = service.create(OWNER, request("same")).unwrap_err();
    assert_eq!(err.code(), "STORAGE");
    assert_eq!(service.list(OWNER).unwrap().len(), 1);
}

#[test]
fn file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cvforge.db");

    let id = {
        let conn = open_db(&path).unwrap();
        let mut service = service(&conn);
        let created = service.create(OWNER, request("cv")).unwrap();
        created.id
    };

    let conn = open_db(&path).unwrap();
    let store = SqliteResumeStore::new(&conn);
    let loaded = store.load(id, OWNER).unwrap().unwrap();
    assert_eq!(loaded.slug, "cv");
    assert_eq!(loaded.tags, vec!["rust".to_string()]);
}

#[test]
fn replace_content_swaps_the_document_and_places_new_sections() {
    let conn = open_db_in_memory().unwrap();
    let mut service = service(&conn);
    let created = service.create(OWNER, request("swap")).unwrap();
    let id = created.id.to_string();

    let mut next = empty_content();
    next["basics"]["name"] = json!("Grace");
    next["customSections"] = json!([{ "id": "talks", "title": "Talks", "type": "publications", "items": [] }]);
    let stored = service.replace_content(&id, OWNER, &next).unwrap();

    assert_eq!(stored.content, next);
    let main = stored.styles["metadata"]["layout"]["pages"][0]["main"]
        .as_array()
        .unwrap();
    assert_eq!(main.last(), Some(&json!("talks")));

    let mut broken = next.clone();
    broken["basics"]["name"] = json!(5);
    let err = service.replace_content(&id, OWNER, &broken).unwrap_err();
    assert_eq!(err.code(), "VALIDATION");
    assert_eq!(service.get_content(&id, OWNER).unwrap(), next);
}
