use cvforge_core::{
    default_styles, default_view, empty_content, empty_custom_field, empty_custom_section,
    empty_item, unzip, validate, zip, SectionType,
};
use serde_json::json;

#[test]
fn default_view_is_the_zip_of_the_factories() {
    assert_eq!(default_view(), zip(&empty_content(), &default_styles()));
    assert!(validate(&empty_content()).ok);
}

#[test]
fn uniformly_styled_views_round_trip() {
    let mut content = empty_content();
    content["basics"]["customFields"] = json!([empty_custom_field("f1")]);
    content["sections"]["experience"]["items"] = json!([
        empty_item(SectionType::Experience, "e1"),
        empty_item(SectionType::Experience, "e2")
    ]);
    let mut section = empty_custom_section("c1", SectionType::Skills);
    section["items"] = json!([empty_item(SectionType::Skills, "s1")]);
    content["customSections"] = json!([section]);

    let view = zip(&content, &default_styles());
    let unzipped = unzip(&view);

    assert_eq!(unzipped.content, content);
    assert_eq!(zip(&unzipped.content, &unzipped.styles), view);
}

#[test]
fn style_is_sampled_from_the_first_item_of_each_type() {
    let mut content = empty_content();
    content["sections"]["awards"]["items"] = json!([
        empty_item(SectionType::Awards, "a1"),
        empty_item(SectionType::Awards, "a2")
    ]);
    let mut view = zip(&content, &default_styles());
    view["sections"]["awards"]["items"][0]["hidden"] = json!(true);

    let rezipped = zip(&unzip(&view).content, &unzip(&view).styles);

    assert_eq!(rezipped["sections"]["awards"]["items"][0]["hidden"], true);
    assert_eq!(rezipped["sections"]["awards"]["items"][1]["hidden"], true);
}

#[test]
fn metadata_style_and_notes_split_apart() {
    let mut view = default_view();
    view["metadata"]["notes"] = json!("private");
    view["metadata"]["template"] = json!("onyx");

    let unzipped = unzip(&view);

    assert_eq!(unzipped.content["metadata"], json!({ "notes": "private" }));
    assert_eq!(unzipped.styles["metadata"]["template"], "onyx");
    assert!(unzipped.styles["metadata"].get("notes").is_none());
}

#[test]
fn view_only_sections_are_neither_dropped_nor_duplicated() {
    let mut view = default_view();
    view["customSections"] = json!([
        { "id": "c1", "title": "", "type": "skills", "hidden": false, "columns": 1, "items": [] },
        { "id": "letter", "title": "Cover", "type": "coverLetter", "items": [] },
        { "id": "c2", "title": "", "type": "awards", "hidden": false, "columns": 1, "items": [] }
    ]);

    let first = unzip(&view);
    let rezipped = zip(&first.content, &first.styles);
    let second = unzip(&rezipped);
    let again = zip(&second.content, &second.styles);

    let ids: Vec<_> = again["customSections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|section| section["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["c1", "letter", "c2"]);
    assert_eq!(rezipped, view);
}
