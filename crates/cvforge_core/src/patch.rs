//! RFC 6902-style patches over a resume record and its composed view.
//!
//! # Responsibility
//! - Decode patch documents at the host boundary.
//! - Apply an ordered patch list to `{name, slug, tags, isPublic, data: view}`
//!   with id-aware array addressing and defaulted appends.
//! - Decompose the patched view and validate the recovered content before
//!   anything is handed back.
//!
//! # Invariants
//! - Every path is parsed and guarded before the first operation runs.
//! - A patch list applies to a private copy; on any error the caller's target
//!   is untouched and no partial result is returned.
//! - Append defaults are built from the shared field table and the default
//!   styles; `move` and `copy` never add defaults.
//!
//! # See also
//! - `crate::path` for the token grammar.
//! - `crate::layout` for custom-section placement.

use crate::compose::{unzip, zip};
use crate::error::{EngineError, EngineResult, UnsupportedInput};
use crate::ids::IdGenerator;
use crate::layout::{LayoutPlacement, LayoutSynchronizer};
use crate::model::section::{default_fields, FieldSpec, SectionType, CUSTOM_FIELD_FIELDS};
use crate::model::styles::{default_entry, default_item_style};
use crate::path::{parse_pointer, PathToken, TokenKind};
use crate::validate::{validate, validate_styles, ValidationIssue};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Instant;

static PATCH_MEDIA_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*application/(json-patch\+)?json\s*(;.*)?$")
        .expect("patch media type pattern must compile")
});

/// One patch operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

impl PatchOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Replace { .. } => "replace",
            Self::Move { .. } => "move",
            Self::Copy { .. } => "copy",
            Self::Test { .. } => "test",
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Add { path, .. }
            | Self::Remove { path }
            | Self::Replace { path, .. }
            | Self::Move { path, .. }
            | Self::Copy { path, .. }
            | Self::Test { path, .. } => path,
        }
    }

    pub fn from(&self) -> Option<&str> {
        match self {
            Self::Move { from, .. } | Self::Copy { from, .. } => Some(from),
            _ => None,
        }
    }
}

/// Record a patch list is applied to. `data` holds the composed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumePatchTarget {
    pub name: String,
    pub slug: String,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub data: Value,
}

/// Committed result of [`apply_resume_patch`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchOutcome {
    /// Patched record whose `data` is recomposed from `content` and `styles`.
    pub target: ResumePatchTarget,
    pub content: Value,
    pub styles: Value,
}

/// Lifecycle of one patch application, reported in debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStage {
    Idle,
    Parsing,
    Applying,
    Synchronizing,
    Decomposing,
    Validating,
    Committed,
}

impl PatchStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Parsing => "parsing",
            Self::Applying => "applying",
            Self::Synchronizing => "synchronizing",
            Self::Decomposing => "decomposing",
            Self::Validating => "validating",
            Self::Committed => "committed",
        }
    }
}

/// Decodes a patch request body after checking its media type.
///
/// Accepts `application/json-patch+json` and `application/json`, with or
/// without parameters such as `charset`.
pub fn parse_patch_request(content_type: Option<&str>, body: &str) -> EngineResult<Vec<PatchOperation>> {
    match content_type {
        Some(value) if PATCH_MEDIA_TYPE.is_match(value) => {}
        other => {
            return Err(EngineError::UnsupportedInput(UnsupportedInput::MediaType(
                other.map(str::to_string),
            )))
        }
    }
    let document: Value = serde_json::from_str(body)
        .map_err(|err| EngineError::UnsupportedInput(UnsupportedInput::InvalidJson(err.to_string())))?;
    parse_patch_document(&document)
}

/// Decodes an already parsed patch document.
pub fn parse_patch_document(document: &Value) -> EngineResult<Vec<PatchOperation>> {
    let Value::Array(elements) = document else {
        return Err(EngineError::UnsupportedInput(UnsupportedInput::NotAnArray));
    };

    let mut operations = Vec::with_capacity(elements.len());
    let mut issues = Vec::new();
    for (index, element) in elements.iter().enumerate() {
        match PatchOperation::deserialize(element) {
            Ok(operation) => operations.push(operation),
            Err(err) => issues.push(ValidationIssue {
                path: index.to_string(),
                message: err.to_string(),
            }),
        }
    }
    if issues.is_empty() {
        Ok(operations)
    } else {
        Err(EngineError::validation("patch", issues))
    }
}

struct ParsedOperation<'p> {
    operation: &'p PatchOperation,
    path: Vec<PathToken>,
    from: Option<Vec<PathToken>>,
}

/// Applies `patch` to a copy of `target`.
///
/// New custom sections are placed on the page slot named by `placement`.
pub fn apply_resume_patch(
    target: &ResumePatchTarget,
    patch: &[PatchOperation],
    ids: &mut dyn IdGenerator,
    placement: LayoutPlacement,
) -> EngineResult<PatchOutcome> {
    let started_at = Instant::now();
    let mut stage = PatchStage::Idle;
    let result = run(target, patch, ids, placement, &mut stage);
    match &result {
        Ok(_) => info!(
            "event=patch_apply module=patch status=ok ops={} duration_ms={}",
            patch.len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event=patch_apply module=patch status=error stage={} ops={} error_code={} duration_ms={}",
            stage.as_str(),
            patch.len(),
            err.code(),
            started_at.elapsed().as_millis()
        ),
    }
    result
}

fn enter(stage: &mut PatchStage, next: PatchStage) {
    debug!(
        "event=patch_stage module=patch status=ok from={} to={}",
        stage.as_str(),
        next.as_str()
    );
    *stage = next;
}

fn run(
    target: &ResumePatchTarget,
    patch: &[PatchOperation],
    ids: &mut dyn IdGenerator,
    placement: LayoutPlacement,
    stage: &mut PatchStage,
) -> EngineResult<PatchOutcome> {
    enter(stage, PatchStage::Parsing);
    let parsed = patch
        .iter()
        .map(|operation| {
            Ok(ParsedOperation {
                operation,
                path: parse_pointer(operation.path())?,
                from: operation.from().map(parse_pointer).transpose()?,
            })
        })
        .collect::<EngineResult<Vec<_>>>()?;

    enter(stage, PatchStage::Applying);
    let mut doc = serde_json::to_value(target).map_err(|err| {
        EngineError::validation(
            "patch",
            vec![ValidationIssue {
                path: "<root>".to_string(),
                message: err.to_string(),
            }],
        )
    })?;
    let mut layout = LayoutSynchronizer::new(&doc["data"], placement);
    for step in &parsed {
        apply_one(&mut doc, step, ids)?;
        if let Some(view) = doc.get_mut("data") {
            layout.sync(view);
        }
    }

    enter(stage, PatchStage::Synchronizing);
    if let Some(view) = doc.get_mut("data") {
        layout.sync(view);
    }

    enter(stage, PatchStage::Decomposing);
    let record_issues = check_record(&doc);
    if !record_issues.is_empty() {
        return Err(EngineError::validation("patch", record_issues));
    }
    let view = doc.get("data").cloned().unwrap_or(Value::Null);
    let unzipped = unzip(&view);

    enter(stage, PatchStage::Validating);
    let mut issues: Vec<ValidationIssue> = validate(&unzipped.content)
        .issues
        .into_iter()
        .map(|issue| ValidationIssue {
            path: format!("data.{}", issue.path),
            message: issue.message,
        })
        .collect();
    issues.extend(validate_styles(&unzipped.styles).into_iter().map(|issue| ValidationIssue {
        path: format!("data.{}", issue.path),
        message: issue.message,
    }));
    if !issues.is_empty() {
        return Err(EngineError::validation("patch", issues));
    }

    let mut record: ResumePatchTarget = serde_json::from_value(doc).map_err(|err| {
        EngineError::validation(
            "patch",
            vec![ValidationIssue {
                path: "<root>".to_string(),
                message: err.to_string(),
            }],
        )
    })?;
    record.data = zip(&unzipped.content, &unzipped.styles);

    enter(stage, PatchStage::Committed);
    Ok(PatchOutcome {
        target: record,
        content: unzipped.content,
        styles: unzipped.styles,
    })
}

fn check_record(doc: &Value) -> Vec<ValidationIssue> {
    let checks: [(&str, fn(&Value) -> bool, &str); 5] = [
        ("name", Value::is_string, "expected string"),
        ("slug", Value::is_string, "expected string"),
        (
            "tags",
            |value| value.as_array().is_some_and(|tags| tags.iter().all(Value::is_string)),
            "expected array of strings",
        ),
        ("isPublic", Value::is_boolean, "expected boolean"),
        ("data", Value::is_object, "expected object"),
    ];
    let Some(record) = doc.as_object() else {
        return vec![ValidationIssue {
            path: "<root>".to_string(),
            message: "expected object".to_string(),
        }];
    };
    checks
        .iter()
        .filter_map(|(key, check, expectation)| match record.get(*key) {
            Some(value) if check(value) => None,
            Some(_) => Some(ValidationIssue {
                path: (*key).to_string(),
                message: (*expectation).to_string(),
            }),
            None => Some(ValidationIssue {
                path: (*key).to_string(),
                message: "required".to_string(),
            }),
        })
        .collect()
}

fn apply_one(doc: &mut Value, step: &ParsedOperation<'_>, ids: &mut dyn IdGenerator) -> EngineResult<()> {
    let path = step.operation.path();
    match step.operation {
        PatchOperation::Add { value, .. } => add(doc, &step.path, value.clone(), path, Some(ids)),
        PatchOperation::Remove { .. } => remove(doc, &step.path, path).map(|_| ()),
        PatchOperation::Replace { value, .. } => replace(doc, &step.path, value.clone(), path),
        PatchOperation::Move { from, .. } => {
            let from_tokens = step.from.as_deref().unwrap_or_default();
            if step.path.len() > from_tokens.len() && step.path.starts_with(from_tokens) {
                return Err(EngineError::InvalidPatchPath {
                    path: path.to_string(),
                    segment: from.clone(),
                });
            }
            let value = remove(doc, from_tokens, from)?;
            add(doc, &step.path, value, path, None)
        }
        PatchOperation::Copy { from, .. } => {
            let from_tokens = step.from.as_deref().unwrap_or_default();
            let value = get(doc, from_tokens)
                .cloned()
                .ok_or_else(|| EngineError::target_not_found(from.clone()))?;
            add(doc, &step.path, value, path, None)
        }
        PatchOperation::Test { value, .. } => {
            let current = get(doc, &step.path).ok_or_else(|| EngineError::target_not_found(path))?;
            if current == value {
                Ok(())
            } else {
                Err(EngineError::Conflict {
                    path: path.to_string(),
                })
            }
        }
    }
}

fn item_position(list: &[Value], id: &str) -> Option<usize> {
    list.iter()
        .position(|item| item.get("id").and_then(Value::as_str) == Some(id))
}

fn locate(list: &[Value], token: &PathToken) -> Option<usize> {
    match token.kind {
        TokenKind::Index => token.as_index().filter(|index| *index < list.len()),
        TokenKind::Id | TokenKind::Field => item_position(list, &token.key),
        TokenKind::Append => None,
    }
}

fn get<'a>(doc: &'a Value, tokens: &[PathToken]) -> Option<&'a Value> {
    tokens.iter().try_fold(doc, |cursor, token| match cursor {
        Value::Object(map) if token.kind != TokenKind::Id => map.get(&token.key),
        Value::Array(list) => locate(list, token).and_then(|index| list.get(index)),
        _ => None,
    })
}

fn get_mut<'a>(doc: &'a mut Value, tokens: &[PathToken]) -> Option<&'a mut Value> {
    tokens.iter().try_fold(doc, |cursor, token| match cursor {
        Value::Object(map) if token.kind != TokenKind::Id => map.get_mut(&token.key),
        Value::Array(list) => locate(list, token).and_then(move |index| list.get_mut(index)),
        _ => None,
    })
}

/// Collection whose appended entries receive defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Items(SectionType),
    CustomSections,
    CustomFields,
}

fn collection_at(doc: &Value, parent: &[PathToken]) -> Option<Collection> {
    let keys: Vec<&str> = parent.iter().map(|token| token.key.as_str()).collect();
    match keys.as_slice() {
        ["data", "sections", section, "items"] => SectionType::parse(section).map(Collection::Items),
        ["data", "customSections"] => Some(Collection::CustomSections),
        ["data", "basics", "customFields"] => Some(Collection::CustomFields),
        ["data", "customSections", _, "items"] => get(doc, &parent[..3])
            .and_then(|section| section.get("type"))
            .and_then(Value::as_str)
            .and_then(SectionType::parse)
            .map(Collection::Items),
        _ => None,
    }
}

fn with_defaults(
    fields: &[FieldSpec],
    style: Map<String, Value>,
    base: Map<String, Value>,
    value: Value,
    ids: &mut dyn IdGenerator,
) -> Value {
    let Value::Object(supplied) = value else {
        return value;
    };
    let mut item = default_fields(fields, "");
    item.remove("id");
    item.extend(base);
    item.extend(style);
    item.extend(supplied);
    if !item.contains_key("id") {
        item.insert("id".to_string(), Value::String(ids.next_id()));
    }
    Value::Object(item)
}

fn defaulted(collection: Collection, value: Value, ids: &mut dyn IdGenerator) -> Value {
    match collection {
        Collection::Items(kind) => with_defaults(kind.fields(), default_item_style(kind), Map::new(), value, ids),
        Collection::CustomFields => with_defaults(
            CUSTOM_FIELD_FIELDS,
            default_entry("customField"),
            Map::new(),
            value,
            ids,
        ),
        Collection::CustomSections => {
            let base = match json!({ "title": "", "items": [] }) {
                Value::Object(base) => base,
                _ => Map::new(),
            };
            with_defaults(&[], default_entry("customSection"), base, value, ids)
        }
    }
}

fn add(
    doc: &mut Value,
    tokens: &[PathToken],
    value: Value,
    path: &str,
    defaults: Option<&mut dyn IdGenerator>,
) -> EngineResult<()> {
    let Some((last, parent_tokens)) = tokens.split_last() else {
        *doc = value;
        return Ok(());
    };

    let value = match (last.kind, defaults) {
        (TokenKind::Append, Some(ids)) => match collection_at(doc, parent_tokens) {
            Some(collection) => defaulted(collection, value, ids),
            None => value,
        },
        _ => value,
    };

    let parent = get_mut(doc, parent_tokens).ok_or_else(|| EngineError::target_not_found(path))?;
    match parent {
        Value::Object(map) if last.kind != TokenKind::Id => {
            map.insert(last.key.clone(), value);
            Ok(())
        }
        Value::Array(list) => {
            let position = match last.kind {
                TokenKind::Append => Some(list.len()),
                TokenKind::Index => last.as_index().filter(|index| *index <= list.len()),
                TokenKind::Id | TokenKind::Field => item_position(list, &last.key),
            };
            let position = position.ok_or_else(|| EngineError::target_not_found(path))?;
            list.insert(position, value);
            Ok(())
        }
        _ => Err(EngineError::target_not_found(path)),
    }
}

fn remove(doc: &mut Value, tokens: &[PathToken], path: &str) -> EngineResult<Value> {
    let Some((last, parent_tokens)) = tokens.split_last() else {
        return Err(EngineError::target_not_found(path));
    };
    let removed = match get_mut(doc, parent_tokens) {
        Some(Value::Object(map)) if last.kind != TokenKind::Id => map.shift_remove(&last.key),
        Some(Value::Array(list)) => locate(list, last).map(|index| list.remove(index)),
        _ => None,
    };
    removed.ok_or_else(|| EngineError::target_not_found(path))
}

fn replace(doc: &mut Value, tokens: &[PathToken], value: Value, path: &str) -> EngineResult<()> {
    let Some((last, parent_tokens)) = tokens.split_last() else {
        *doc = value;
        return Ok(());
    };
    let is_collection = collection_at(doc, parent_tokens).is_some();
    let slot = match get_mut(doc, parent_tokens) {
        Some(Value::Object(map)) if last.kind != TokenKind::Id => map.get_mut(&last.key),
        Some(Value::Array(list)) => locate(list, last).and_then(move |index| list.get_mut(index)),
        _ => None,
    }
    .ok_or_else(|| EngineError::target_not_found(path))?;

    let mut value = value;
    if is_collection {
        if let (Value::Object(existing), Value::Object(next)) = (&*slot, &mut value) {
            for key in ["id", "hidden"] {
                if !next.contains_key(key) {
                    if let Some(kept) = existing.get(key) {
                        next.insert(key.to_string(), kept.clone());
                    }
                }
            }
        }
    }
    *slot = value;
    Ok(())
}
