//! Typed content-level operation batches.
//!
//! # Responsibility
//! - Define the operation wire shape (`{op: "setField" | "itemOps" | "replace*"}`).
//! - Apply a batch as a left fold over a cloned content document.
//!
//! # Invariants
//! - Operations apply strictly in input order.
//! - Validation runs once, after the whole fold; a failing batch returns an
//!   error and the caller's base document is never modified.
//! - `itemOps` against a custom-section id that does not exist is a no-op.
//!
//! # See also
//! - `crate::model::section` for the shared item default table.

use crate::error::{EngineError, EngineResult};
use crate::ids::IdGenerator;
use crate::model::section::{with_field_defaults, FieldSpec, SectionType, CUSTOM_FIELD_FIELDS};
use crate::path::{parse_dot_path, PathToken, TokenKind};
use crate::validate::{ensure_valid, ValidationIssue};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Instant;

/// One content-level mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DraftOperation {
    /// Sets the value at a dot-delimited path, creating missing objects.
    SetField { path: String, value: Value },
    /// Upserts partial items into one collection.
    ItemOps {
        action: ItemAction,
        target: ItemTarget,
        items: Vec<Map<String, Value>>,
    },
    ReplacePicture { data: Value },
    ReplaceBasics { data: Value },
    ReplaceSummary { data: Value },
    ReplaceMetadata { data: Value },
    ReplaceSection { section: SectionType, data: Value },
    ReplaceCustomSections { data: Value },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemAction {
    Upsert,
}

/// Collection addressed by an `itemOps` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ItemTarget {
    Section {
        section: SectionType,
    },
    CustomSection {
        #[serde(rename = "sectionId")]
        section_id: String,
    },
    CustomField,
}

impl DraftOperation {
    /// Wire name of the operation, used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetField { .. } => "setField",
            Self::ItemOps { .. } => "itemOps",
            Self::ReplacePicture { .. } => "replacePicture",
            Self::ReplaceBasics { .. } => "replaceBasics",
            Self::ReplaceSummary { .. } => "replaceSummary",
            Self::ReplaceMetadata { .. } => "replaceMetadata",
            Self::ReplaceSection { .. } => "replaceSection",
            Self::ReplaceCustomSections { .. } => "replaceCustomSections",
        }
    }
}

/// Decodes an operation batch, reporting one issue per malformed element.
pub fn parse_operations(value: &Value) -> EngineResult<Vec<DraftOperation>> {
    let Value::Array(elements) = value else {
        return Err(EngineError::validation(
            "operations",
            vec![ValidationIssue {
                path: "<root>".to_string(),
                message: "operation batch must be an array".to_string(),
            }],
        ));
    };

    let mut operations = Vec::with_capacity(elements.len());
    let mut issues = Vec::new();
    for (index, element) in elements.iter().enumerate() {
        match DraftOperation::deserialize(element) {
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
        Err(EngineError::validation("operations", issues))
    }
}

/// Applies a batch to a copy of `base` and validates the result.
pub fn apply_operations(
    base: &Value,
    operations: &[DraftOperation],
    ids: &mut dyn IdGenerator,
) -> EngineResult<Value> {
    let started_at = Instant::now();
    let mut content = base.clone();
    for operation in operations {
        if let Err(err) = apply_operation(&mut content, operation, ids) {
            warn!(
                "event=operations_apply module=operations status=error op={} error_code={}",
                operation.name(),
                err.code()
            );
            return Err(err);
        }
    }

    if let Err(err) = ensure_valid("operations", &content) {
        warn!(
            "event=operations_apply module=operations status=error error_code={} issues={}",
            err.code(),
            err.issues().len()
        );
        return Err(err);
    }

    info!(
        "event=operations_apply module=operations status=ok ops={} duration_ms={}",
        operations.len(),
        started_at.elapsed().as_millis()
    );
    Ok(content)
}

/// Applies one operation in place. No validation.
pub fn apply_operation(
    content: &mut Value,
    operation: &DraftOperation,
    ids: &mut dyn IdGenerator,
) -> EngineResult<()> {
    match operation {
        DraftOperation::SetField { path, value } => set_field(content, path, value.clone()),
        DraftOperation::ItemOps {
            action: ItemAction::Upsert,
            target,
            items,
        } => upsert_items(content, target, items, ids),
        DraftOperation::ReplacePicture { data } => replace_key(content, "picture", data),
        DraftOperation::ReplaceBasics { data } => replace_key(content, "basics", data),
        DraftOperation::ReplaceSummary { data } => replace_key(content, "summary", data),
        DraftOperation::ReplaceMetadata { data } => replace_key(content, "metadata", data),
        DraftOperation::ReplaceCustomSections { data } => {
            replace_key(content, "customSections", data)
        }
        DraftOperation::ReplaceSection { section, data } => {
            let sections = root_object(content)?
                .entry("sections")
                .or_insert_with(|| Value::Object(Map::new()));
            match sections {
                Value::Object(sections) => {
                    sections.insert(section.as_str().to_string(), data.clone());
                    Ok(())
                }
                _ => Err(EngineError::target_not_found("sections")),
            }
        }
    }
}

fn root_object(content: &mut Value) -> EngineResult<&mut Map<String, Value>> {
    match content {
        Value::Object(map) => Ok(map),
        _ => Err(EngineError::target_not_found("<root>")),
    }
}

fn replace_key(content: &mut Value, key: &str, data: &Value) -> EngineResult<()> {
    root_object(content)?.insert(key.to_string(), data.clone());
    Ok(())
}

fn item_position(list: &[Value], id: &str) -> Option<usize> {
    list.iter()
        .position(|item| item.get("id").and_then(Value::as_str) == Some(id))
}

fn step<'a>(cursor: &'a mut Value, token: &PathToken, path: &str) -> EngineResult<&'a mut Value> {
    match cursor {
        Value::Object(map) => Ok(map
            .entry(token.key.clone())
            .or_insert_with(|| Value::Object(Map::new()))),
        Value::Array(list) => {
            let position = match token.kind {
                TokenKind::Index => token.as_index().filter(|index| *index < list.len()),
                _ => item_position(list, &token.key),
            };
            position
                .and_then(|index| list.get_mut(index))
                .ok_or_else(|| EngineError::target_not_found(path))
        }
        _ => Err(EngineError::target_not_found(path)),
    }
}

fn set_field(content: &mut Value, path: &str, value: Value) -> EngineResult<()> {
    let tokens = parse_dot_path(path)?;
    let Some((last, parents)) = tokens.split_last() else {
        return Err(EngineError::target_not_found(path));
    };

    let mut cursor = content;
    for token in parents {
        cursor = step(cursor, token, path)?;
    }

    if cursor.is_array() {
        *step(cursor, last, path)? = value;
        return Ok(());
    }
    match cursor.as_object_mut() {
        Some(map) => {
            map.insert(last.key.clone(), value);
            Ok(())
        }
        None => Err(EngineError::target_not_found(path)),
    }
}

fn upsert_items(
    content: &mut Value,
    target: &ItemTarget,
    items: &[Map<String, Value>],
    ids: &mut dyn IdGenerator,
) -> EngineResult<()> {
    let resolved = match target {
        ItemTarget::Section { section } => {
            let path = format!("sections.{}.items", section.as_str());
            let list = content
                .get_mut("sections")
                .and_then(|sections| sections.get_mut(section.as_str()))
                .and_then(|section| section.get_mut("items"))
                .and_then(Value::as_array_mut)
                .ok_or_else(|| EngineError::target_not_found(path))?;
            Some((list, section.fields()))
        }
        ItemTarget::CustomField => {
            let list = content
                .get_mut("basics")
                .and_then(|basics| basics.get_mut("customFields"))
                .and_then(Value::as_array_mut)
                .ok_or_else(|| EngineError::target_not_found("basics.customFields"))?;
            Some((list, CUSTOM_FIELD_FIELDS))
        }
        ItemTarget::CustomSection { section_id } => content
            .get_mut("customSections")
            .and_then(Value::as_array_mut)
            .and_then(|sections| {
                sections
                    .iter_mut()
                    .find(|section| section.get("id").and_then(Value::as_str) == Some(section_id.as_str()))
            })
            .and_then(|section| {
                let fields: &[FieldSpec] = section
                    .get("type")
                    .and_then(Value::as_str)
                    .and_then(SectionType::parse)
                    .map(SectionType::fields)
                    .unwrap_or(&[]);
                section
                    .get_mut("items")
                    .and_then(Value::as_array_mut)
                    .map(|list| (list, fields))
            }),
    };

    let Some((list, fields)) = resolved else {
        debug!("event=item_upsert module=operations status=noop target=customSection");
        return Ok(());
    };

    for partial in items {
        let existing = partial
            .get("id")
            .and_then(Value::as_str)
            .and_then(|id| item_position(list, id));
        match existing {
            Some(index) => {
                if let Value::Object(item) = &mut list[index] {
                    for (key, value) in partial {
                        item.insert(key.clone(), value.clone());
                    }
                }
            }
            None => {
                let id = match partial.get("id").and_then(Value::as_str) {
                    Some(id) => id.to_string(),
                    None => ids.next_id(),
                };
                list.push(Value::Object(with_field_defaults(fields, &id, partial)));
            }
        }
    }
    Ok(())
}
