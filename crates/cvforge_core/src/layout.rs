//! Page layout reconciliation for custom sections.
//!
//! # Responsibility
//! - Place newly created custom sections on a page exactly once.
//!
//! # Invariants
//! - Ids are only ever added, never removed.
//! - An id is considered once per synchronizer lifetime: after it has been
//!   seen, later user edits that drop it from the layout are authoritative.
//! - Ids already present anywhere in the layout are left where they are.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// Page slot receiving auto-placed sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutSlot {
    #[default]
    Main,
    Sidebar,
}

impl LayoutSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Sidebar => "sidebar",
        }
    }
}

/// Where new custom sections land. Defaults to the first page's `main` list.
///
/// A page index past the last existing page falls back to the last page;
/// pages are never created beyond the first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutPlacement {
    pub page: usize,
    pub slot: LayoutSlot,
}

/// Appends newly introduced custom-section ids to the configured page slot.
#[derive(Debug, Clone)]
pub struct LayoutSynchronizer {
    placement: LayoutPlacement,
    seen: HashSet<String>,
}

impl LayoutSynchronizer {
    /// Seeds the synchronizer with the custom sections already in `doc`.
    ///
    /// Pre-existing sections are never placed, even when the layout does not
    /// reference them.
    pub fn new(doc: &Value, placement: LayoutPlacement) -> Self {
        Self {
            placement,
            seen: custom_section_ids(doc).into_iter().collect(),
        }
    }

    /// Places every custom section of `doc` not seen before.
    ///
    /// `doc` is a view or style document; pages live under
    /// `metadata.layout.pages`. Returns the ids that were placed.
    pub fn sync(&mut self, doc: &mut Value) -> Vec<String> {
        let fresh: Vec<String> = custom_section_ids(doc)
            .into_iter()
            .filter(|id| self.seen.insert(id.clone()))
            .collect();

        let mut placed = Vec::new();
        for id in fresh {
            if layout_mentions(doc, &id) {
                continue;
            }
            if let Some(slot) = self.slot_mut(doc) {
                slot.push(Value::String(id.clone()));
                placed.push(id);
            }
        }
        if !placed.is_empty() {
            debug!(
                "event=layout_sync module=layout status=ok placed={} page={} slot={}",
                placed.len(),
                self.placement.page,
                self.placement.slot.as_str()
            );
        }
        placed
    }

    fn slot_mut<'a>(&self, doc: &'a mut Value) -> Option<&'a mut Vec<Value>> {
        let metadata = ensure_object(doc.as_object_mut()?, "metadata")?;
        let layout = ensure_object(metadata, "layout")?;
        let pages = layout
            .entry("pages")
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()?;
        if pages.is_empty() {
            pages.push(json!({ "fullWidth": false, "main": [], "sidebar": [] }));
        }
        let page = self.placement.page.min(pages.len() - 1);
        pages
            .get_mut(page)?
            .as_object_mut()?
            .entry(self.placement.slot.as_str())
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()
    }
}

fn ensure_object<'a>(map: &'a mut Map<String, Value>, key: &str) -> Option<&'a mut Map<String, Value>> {
    map.entry(key)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
}

fn custom_section_ids(doc: &Value) -> Vec<String> {
    doc.get("customSections")
        .and_then(Value::as_array)
        .map(|sections| {
            sections
                .iter()
                .filter_map(|section| section.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn mentions(value: &Value, id: &str) -> bool {
    match value {
        Value::String(entry) => entry == id,
        Value::Array(entries) => entries.iter().any(|entry| mentions(entry, id)),
        _ => false,
    }
}

fn layout_mentions(doc: &Value, id: &str) -> bool {
    doc.pointer("/metadata/layout/pages")
        .and_then(Value::as_array)
        .is_some_and(|pages| {
            pages.iter().any(|page| {
                ["main", "sidebar"]
                    .iter()
                    .any(|slot| page.get(*slot).is_some_and(|entries| mentions(entries, id)))
            })
        })
}
