//! Resume use-case service.
//!
//! # Responsibility
//! - Run each load -> compute -> store unit against a `ResumeStore`.
//! - Route every mutation through the engine flows (merge, replace,
//!   operations, patch) so validation and layout placement always apply.
//!
//! # Invariants
//! - Malformed ids are rejected before the store is touched.
//! - Locked resumes reject every mutation except unlocking.
//! - A failing computation stores nothing.

use crate::compose::zip;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ids::{IdGenerator, UuidIdGenerator};
use crate::layout::{LayoutPlacement, LayoutSynchronizer};
use crate::merge::{merge_content, merged};
use crate::model::content::empty_content;
use crate::model::styles::default_styles;
use crate::operations::{apply_operations, DraftOperation};
use crate::patch::{apply_resume_patch, PatchOperation, ResumePatchTarget};
use crate::repo::resume_store::{RepoError, ResumeRecord, ResumeStore};
use crate::validate::ensure_valid;
use log::info;
use serde_json::{json, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ResumeServiceError>;

#[derive(Debug)]
pub enum ResumeServiceError {
    /// Id is not a UUID.
    InvalidId(String),
    /// Missing, or owned by someone else.
    NotFound(Uuid),
    Locked(Uuid),
    Engine(EngineError),
    Repo(RepoError),
}

impl ResumeServiceError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidId(_) => "INVALID_ID",
            Self::NotFound(_) | Self::Repo(RepoError::NotFound(_)) => "NOT_FOUND",
            Self::Locked(_) => "RESUME_LOCKED",
            Self::Engine(err) => err.code(),
            Self::Repo(_) => "STORAGE",
        }
    }
}

impl Display for ResumeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId(id) => write!(f, "resume id `{id}` is malformed"),
            Self::NotFound(id) => write!(f, "resume not found: {id}"),
            Self::Locked(id) => write!(f, "resume {id} is locked"),
            Self::Engine(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ResumeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EngineError> for ResumeServiceError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<RepoError> for ResumeServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Record fields of a new resume plus optional partial seed content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateResume {
    pub name: String,
    pub slug: String,
    pub tags: Vec<String>,
    pub is_public: bool,
    /// Partial content deep-merged onto the empty document.
    pub data: Option<Value>,
}

/// Use-case service over a resume store.
pub struct ResumeService<S: ResumeStore> {
    store: S,
    config: EngineConfig,
    ids: Box<dyn IdGenerator>,
}

fn parse_id(id: &str) -> ServiceResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ResumeServiceError::InvalidId(id.to_string()))
}

impl<S: ResumeStore> ResumeService<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self::with_id_generator(store, config, Box::new(UuidIdGenerator))
    }

    /// Uses `ids` for appended items and custom sections.
    pub fn with_id_generator(store: S, config: EngineConfig, ids: Box<dyn IdGenerator>) -> Self {
        Self { store, config, ids }
    }

    /// Creates a resume from partial seed data.
    pub fn create(&mut self, owner_id: &str, request: CreateResume) -> ServiceResult<ResumeRecord> {
        self.create_from_operations(owner_id, request, &[])
    }

    /// Creates a resume from seed data followed by an operation batch.
    pub fn create_from_operations(
        &mut self,
        owner_id: &str,
        request: CreateResume,
        operations: &[DraftOperation],
    ) -> ServiceResult<ResumeRecord> {
        let empty = empty_content();
        let seeded = match &request.data {
            Some(data) => merged(&empty, data),
            None => empty.clone(),
        };
        let content = if operations.is_empty() {
            ensure_valid("merge", &seeded)?;
            seeded
        } else {
            apply_operations(&seeded, operations, self.ids.as_mut())?
        };
        let styles = self.place_new_sections(&empty, &content, default_styles());

        let record = ResumeRecord {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            name: request.name,
            slug: request.slug,
            tags: request.tags,
            is_public: request.is_public,
            is_locked: false,
            content,
            styles,
            created_at: 0,
            updated_at: 0,
        };
        let stored = self.store.atomically(|store| -> ServiceResult<ResumeRecord> {
            store.create(&record)?;
            store
                .load(record.id, owner_id)?
                .ok_or(ResumeServiceError::NotFound(record.id))
        })?;
        info!(
            "event=resume_create module=service status=ok resume_id={} ops={}",
            stored.id,
            operations.len()
        );
        Ok(stored)
    }

    /// Loads a record visible to `owner_id`.
    pub fn get(&self, id: &str, owner_id: &str) -> ServiceResult<ResumeRecord> {
        let id = parse_id(id)?;
        self.store
            .load(id, owner_id)?
            .ok_or(ResumeServiceError::NotFound(id))
    }

    /// Composed view of a resume.
    pub fn get_view(&self, id: &str, owner_id: &str) -> ServiceResult<Value> {
        let record = self.get(id, owner_id)?;
        Ok(zip(&record.content, &record.styles))
    }

    pub fn get_content(&self, id: &str, owner_id: &str) -> ServiceResult<Value> {
        Ok(self.get(id, owner_id)?.content)
    }

    pub fn list(&self, owner_id: &str) -> ServiceResult<Vec<ResumeRecord>> {
        Ok(self.store.list(owner_id)?)
    }

    /// Deep-merges a partial document onto the stored content.
    pub fn merge_content(
        &mut self,
        id: &str,
        owner_id: &str,
        patch: &Value,
    ) -> ServiceResult<ResumeRecord> {
        self.mutate(id, owner_id, "merge", |_, record| {
            let content = merge_content(&record.content, patch)?;
            Ok(ResumeRecord { content, ..record.clone() })
        })
    }

    /// Replaces the stored content wholesale with a complete document.
    pub fn replace_content(
        &mut self,
        id: &str,
        owner_id: &str,
        content: &Value,
    ) -> ServiceResult<ResumeRecord> {
        self.mutate(id, owner_id, "replace", |_, record| {
            ensure_valid("replace", content)?;
            Ok(ResumeRecord {
                content: content.clone(),
                ..record.clone()
            })
        })
    }

    /// Applies a content-level operation batch.
    pub fn apply_operations(
        &mut self,
        id: &str,
        owner_id: &str,
        operations: &[DraftOperation],
    ) -> ServiceResult<ResumeRecord> {
        self.mutate(id, owner_id, "operations", |ids, record| {
            let content = apply_operations(&record.content, operations, ids)?;
            Ok(ResumeRecord { content, ..record.clone() })
        })
    }

    /// Applies an RFC 6902-style patch to the record and its composed view.
    pub fn apply_patch(
        &mut self,
        id: &str,
        owner_id: &str,
        patch: &[PatchOperation],
    ) -> ServiceResult<ResumeRecord> {
        let placement = self.config.layout;
        let uid = parse_id(id)?;
        let ids = self.ids.as_mut();
        let stored = self.store.atomically(|store| -> ServiceResult<ResumeRecord> {
            let record = load_unlocked(store, uid, owner_id)?;
            let target = ResumePatchTarget {
                name: record.name.clone(),
                slug: record.slug.clone(),
                tags: record.tags.clone(),
                is_public: record.is_public,
                data: zip(&record.content, &record.styles),
            };
            let outcome = apply_resume_patch(&target, patch, ids, placement)?;
            let next = ResumeRecord {
                name: outcome.target.name,
                slug: outcome.target.slug,
                tags: outcome.target.tags,
                is_public: outcome.target.is_public,
                content: outcome.content,
                styles: outcome.styles,
                ..record
            };
            store_and_reload(store, &next)
        })?;
        info!(
            "event=resume_update module=service status=ok flow=patch resume_id={} ops={}",
            stored.id,
            patch.len()
        );
        Ok(stored)
    }

    pub fn set_locked(&mut self, id: &str, owner_id: &str, locked: bool) -> ServiceResult<ResumeRecord> {
        let uid = parse_id(id)?;
        self.store.atomically(|store| -> ServiceResult<ResumeRecord> {
            let record = store
                .load(uid, owner_id)?
                .ok_or(ResumeServiceError::NotFound(uid))?;
            let next = ResumeRecord {
                is_locked: locked,
                ..record
            };
            store_and_reload(store, &next)
        })
    }

    pub fn delete(&mut self, id: &str, owner_id: &str) -> ServiceResult<()> {
        let uid = parse_id(id)?;
        self.store.atomically(|store| -> ServiceResult<()> {
            load_unlocked(store, uid, owner_id)?;
            store.delete(uid, owner_id)?;
            Ok(())
        })
    }

    fn mutate(
        &mut self,
        id: &str,
        owner_id: &str,
        flow: &'static str,
        compute: impl FnOnce(&mut dyn IdGenerator, &ResumeRecord) -> ServiceResult<ResumeRecord>,
    ) -> ServiceResult<ResumeRecord> {
        let uid = parse_id(id)?;
        let placement = self.config.layout;
        let ids = self.ids.as_mut();
        let stored = self.store.atomically(|store| -> ServiceResult<ResumeRecord> {
            let record = load_unlocked(store, uid, owner_id)?;
            let mut next = compute(ids, &record)?;
            next.styles = place_sections(placement, &record.content, &next.content, next.styles);
            store_and_reload(store, &next)
        })?;
        info!(
            "event=resume_update module=service status=ok flow={} resume_id={}",
            flow, stored.id
        );
        Ok(stored)
    }

    fn place_new_sections(&self, prior: &Value, content: &Value, styles: Value) -> Value {
        place_sections(self.config.layout, prior, content, styles)
    }
}

fn load_unlocked<S: ResumeStore>(store: &S, id: Uuid, owner_id: &str) -> ServiceResult<ResumeRecord> {
    let record = store
        .load(id, owner_id)?
        .ok_or(ResumeServiceError::NotFound(id))?;
    if record.is_locked {
        return Err(ResumeServiceError::Locked(id));
    }
    Ok(record)
}

/// Stores `record` and returns it with store-assigned timestamps.
fn store_and_reload<S: ResumeStore>(store: &S, record: &ResumeRecord) -> ServiceResult<ResumeRecord> {
    store.store(record)?;
    store
        .load(record.id, &record.owner_id)?
        .ok_or(ResumeServiceError::NotFound(record.id))
}

/// Places custom sections present in `content` but not in `prior`.
fn place_sections(
    placement: LayoutPlacement,
    prior: &Value,
    content: &Value,
    mut styles: Value,
) -> Value {
    let mut host = json!({
        "customSections": content.get("customSections").cloned().unwrap_or_else(|| json!([])),
        "metadata": styles.get("metadata").cloned().unwrap_or_else(|| json!({})),
    });
    let mut layout = LayoutSynchronizer::new(prior, placement);
    if layout.sync(&mut host).is_empty() {
        return styles;
    }
    if let (Some(styles), Some(metadata)) = (styles.as_object_mut(), host.get_mut("metadata")) {
        styles.insert("metadata".to_string(), metadata.take());
    }
    styles
}
