//! Engine error taxonomy.
//!
//! # Responsibility
//! - Give every engine failure a typed value with a stable machine code.
//! - Carry enough detail (issues, offending path) for programmatic handling.
//!
//! # Invariants
//! - `code()` strings are part of the public contract and never change.
//! - An `EngineError` is only produced before anything is committed; callers
//!   never observe a partially applied document alongside an error.

use crate::validate::ValidationIssue;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EngineResult<T> = Result<T, EngineError>;

/// Coarse failure category shared by every engine error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    PatchPath,
    UnsupportedInput,
}

/// Why a request body was refused before any patch was parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsupportedInput {
    /// Content type missing or not a JSON patch media type.
    MediaType(Option<String>),
    /// Body is not parseable JSON.
    InvalidJson(String),
    /// Body parsed but is not a JSON array.
    NotAnArray,
}

impl UnsupportedInput {
    /// Reason code distinguishing the three refusal causes.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MediaType(_) => "UNSUPPORTED_MEDIA_TYPE",
            Self::InvalidJson(_) => "INVALID_JSON",
            Self::NotAnArray => "INVALID_PATCH",
        }
    }
}

impl Display for UnsupportedInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MediaType(Some(value)) => write!(f, "unsupported content type `{value}`"),
            Self::MediaType(None) => write!(f, "missing content type"),
            Self::InvalidJson(details) => write!(f, "request body is not valid JSON: {details}"),
            Self::NotAnArray => write!(f, "patch document must be a JSON array"),
        }
    }
}

/// Error returned by merge, operation, patch and compose flows.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Candidate document failed validation.
    Validation {
        /// Which flow produced the candidate, e.g. `merge` or `operations`.
        stage: &'static str,
        issues: Vec<ValidationIssue>,
    },
    /// Requested document does not exist.
    DocumentNotFound { id: String },
    /// Path names an id or index that does not resolve.
    TargetNotFound { path: String },
    /// A `test` patch compared unequal.
    Conflict { path: String },
    /// Path contains a prototype-pollution-shaped or malformed segment.
    InvalidPatchPath { path: String, segment: String },
    /// Host-boundary input refused before parsing patches.
    UnsupportedInput(UnsupportedInput),
}

impl EngineError {
    pub fn validation(stage: &'static str, issues: Vec<ValidationIssue>) -> Self {
        Self::Validation { stage, issues }
    }

    pub fn target_not_found(path: impl Into<String>) -> Self {
        Self::TargetNotFound { path: path.into() }
    }

    /// Taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::DocumentNotFound { .. } | Self::TargetNotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::InvalidPatchPath { .. } => ErrorKind::PatchPath,
            Self::UnsupportedInput(_) => ErrorKind::UnsupportedInput,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION",
            Self::DocumentNotFound { .. } => "NOT_FOUND",
            Self::TargetNotFound { .. } => "TARGET_NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::InvalidPatchPath { .. } => "PATCH_PATH",
            Self::UnsupportedInput(_) => "UNSUPPORTED_INPUT",
        }
    }

    /// Validation issues, empty for every other variant.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Validation { issues, .. } => issues,
            _ => &[],
        }
    }

    /// Serializable summary for hosts that surface errors as data.
    pub fn report(&self) -> ErrorReport {
        let (path, reason) = match self {
            Self::TargetNotFound { path }
            | Self::Conflict { path }
            | Self::InvalidPatchPath { path, .. } => (Some(path.clone()), None),
            Self::UnsupportedInput(input) => (None, Some(input.reason())),
            Self::Validation { .. } | Self::DocumentNotFound { .. } => (None, None),
        };
        ErrorReport {
            code: self.code(),
            kind: self.kind(),
            reason,
            message: self.to_string(),
            path,
            issues: self.issues().to_vec(),
        }
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { stage, issues } => {
                write!(f, "{stage} produced an invalid document ({} issue(s))", issues.len())?;
                if let Some(first) = issues.first() {
                    write!(f, "; first: {}: {}", first.path, first.message)?;
                }
                Ok(())
            }
            Self::DocumentNotFound { id } => write!(f, "document not found: {id}"),
            Self::TargetNotFound { path } => write!(f, "patch target not found: `{path}`"),
            Self::Conflict { path } => write!(f, "test failed at `{path}`"),
            Self::InvalidPatchPath { path, segment } => {
                write!(f, "invalid path `{path}`: segment `{segment}` is not allowed")
            }
            Self::UnsupportedInput(input) => write!(f, "{input}"),
        }
    }
}

impl Error for EngineError {}

/// Flat, serializable view of an [`EngineError`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub code: &'static str,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ValidationIssue>,
}
