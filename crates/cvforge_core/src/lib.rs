//! Core engine for cvforge resume documents.
//! This crate is the single source of truth for document invariants.

pub mod compose;
pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod layout;
pub mod logging;
pub mod merge;
pub mod model;
pub mod operations;
pub mod patch;
pub mod path;
pub mod repo;
pub mod service;
pub mod validate;

pub use compose::{default_view, unzip, zip, Unzipped};
pub use config::{ConfigError, EngineConfig};
pub use error::{EngineError, EngineResult, ErrorKind, ErrorReport, UnsupportedInput};
pub use ids::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use layout::{LayoutPlacement, LayoutSlot, LayoutSynchronizer};
pub use logging::{init_logging, logging_status, LoggingError};
pub use merge::{deep_merge, merge_content};
pub use model::content::{empty_content, empty_custom_field, empty_custom_section, empty_item};
pub use model::section::SectionType;
pub use model::styles::default_styles;
pub use operations::{apply_operations, parse_operations, DraftOperation, ItemAction, ItemTarget};
pub use patch::{
    apply_resume_patch, parse_patch_document, parse_patch_request, PatchOperation, PatchOutcome,
    ResumePatchTarget,
};
pub use repo::resume_store::{RepoError, RepoResult, ResumeRecord, ResumeStore, SqliteResumeStore};
pub use service::resume_service::{
    CreateResume, ResumeService, ResumeServiceError, ServiceResult,
};
pub use validate::{
    ensure_valid, validate, validate_layout, validate_styles, ValidationIssue, ValidationReport,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
