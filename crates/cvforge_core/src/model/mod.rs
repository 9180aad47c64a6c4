//! Resume document model.
//!
//! # Responsibility
//! - Define the section catalogue and per-item field tables.
//! - Provide factories for empty content and default style documents.
//!
//! # Invariants
//! - Documents are plain `serde_json::Value` trees; shape is enforced by
//!   [`crate::validate`], never by construction.
//! - Default values come from one table per item type.

pub mod content;
pub mod section;
pub mod styles;
