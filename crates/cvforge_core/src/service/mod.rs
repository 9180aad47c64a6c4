//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls and engine flows into use-case level APIs.
//! - Keep CLI and host layers decoupled from storage details.

pub mod resume_service;
