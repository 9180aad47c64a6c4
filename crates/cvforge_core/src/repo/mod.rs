//! Persistence contracts and the SQLite store.
//!
//! # Invariants
//! - Store APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod resume_store;
