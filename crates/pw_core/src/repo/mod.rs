//! Repository layer for persisted option values.
//!
//! # Responsibility
//! - Define the storage contract models load from and save to.
//! - Isolate SQLite query details from model/controller orchestration.
//!
//! # Invariants
//! - Values cross the boundary as `serde_json::Value` documents.

pub mod option_repo;
