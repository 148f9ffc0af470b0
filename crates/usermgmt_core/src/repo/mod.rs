//! In-memory record storage.
//!
//! # Responsibility
//! - Hold the authoritative collection of admitted users.
//! - Serialize concurrent access behind a single reader/writer lock.
//!
//! # Invariants
//! - Store writes only accept records that passed `validate_record`.
//! - Store APIs return semantic errors (`DuplicateId`, `NotFound`) rather than
//!   panicking; only a broken internal invariant panics.

pub mod user_store;
