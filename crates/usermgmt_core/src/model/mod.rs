//! User record model and admission rules.
//!
//! # Responsibility
//! - Define the single `User` entity handled by the core.
//! - Gate construction of `User` values behind record validation.
//!
//! # Invariants
//! - A `User` value always satisfies every rule in `validation`.

pub mod user;
pub mod validation;
