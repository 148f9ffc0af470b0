//! Core use-case services.
//!
//! # Responsibility
//! - Translate caller requests into store and bulk-transfer operations.
//! - Keep request layers decoupled from validation and storage details.

pub mod user_service;
