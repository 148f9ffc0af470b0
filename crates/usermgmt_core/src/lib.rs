//! Core validation-and-mutation engine for the user record service.
//! This crate is the single source of truth for record invariants.

pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod transfer;

pub use config::{ConfigError, ServiceConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::user::{User, UserId};
pub use model::validation::{
    is_valid_email, validate_record, Rule, ValidationErrors, Violation, NAME_MIN_CHARS,
};
pub use repo::user_store::{StoreError, StoreResult, UserStore, DEFAULT_LOCK_TIMEOUT};
pub use service::user_service::{
    ErrorCode, HealthStatus, ServiceError, ServiceResponse, UserService,
};
pub use transfer::bulk::{
    export_records, export_to, load_candidates, load_from, load_records, LoadOptions,
    LoadReport, SkippedRecord,
};
pub use transfer::source::{
    candidates_from_document, Candidate, InlineSource, JsonFileSink, JsonFileSource,
    RecordSink, RecordSource, VecSink,
};
pub use transfer::{TransferError, TransferResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
