//! Bulk load and export of user records.
//!
//! # Responsibility
//! - Read record documents from external sources and write them to sinks.
//! - Apply accept/overwrite/skip policy when loading into a `UserStore`.
//!
//! # Invariants
//! - A bad record never aborts a load; it is reported as skipped.
//! - An unreadable source fails before any record touches the store.
//! - Export output is accepted unchanged by load.

pub mod bulk;
pub mod source;

use crate::repo::user_store::StoreError;

pub type TransferResult<T> = Result<T, TransferError>;

/// Bulk transfer errors.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Source could not be read or is not a record sequence.
    #[error("source `{source_name}` is unreadable: {reason}")]
    SourceUnreadable { source_name: String, reason: String },
    #[error("sink `{sink_name}` is unwritable: {reason}")]
    SinkUnwritable { sink_name: String, reason: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TransferError {
    pub(crate) fn unreadable(source_name: &str, reason: impl Into<String>) -> Self {
        Self::SourceUnreadable {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unwritable(sink_name: &str, reason: impl Into<String>) -> Self {
        Self::SinkUnwritable {
            sink_name: sink_name.to_string(),
            reason: reason.into(),
        }
    }
}
