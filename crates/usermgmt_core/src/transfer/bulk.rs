//! Bulk loader and exporter.
//!
//! # Invariants
//! - Candidates are processed in input order.
//! - Invalid candidates are skipped with their violations; valid ones either
//!   overwrite an existing id in place or are appended.
//! - Validation runs before the store lock is taken; the store is mutated
//!   under a single write guard.

use crate::model::user::User;
use crate::model::validation::{validate_record, Rule, ValidationErrors, Violation};
use crate::repo::user_store::{Applied, StoreResult, UserStore};
use crate::transfer::source::{Candidate, RecordSink, RecordSource};
use crate::transfer::TransferResult;
use serde::Serialize;
use serde_json::Value;

/// Options for one bulk load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Empty the store before applying the loaded records.
    pub replace_existing: bool,
}

/// Candidate rejected during a bulk load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub violations: Vec<Violation>,
}

/// Per-load outcome summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub inserted: usize,
    pub overwritten: usize,
    pub skipped: usize,
    pub skipped_records: Vec<SkippedRecord>,
}

impl LoadReport {
    /// Number of records that reached the store.
    pub fn applied(&self) -> usize {
        self.inserted + self.overwritten
    }
}

/// Reads every candidate from `source` and loads them into `store`.
///
/// A source failure aborts before the store is touched.
pub fn load_from(
    store: &UserStore,
    source: &mut dyn RecordSource,
    options: LoadOptions,
) -> TransferResult<LoadReport> {
    let candidates = source.read_candidates()?;
    Ok(load_candidates(store, candidates, options)?)
}

/// Validates candidates and applies the accepted ones to `store`.
pub fn load_candidates(
    store: &UserStore,
    candidates: Vec<Candidate>,
    options: LoadOptions,
) -> StoreResult<LoadReport> {
    let mut report = LoadReport::default();
    let mut accepted = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match admit(&candidate) {
            Ok(user) => accepted.push(user),
            Err(errors) => report.skipped_records.push(SkippedRecord {
                position: candidate.position,
                key: candidate.key,
                violations: errors.into_violations(),
            }),
        }
    }
    report.skipped = report.skipped_records.len();

    for applied in store.apply_batch(accepted, options.replace_existing)? {
        match applied {
            Applied::Inserted => report.inserted += 1,
            Applied::Overwritten => report.overwritten += 1,
        }
    }
    Ok(report)
}

/// Loads plain record values, e.g. the output of `export_records`.
pub fn load_records(
    store: &UserStore,
    records: impl IntoIterator<Item = Value>,
    options: LoadOptions,
) -> StoreResult<LoadReport> {
    let candidates = records
        .into_iter()
        .enumerate()
        .map(|(position, record)| Candidate {
            position,
            key: None,
            record,
        })
        .collect();
    load_candidates(store, candidates, options)
}

/// Snapshot of the store in insertion order, in load-compatible shape.
pub fn export_records(store: &UserStore) -> StoreResult<Vec<Value>> {
    Ok(store.list()?.iter().map(User::to_record).collect())
}

/// Writes the current store snapshot to `sink`. Returns the record count.
pub fn export_to(store: &UserStore, sink: &mut dyn RecordSink) -> TransferResult<usize> {
    let users = store.list()?;
    sink.write_users(&users)?;
    Ok(users.len())
}

fn admit(candidate: &Candidate) -> Result<User, ValidationErrors> {
    let result = validate_record(&candidate.record);
    let Some(key) = candidate.key.as_deref() else {
        return result;
    };

    let id = candidate.record.get("id");
    let key_matches = match id.and_then(Value::as_u64) {
        Some(id) => key.trim().parse::<u64>().ok() == Some(id),
        // Missing or invalid ids are already reported by the validator.
        None => true,
    };
    if key_matches {
        return result;
    }

    let mismatch = Violation::new("id", Rule::KeyMismatch, id.cloned());
    match result {
        Ok(_) => Err(ValidationErrors::single(mismatch)),
        Err(mut errors) => {
            errors.push(mismatch);
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{load_candidates, LoadOptions};
    use crate::model::validation::Rule;
    use crate::repo::user_store::UserStore;
    use crate::transfer::source::candidates_from_document;
    use serde_json::json;

    #[test]
    fn keyed_document_rejects_key_id_mismatch() {
        let store = UserStore::new();
        let candidates = candidates_from_document(
            "inline",
            json!({
                "1": {"id": 1, "name": "Alice Smith", "email": "alice@example.com"},
                "2": {"id": 3, "name": "Bob Smith", "email": "bob@example.com"}
            }),
        )
        .unwrap();

        let report = load_candidates(&store, candidates, LoadOptions::default()).unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 1);
        let skipped = &report.skipped_records[0];
        assert_eq!(skipped.key.as_deref(), Some("2"));
        assert_eq!(skipped.violations[0].rule, Rule::KeyMismatch);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn duplicate_ids_within_one_load_keep_the_last_values() {
        let store = UserStore::new();
        let candidates = candidates_from_document(
            "inline",
            json!([
                {"id": 4, "name": "First Take", "email": "one@example.com"},
                {"id": 4, "name": "Second Take", "email": "two@example.com"}
            ]),
        )
        .unwrap();

        let report = load_candidates(&store, candidates, LoadOptions::default()).unwrap();
        assert_eq!((report.inserted, report.overwritten), (1, 1));
        assert_eq!(store.get(4).unwrap().name(), "Second Take");
    }
}
