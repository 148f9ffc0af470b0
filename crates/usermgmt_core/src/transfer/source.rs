//! Record sources and sinks.
//!
//! A source yields candidate records; a sink receives validated users. The
//! concrete medium (flat file, request payload) stays with the caller.
//!
//! Accepted documents:
//! - a JSON array of record objects (canonical, what export writes);
//! - an object keyed by id, e.g. `{"1": {"id": 1, ...}}`.

use crate::model::user::User;
use crate::transfer::{TransferError, TransferResult};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// One not-yet-validated record read from a source.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Zero-based position in the source document.
    pub position: usize,
    /// Map key when read from an id-keyed document.
    pub key: Option<String>,
    pub record: Value,
}

/// Supplier of candidate records for a bulk load.
pub trait RecordSource {
    /// Name used in errors and logs.
    fn name(&self) -> &str;
    fn read_candidates(&mut self) -> TransferResult<Vec<Candidate>>;
}

/// Receiver of exported users.
pub trait RecordSink {
    fn name(&self) -> &str;
    fn write_users(&mut self, users: &[User]) -> TransferResult<()>;
}

/// Splits a parsed document into candidates.
///
/// Fails with `SourceUnreadable` when the top level is neither an array nor
/// an object.
pub fn candidates_from_document(
    source_name: &str,
    document: Value,
) -> TransferResult<Vec<Candidate>> {
    match document {
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(position, record)| Candidate {
                position,
                key: None,
                record,
            })
            .collect()),
        Value::Object(entries) => Ok(entries
            .into_iter()
            .enumerate()
            .map(|(position, (key, record))| Candidate {
                position,
                key: Some(key),
                record,
            })
            .collect()),
        other => Err(TransferError::unreadable(
            source_name,
            format!("expected a record list, got {}", json_kind(&other)),
        )),
    }
}

/// Already-deserialized document handed over by a request layer.
pub struct InlineSource {
    name: String,
    document: Option<Value>,
}

impl InlineSource {
    pub fn new(name: impl Into<String>, document: Value) -> Self {
        Self {
            name: name.into(),
            document: Some(document),
        }
    }
}

impl RecordSource for InlineSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_candidates(&mut self) -> TransferResult<Vec<Candidate>> {
        let document = self
            .document
            .take()
            .ok_or_else(|| TransferError::unreadable(&self.name, "document already consumed"))?;
        candidates_from_document(&self.name, document)
    }
}

/// Flat JSON file source.
pub struct JsonFileSource {
    path: PathBuf,
    name: String,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        Self { path, name }
    }
}

impl RecordSource for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_candidates(&mut self) -> TransferResult<Vec<Candidate>> {
        let file = File::open(&self.path)
            .map_err(|err| TransferError::unreadable(&self.name, err.to_string()))?;
        let document: Value = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| TransferError::unreadable(&self.name, format!("invalid JSON: {err}")))?;
        candidates_from_document(&self.name, document)
    }
}

/// Flat JSON file sink. Writes the canonical record-list array.
pub struct JsonFileSink {
    path: PathBuf,
    name: String,
    pretty: bool,
}

impl JsonFileSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        Self {
            path,
            name,
            pretty: true,
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl RecordSink for JsonFileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_users(&mut self, users: &[User]) -> TransferResult<()> {
        let file = File::create(&self.path)
            .map_err(|err| TransferError::unwritable(&self.name, err.to_string()))?;
        let mut writer = BufWriter::new(file);
        let encoded = if self.pretty {
            serde_json::to_writer_pretty(&mut writer, users)
        } else {
            serde_json::to_writer(&mut writer, users)
        };
        encoded.map_err(|err| TransferError::unwritable(&self.name, err.to_string()))?;
        writer
            .write_all(b"\n")
            .and_then(|()| writer.flush())
            .map_err(|err| TransferError::unwritable(&self.name, err.to_string()))
    }
}

/// In-memory sink, mostly for callers that want the exported records back.
#[derive(Debug, Default)]
pub struct VecSink {
    pub records: Vec<Value>,
}

impl RecordSink for VecSink {
    fn name(&self) -> &str {
        "memory"
    }

    fn write_users(&mut self, users: &[User]) -> TransferResult<()> {
        self.records = users.iter().map(User::to_record).collect();
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::{candidates_from_document, InlineSource, RecordSource};
    use crate::transfer::TransferError;
    use serde_json::json;

    #[test]
    fn array_documents_keep_positions() {
        let candidates =
            candidates_from_document("inline", json!([{"id": 1}, {"id": 2}])).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].position, 1);
        assert_eq!(candidates[1].key, None);
    }

    #[test]
    fn keyed_documents_carry_their_keys() {
        let candidates =
            candidates_from_document("inline", json!({"7": {"id": 7}})).unwrap();
        assert_eq!(candidates[0].key.as_deref(), Some("7"));
    }

    #[test]
    fn scalar_documents_are_unreadable() {
        let err = candidates_from_document("inline", json!("users")).unwrap_err();
        match err {
            TransferError::SourceUnreadable { source_name, reason } => {
                assert_eq!(source_name, "inline");
                assert!(reason.contains("a string"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn inline_source_is_single_use() {
        let mut source = InlineSource::new("payload", json!([]));
        assert!(source.read_candidates().unwrap().is_empty());
        assert!(matches!(
            source.read_candidates(),
            Err(TransferError::SourceUnreadable { .. })
        ));
    }
}
