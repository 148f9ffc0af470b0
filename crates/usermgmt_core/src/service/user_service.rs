//! User service facade.
//!
//! # Responsibility
//! - Single entry point for request layers (HTTP, CLI).
//! - Dispatch to store and bulk transfer; wrap every outcome in one envelope.
//! - Own all logging for user operations.
//!
//! # Invariants
//! - No validation or storage logic lives here.
//! - Each core error kind maps to exactly one `ErrorCode`.

use crate::config::ServiceConfig;
use crate::logging::sanitize_message;
use crate::model::user::{User, UserId};
use crate::model::validation::Violation;
use crate::repo::user_store::{StoreError, UserStore};
use crate::transfer::bulk::{export_records, export_to, load_from, LoadOptions, LoadReport};
use crate::transfer::source::{InlineSource, JsonFileSink, JsonFileSource};
use crate::transfer::TransferError;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

const MAX_LOGGED_DETAIL_CHARS: usize = 200;

/// Stable, externally visible error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ValidationFailed,
    DuplicateId,
    NotFound,
    SourceUnreadable,
    SinkUnwritable,
    StoreBusy,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ValidationFailed => "validation_failed",
            Self::DuplicateId => "duplicate_id",
            Self::NotFound => "not_found",
            Self::SourceUnreadable => "source_unreadable",
            Self::SinkUnwritable => "sink_unwritable",
            Self::StoreBusy => "store_busy",
        }
    }

    /// HTTP status a transport layer should use for this code.
    pub fn http_status(self) -> u16 {
        match self {
            Self::ValidationFailed => 422,
            Self::DuplicateId => 409,
            Self::NotFound => 404,
            Self::SourceUnreadable => 400,
            Self::SinkUnwritable => 500,
            Self::StoreBusy => 503,
        }
    }
}

/// Error part of a `ServiceResponse`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        let message = value.to_string();
        match value {
            StoreError::ValidationFailed(errors) => Self {
                code: ErrorCode::ValidationFailed,
                message,
                violations: errors.into_violations(),
            },
            StoreError::DuplicateId(_) => Self::plain(ErrorCode::DuplicateId, message),
            StoreError::NotFound(_) => Self::plain(ErrorCode::NotFound, message),
            StoreError::LockTimeout(_) => Self::plain(ErrorCode::StoreBusy, message),
        }
    }
}

impl From<TransferError> for ServiceError {
    fn from(value: TransferError) -> Self {
        let message = value.to_string();
        match value {
            TransferError::Store(err) => err.into(),
            TransferError::SourceUnreadable { .. } => {
                Self::plain(ErrorCode::SourceUnreadable, message)
            }
            TransferError::SinkUnwritable { .. } => Self::plain(ErrorCode::SinkUnwritable, message),
        }
    }
}

impl ServiceError {
    fn plain(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            violations: Vec::new(),
        }
    }
}

/// Uniform success/error envelope returned by every facade call.
///
/// Exactly one of `data` and `error` is set, matching `ok`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ServiceError>,
}

impl<T> ServiceResponse<T> {
    fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    fn failure(error: ServiceError) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error),
        }
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&ServiceError> {
        self.error.as_ref()
    }

    /// Converts the envelope back into a `Result`.
    pub fn into_result(self) -> Result<T, ServiceError> {
        match (self.data, self.error) {
            (_, Some(error)) => Err(error),
            (Some(data), None) => Ok(data),
            (None, None) => unreachable!("service response built without data or error"),
        }
    }

    /// Error code of a failed response.
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|error| error.code)
    }
}

/// Health probe payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub users: usize,
}

/// Facade over one `UserStore`.
pub struct UserService {
    store: UserStore,
    config: ServiceConfig,
}

impl UserService {
    /// Creates a service with an empty store configured from `config`.
    pub fn new(config: ServiceConfig) -> Self {
        let store = UserStore::with_lock_timeout(config.lock_timeout());
        info!(
            "event=service_init module=service status=ok lock_timeout_ms={}",
            config.lock_timeout_ms
        );
        Self { store, config }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn health(&self) -> ServiceResponse<HealthStatus> {
        let result = self.store.count().map(|users| HealthStatus {
            status: "ok",
            users,
        });
        respond("health", result.map_err(ServiceError::from))
    }

    /// Adds one record; never overwrites an existing id.
    pub fn add_user(&self, candidate: &Value) -> ServiceResponse<User> {
        debug!(
            "event=user_add module=service status=start id={}",
            candidate.get("id").map(Value::to_string).unwrap_or_default()
        );
        let result = self.store.add(candidate).map_err(ServiceError::from);
        if let Ok(user) = &result {
            info!("event=user_add module=service status=ok id={}", user.id());
        }
        respond("user_add", result)
    }

    pub fn get_user(&self, id: UserId) -> ServiceResponse<User> {
        respond("user_get", self.store.get(id).map_err(ServiceError::from))
    }

    pub fn list_users(&self) -> ServiceResponse<Vec<User>> {
        let result = self.store.list().map_err(ServiceError::from);
        if let Ok(users) = &result {
            debug!("event=user_list module=service status=ok count={}", users.len());
        }
        respond("user_list", result)
    }

    pub fn count_users(&self) -> ServiceResponse<usize> {
        respond("user_count", self.store.count().map_err(ServiceError::from))
    }

    /// Removes one user and returns the removed record.
    pub fn remove_user(&self, id: UserId) -> ServiceResponse<User> {
        let result = self.store.remove(id).map_err(ServiceError::from);
        if let Ok(user) = &result {
            info!("event=user_remove module=service status=ok id={}", user.id());
        }
        respond("user_remove", result)
    }

    /// Drops every user. Returns the number removed.
    pub fn clear_users(&self) -> ServiceResponse<usize> {
        let result = self.store.clear().map_err(ServiceError::from);
        if let Ok(dropped) = &result {
            info!("event=user_clear module=service status=ok dropped={dropped}");
        }
        respond("user_clear", result)
    }

    /// Bulk-loads an already-deserialized record document.
    pub fn load_users(
        &self,
        document: Value,
        options: LoadOptions,
    ) -> ServiceResponse<LoadReport> {
        let mut source = InlineSource::new("request", document);
        let result = load_from(&self.store, &mut source, options).map_err(ServiceError::from);
        log_load_report("request", &result);
        respond("user_load", result)
    }

    /// Bulk-loads a flat JSON file.
    pub fn load_users_from_file(
        &self,
        path: impl AsRef<Path>,
        options: LoadOptions,
    ) -> ServiceResponse<LoadReport> {
        let path = path.as_ref();
        info!(
            "event=user_load module=service status=start source={} replace={}",
            path.display(),
            options.replace_existing
        );
        let mut source = JsonFileSource::new(path);
        let result = load_from(&self.store, &mut source, options).map_err(ServiceError::from);
        log_load_report(&path.display().to_string(), &result);
        respond("user_load", result)
    }

    /// Snapshot of all records in load-compatible shape.
    pub fn export_users(&self) -> ServiceResponse<Vec<Value>> {
        respond("user_export", export_records(&self.store).map_err(ServiceError::from))
    }

    /// Writes all records to a flat JSON file. Returns the record count.
    pub fn export_users_to_file(&self, path: impl AsRef<Path>) -> ServiceResponse<usize> {
        let path = path.as_ref();
        let mut sink = JsonFileSink::new(path).pretty(self.config.export_pretty);
        let result = export_to(&self.store, &mut sink).map_err(ServiceError::from);
        if let Ok(count) = &result {
            info!(
                "event=user_export module=service status=ok sink={} count={count}",
                path.display()
            );
        }
        respond("user_export", result)
    }

    /// Loads `config.data_file` when it exists and is non-empty.
    ///
    /// Returns `None` data when there was nothing to preload.
    pub fn preload(&self) -> ServiceResponse<Option<LoadReport>> {
        let Some(path) = self.config.data_file.clone() else {
            return ServiceResponse::success(None);
        };
        let has_content = std::fs::metadata(&path)
            .map(|meta| meta.is_file() && meta.len() > 0)
            .unwrap_or(false);
        if !has_content {
            warn!(
                "event=user_preload module=service status=skip source={} reason=missing_or_empty",
                path.display()
            );
            return ServiceResponse::success(None);
        }

        let response = self.load_users_from_file(&path, LoadOptions::default());
        match response.into_result() {
            Ok(report) => ServiceResponse::success(Some(report)),
            Err(error) => ServiceResponse::failure(error),
        }
    }
}

fn respond<T>(event: &str, result: Result<T, ServiceError>) -> ServiceResponse<T> {
    match result {
        Ok(data) => ServiceResponse::success(data),
        Err(error) => {
            warn!(
                "event={} module=service status=error code={} detail={}",
                event,
                error.code.as_str(),
                sanitize_message(&error.message, MAX_LOGGED_DETAIL_CHARS)
            );
            ServiceResponse::failure(error)
        }
    }
}

fn log_load_report(source: &str, result: &Result<LoadReport, ServiceError>) {
    let Ok(report) = result else {
        return;
    };
    for skipped in &report.skipped_records {
        let reasons: Vec<String> = skipped.violations.iter().map(ToString::to_string).collect();
        warn!(
            "event=user_load module=service status=skip source={} position={} key={} reasons={}",
            source,
            skipped.position,
            skipped.key.as_deref().unwrap_or("-"),
            sanitize_message(&reasons.join("; "), MAX_LOGGED_DETAIL_CHARS)
        );
    }
    info!(
        "event=user_load module=service status=ok source={} inserted={} overwritten={} skipped={}",
        source, report.inserted, report.overwritten, report.skipped
    );
}
