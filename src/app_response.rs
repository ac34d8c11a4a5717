use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

use crate::error::{SessionError, StorageError, TrackerError, ValidationError};

/// Envelope returned by every FFI call, serialized as `{"<Variant>": "<message>"}`.
///
/// Successful calls carry their JSON payload as the `Ok` string.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum AppResponse {
    DatabaseError(String),
    SerializationError(String),
    NotFound(String),
    ValidationError(String),
    BadRequest(String),
    Ok(String),
}

impl Display for AppResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppResponse::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppResponse::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppResponse::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppResponse::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppResponse::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppResponse::Ok(msg) => write!(f, "Ok: {}", msg),
        }
    }
}

impl From<StorageError> for AppResponse {
    fn from(err: StorageError) -> Self {
        match err.cause() {
            Some(cause) => AppResponse::DatabaseError(format!("{}: {}", err.message(), cause)),
            None => AppResponse::DatabaseError(err.message().to_string()),
        }
    }
}

impl From<ValidationError> for AppResponse {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::UnknownTemplate(_) => AppResponse::NotFound(err.to_string()),
            _ => AppResponse::ValidationError(err.to_string()),
        }
    }
}

impl From<SessionError> for AppResponse {
    fn from(err: SessionError) -> Self {
        AppResponse::BadRequest(err.to_string())
    }
}

impl From<TrackerError> for AppResponse {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::Storage(e) => e.into(),
            TrackerError::Validation(e) => e.into(),
            TrackerError::Session(e) => e.into(),
        }
    }
}

impl From<SerdeError> for AppResponse {
    fn from(err: SerdeError) -> Self {
        AppResponse::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl AppResponse {
    pub fn success(msg: impl Into<String>) -> Self {
        AppResponse::Ok(msg.into())
    }

    /// Wraps a payload as `Ok(<json>)`.
    pub fn from_payload<T: Serialize>(payload: &T) -> Self {
        match serde_json::to_string(payload) {
            Ok(json) => AppResponse::Ok(json),
            Err(e) => e.into(),
        }
    }
}
