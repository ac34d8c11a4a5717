//! Error types shared by the storage, repository and session layers.

use thiserror::Error;

/// Low-level reason behind a [`StorageError`].
#[derive(Debug, Error)]
pub enum StorageCause {
    #[error("LMDB error: {0}")]
    Lmdb(#[from] lmdb::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid UTF-8 in stored value: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("storage lock poisoned")]
    Poisoned,
    #[error("{0}")]
    Backend(String),
}

/// Any failure of the underlying storage medium: read, write, or a stored
/// payload that does not decode.
///
/// Raised by the store adapter and propagated unmodified by the repository.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StorageError {
    message: String,
    #[source]
    cause: Option<StorageCause>,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), cause: None }
    }

    pub fn with_cause(message: impl Into<String>, cause: impl Into<StorageCause>) -> Self {
        Self { message: message.into(), cause: Some(cause.into()) }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&StorageCause> {
        self.cause.as_ref()
    }
}

/// A malformed import file or an invalid workout form.
///
/// Always raised before any write is attempted.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("import is not valid JSON: {0}")]
    MalformedJson(String),
    #[error("import must be a JSON object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` must be an array")]
    NotAnArray(&'static str),
    #[error("{collection}[{index}] is invalid: {reason}")]
    InvalidRecord {
        collection: &'static str,
        index: usize,
        reason: String,
    },
    #[error("duplicate {kind} id `{id}`")]
    DuplicateId { kind: &'static str, id: String },
    #[error("workout name must not be empty")]
    EmptyName,
    #[error("a workout needs at least one exercise")]
    NoExercises,
    #[error("exercise {index}: {reason}")]
    InvalidExercise { index: usize, reason: &'static str },
    #[error("no workout template with id `{0}`")]
    UnknownTemplate(String),
}

/// Misuse of the in-memory session state.
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("a session is already in progress")]
    AlreadyActive,
    #[error("no session is in progress")]
    NoActiveSession,
    #[error("mark at least one exercise as completed before ending the workout")]
    NothingCompleted,
    #[error("no exercise with id `{0}` in this session")]
    UnknownExercise(String),
}

/// Everything the tracker facade can fail with.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
