use crate::DbValue;
use std::panic::panic_any;

/// Failure of a persistence operation.
///
/// The engine never retries or recovers locally: every error produced by the reflector, the
/// codec, the statement builder or the driver reaches the caller unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Zero rows where exactly one was expected.
    #[error("No entity in `{table}` with identifier {id}")]
    EntityNotFound { table: String, id: DbValue },
    /// The backend rejected an insert because of a primary key conflict.
    #[error("Duplicate insert into `{table}`: {message}")]
    DuplicateInsert { table: String, message: String },
    /// Any other backend failure, the message is the one reported by the backend.
    #[error("{0}")]
    Database(String),
    /// More than one row where at most one was expected, the table lacks a uniqueness constraint.
    #[error("Expected at most one row in `{table}` but found {rows}")]
    NoUniqueKey { table: String, rows: usize },
    /// Reflection or conversion failure.
    #[error("Mapping error: {0}")]
    Mapping(String),
}

impl Error {
    pub fn mapping(message: impl Into<String>) -> Self {
        Error::Mapping(message.into())
    }

    pub fn database(message: impl Into<String>) -> Self {
        Error::Database(message.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Raising form of the operations: unwinds with the [`Error`] as panic payload.
///
/// The payload can be recovered with `std::panic::catch_unwind` and `downcast::<Error>()`.
/// ```rust,ignore
/// let person: Person = orchestrator.select_by_id(&mut conn, 1).or_raise();
/// ```
pub trait Raise<T> {
    fn or_raise(self) -> T;
}

impl<T> Raise<T> for Result<T> {
    fn or_raise(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => panic_any(e),
        }
    }
}
