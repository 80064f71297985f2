pub mod gateway;
pub mod repository;
pub mod seed;
pub mod sqlite;

pub use gateway::*;
pub use repository::*;
pub use sqlite::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity_type} {id} references missing {reference}")]
    BrokenReference {
        entity_type: String,
        id: String,
        reference: String,
    },

    #[error("Composite write of {entity_type} rolled back: {reason}")]
    PartialWrite { entity_type: String, reason: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid stored value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Internal lock error")]
    LockPoisoned,
}

/// Coarse classification consumed by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Storage,
    PartialFailure,
}

impl ErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Validation => 400,
            ErrorKind::Storage | ErrorKind::PartialFailure => 500,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Validation => "BAD_REQUEST",
            ErrorKind::Storage => "STORAGE",
            ErrorKind::PartialFailure => "PARTIAL_FAILURE",
        }
    }
}

impl DatabaseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatabaseError::NotFound { .. } => ErrorKind::NotFound,
            DatabaseError::Validation(_) => ErrorKind::Validation,
            DatabaseError::PartialWrite { .. } => ErrorKind::PartialFailure,
            DatabaseError::Sqlite(_)
            | DatabaseError::Io(_)
            | DatabaseError::BrokenReference { .. }
            | DatabaseError::InvalidEnum { .. }
            | DatabaseError::InvalidValue { .. }
            | DatabaseError::MigrationFailed { .. }
            | DatabaseError::LockPoisoned => ErrorKind::Storage,
        }
    }

    pub(crate) fn not_found(entity_type: &str, id: i64) -> Self {
        DatabaseError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_transport_status_codes() {
        assert_eq!(DatabaseError::not_found("Patient", 3).kind().status_code(), 404);
        assert_eq!(DatabaseError::Validation("bad".into()).kind().status_code(), 400);
        let broken = DatabaseError::BrokenReference {
            entity_type: "Appointment".into(),
            id: "1".into(),
            reference: "Patient 9".into(),
        };
        assert_eq!(broken.kind(), ErrorKind::Storage);
        assert_eq!(broken.kind().status_code(), 500);
        let partial = DatabaseError::PartialWrite {
            entity_type: "Doctor".into(),
            reason: "constraint".into(),
        };
        assert_eq!(partial.kind().code(), "PARTIAL_FAILURE");
    }

    #[test]
    fn sqlite_errors_keep_engine_message() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err: DatabaseError = conn.execute("INSERT INTO missing VALUES (1)", []).unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(err.to_string().contains("no such table"));
    }
}
