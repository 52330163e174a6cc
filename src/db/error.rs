use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database connection failed: {0}")]
    Connection(String),
    #[error("database query failed: {0}")]
    Query(String),
    #[error("database migration failed: {0}")]
    Migration(String),
}

impl DatabaseError {
    /// The store could not be reached or could not complete the transaction,
    /// as opposed to a statement being rejected.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DatabaseError::Connection(_))
    }
}

// SQLITE_BUSY surfaces as an unknown kind once busy_timeout runs out.
const SQLITE_LOCKED_MESSAGES: [&str; 2] = ["database is locked", "database table is locked"];

impl From<DieselError> for DatabaseError {
    fn from(value: DieselError) -> Self {
        let unavailable = match &value {
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::ClosedConnection
                | DatabaseErrorKind::UnableToSendCommand
                | DatabaseErrorKind::SerializationFailure
                | DatabaseErrorKind::ReadOnlyTransaction => true,
                _ => SQLITE_LOCKED_MESSAGES
                    .iter()
                    .any(|locked| info.message().contains(locked)),
            },
            DieselError::BrokenTransactionManager
            | DieselError::RollbackErrorOnCommit { .. } => true,
            _ => false,
        };

        if unavailable {
            DatabaseError::Connection(value.to_string())
        } else {
            DatabaseError::Query(value.to_string())
        }
    }
}
