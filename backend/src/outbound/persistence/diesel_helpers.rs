//! Shared fault mapping for the Diesel adapters.
//!
//! Adapters translate a [`StoreFault`] into their own port error enum, so
//! the connection-versus-query distinction (which decides retryability
//! upstream) is made in exactly one place.

use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Store failure, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreFault {
    /// Connectivity problem; transient and retryable.
    Connection(String),
    /// The statement itself failed.
    Query(String),
    /// A foreign-key parent vanished before the write landed.
    MissingParent(String),
}

impl From<PoolError> for StoreFault {
    fn from(error: PoolError) -> Self {
        match error {
            PoolError::Checkout { message } | PoolError::Build { message } => {
                Self::Connection(message)
            }
        }
    }
}

impl From<DieselError> for StoreFault {
    fn from(error: DieselError) -> Self {
        match &error {
            DieselError::DatabaseError(kind, info) => {
                debug!(?kind, message = info.message(), "diesel operation failed");
            }
            other => debug!(
                error_type = %std::any::type_name_of_val(other),
                "diesel operation failed"
            ),
        }

        match error {
            DieselError::NotFound => Self::Query("record not found".to_owned()),
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                Self::MissingParent(info.message().to_owned())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
                Self::Connection("database connection error".to_owned())
            }
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                Self::Query("duplicate key".to_owned())
            }
            DieselError::DatabaseError(_, _) | DieselError::QueryBuilderError(_) => {
                Self::Query("database error".to_owned())
            }
            _ => Self::Query("database error".to_owned()),
        }
    }
}
