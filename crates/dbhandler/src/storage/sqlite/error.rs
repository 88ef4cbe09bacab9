//! SQLite error mapping.
//!
//! Maps `tokio_rusqlite::Error` and `rusqlite::Error` to `RepositoryError` from
//! `dbhandler_core::storage`. Constraint, decode and open failures get semantic
//! variants; everything else is reported as a failed query or a failed write.

use dbhandler_core::storage::RepositoryError;

/// Whether the failing statement was a read or a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Query,
    Exec,
}

fn map_rusqlite_error(
    err: &rusqlite::Error,
    entity_type: &'static str,
    id: &str,
    operation: Operation,
) -> RepositoryError {
    match err {
        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            RepositoryError::AlreadyExists {
                entity_type,
                id: id.to_string(),
            }
        }

        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.code == rusqlite::ErrorCode::CannotOpen =>
        {
            RepositoryError::ConnectionFailed(format!("Cannot open database: {err}"))
        }

        rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
            entity_type,
            id: id.to_string(),
        },

        // Column decoding
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::InvalidColumnName(_)
        | rusqlite::Error::IntegralValueOutOfRange(..) => {
            RepositoryError::Scan(format!("{entity_type} {id}: {err}"))
        }

        rusqlite::Error::ToSqlConversionFailure(_) => RepositoryError::Marshal(err.to_string()),

        _ => match operation {
            Operation::Query => RepositoryError::QueryFailed(err.to_string()),
            Operation::Exec => RepositoryError::ExecFailed(err.to_string()),
        },
    }
}

/// Maps a tokio_rusqlite error to a RepositoryError.
///
/// `id` names the record the statement was about and ends up in `NotFound` and
/// `AlreadyExists`.
pub fn map_tokio_rusqlite_error(
    err: tokio_rusqlite::Error,
    entity_type: &'static str,
    id: impl Into<String>,
    operation: Operation,
) -> RepositoryError {
    let id = id.into();
    match &err {
        tokio_rusqlite::Error::Rusqlite(rusqlite_err) => {
            map_rusqlite_error(rusqlite_err, entity_type, &id, operation)
        }
        tokio_rusqlite::Error::Close(_) => {
            RepositoryError::ConnectionFailed("Connection closed unexpectedly".to_string())
        }
        _ => match operation {
            Operation::Query => RepositoryError::QueryFailed(err.to_string()),
            Operation::Exec => RepositoryError::ExecFailed(err.to_string()),
        },
    }
}

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
pub fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    fn sqlite_failure(code: rusqlite::ErrorCode, extended_code: i32) -> tokio_rusqlite::Error {
        let sqlite_err = ffi::Error {
            code,
            extended_code,
        };
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(sqlite_err, None))
    }

    #[test]
    fn test_unique_constraint_maps_to_already_exists() {
        let err = sqlite_failure(
            rusqlite::ErrorCode::ConstraintViolation,
            ffi::SQLITE_CONSTRAINT_UNIQUE,
        );

        let result = map_tokio_rusqlite_error(err, "Customer", "c-1", Operation::Exec);

        assert_eq!(
            result,
            RepositoryError::AlreadyExists {
                entity_type: "Customer",
                id: "c-1".to_string(),
            }
        );
    }

    #[test]
    fn test_primary_key_maps_to_already_exists() {
        let err = sqlite_failure(
            rusqlite::ErrorCode::ConstraintViolation,
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
        );

        let result = map_tokio_rusqlite_error(err, "Queue", "q-1", Operation::Exec);

        assert!(matches!(
            result,
            RepositoryError::AlreadyExists {
                entity_type: "Queue",
                ..
            }
        ));
    }

    #[test]
    fn test_no_rows_maps_to_not_found() {
        let err = tokio_rusqlite::Error::Rusqlite(rusqlite::Error::QueryReturnedNoRows);

        let result = map_tokio_rusqlite_error(err, "Account", "abc-123", Operation::Exec);

        match result {
            RepositoryError::NotFound { entity_type, id } => {
                assert_eq!(entity_type, "Account");
                assert_eq!(id, "abc-123");
            }
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_conversion_failure_maps_to_scan() {
        let json_err = serde_json::from_str::<Vec<String>>("{").unwrap_err();
        let err = tokio_rusqlite::Error::Rusqlite(rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            Box::new(json_err),
        ));

        let result = map_tokio_rusqlite_error(err, "Queue", "q-1", Operation::Query);

        assert!(matches!(result, RepositoryError::Scan(_)));
    }

    #[test]
    fn test_other_error_depends_on_operation() {
        let query = map_tokio_rusqlite_error(
            tokio_rusqlite::Error::Other(Box::new(std::io::Error::other("boom"))),
            "Call",
            "c-1",
            Operation::Query,
        );
        let exec = map_tokio_rusqlite_error(
            tokio_rusqlite::Error::Other(Box::new(std::io::Error::other("boom"))),
            "Call",
            "c-1",
            Operation::Exec,
        );

        assert!(matches!(query, RepositoryError::QueryFailed(_)));
        assert!(matches!(exec, RepositoryError::ExecFailed(_)));
    }
}
