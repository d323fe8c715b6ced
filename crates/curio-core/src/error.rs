//! Error types for curio.

use thiserror::Error;

/// Result type alias using curio's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for curio operations.
///
/// Every failure inside the write pipeline is expressed as one of these
/// variants; the HTTP layer maps each variant to a status code.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed for a reason not otherwise classified
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Pool or connection failure (timeout, closed pool, socket error)
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Foreign-key or unique constraint rejected a statement at execution time
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Resource not found, or not visible to the actor
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input (missing title, empty membership, unknown item, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// The query guard flagged a statement before execution
    #[error("Rejected by query guard: {0}")]
    GuardRejection(String),

    /// No authenticated actor on the request
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not authorized
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Optimistic concurrency check failed
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Classify a sqlx error into the pipeline taxonomy.
    ///
    /// Pool exhaustion and socket failures become [`Error::Connectivity`];
    /// foreign-key and unique violations become [`Error::ConstraintViolation`];
    /// everything else stays a [`Error::Database`].
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_) => Error::Connectivity(err.to_string()),
            sqlx::Error::Database(db_err)
                if db_err.is_foreign_key_violation() || db_err.is_unique_violation() =>
            {
                let detail = match db_err.constraint() {
                    Some(constraint) => format!("{} ({})", db_err.message(), constraint),
                    None => db_err.message().to_string(),
                };
                Error::ConstraintViolation(detail)
            }
            _ => Error::Database(err),
        }
    }

    /// True when the error is caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::Validation(_)
                | Error::GuardRejection(_)
                | Error::Unauthorized(_)
                | Error::Forbidden(_)
                | Error::Conflict(_)
        )
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::from_sqlx(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("item list 4".to_string());
        assert_eq!(err.to_string(), "Not found: item list 4");
    }

    #[test]
    fn test_error_display_guard_rejection() {
        let err = Error::GuardRejection("tautology".to_string());
        assert_eq!(err.to_string(), "Rejected by query guard: tautology");
    }

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation("title is required".to_string());
        assert_eq!(err.to_string(), "Validation error: title is required");
    }

    #[test]
    fn test_pool_timeout_is_connectivity() {
        let err = Error::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, Error::Connectivity(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_pool_closed_is_connectivity() {
        let err = Error::from_sqlx(sqlx::Error::PoolClosed);
        assert!(matches!(err, Error::Connectivity(_)));
    }

    #[test]
    fn test_row_not_found_stays_database() {
        let err = Error::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(Error::Forbidden("admin only".into()).is_client_error());
        assert!(Error::Conflict("stale".into()).is_client_error());
        assert!(!Error::ConstraintViolation("fk".into()).is_client_error());
        assert!(!Error::Internal("boom".into()).is_client_error());
    }

    #[test]
    fn test_serde_error_is_internal() {
        let parse = serde_json::from_str::<i64>("not a number").unwrap_err();
        let err = Error::from(parse);
        assert!(matches!(err, Error::Internal(_)));
    }
}
