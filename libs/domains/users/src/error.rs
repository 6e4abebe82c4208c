use std::fmt;

use sea_orm::{DbErr, RuntimeErr, sqlx};
use thiserror::Error;

use crate::models::UserId;

/// Lookup key that produced a [`UserError::NotFound`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserKey {
    Id(UserId),
    Email(String),
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserKey::Id(id) => write!(f, "id {}", id),
            UserKey::Email(email) => write!(f, "email '{}'", email),
        }
    }
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found by {0}")]
    NotFound(UserKey),

    #[error("User with email '{0}' already exists")]
    AlreadyExists(String),

    #[error("Incorrect email or password")]
    IncorrectCredentials,

    #[error("User {0} is not allowed to add content")]
    PermissionDenied(UserId),

    #[error("Unknown user role: {0}")]
    UnknownRole(i32),

    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    /// Begin, commit or rollback of a unit of work failed.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// The workflow failed and the rollback that followed failed too.
    #[error("{source} (rollback failed: {reason})")]
    RollbackFailed {
        source: Box<UserError>,
        reason: String,
    },

    #[error("Database error: {0}")]
    Database(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl UserError {
    /// The error that caused the failure, looking through rollback wrappers.
    pub fn root(&self) -> &UserError {
        match self {
            UserError::RollbackFailed { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), UserError::NotFound(_))
    }

    /// Whole-workflow retry is safe: nothing was committed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.root(), UserError::Transaction(_))
    }
}

/// SQLSTATEs for a transaction that lost a race: serialization failure, deadlock
const TRANSIENT_SQLSTATES: [&str; 2] = ["40001", "40P01"];

impl From<DbErr> for UserError {
    fn from(err: DbErr) -> Self {
        if is_transient(&err) {
            UserError::Transaction(err.to_string())
        } else {
            UserError::Database(err.to_string())
        }
    }
}

/// Failures after which the aborted transaction can be replayed as a whole.
fn is_transient(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) => true,
        DbErr::Exec(RuntimeErr::SqlxError(e))
        | DbErr::Query(RuntimeErr::SqlxError(e))
        | DbErr::Conn(RuntimeErr::SqlxError(e)) => match &**e {
            sqlx::Error::Database(db_err) => db_err
                .code()
                .is_some_and(|code| TRANSIENT_SQLSTATES.contains(&code.as_ref())),
            sqlx::Error::PoolTimedOut => true,
            _ => false,
        },
        _ => false,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_unwraps_rollback_failure() {
        let err = UserError::RollbackFailed {
            source: Box::new(UserError::AlreadyExists("a@x.com".to_string())),
            reason: "connection reset".to_string(),
        };

        assert!(matches!(err.root(), UserError::AlreadyExists(email) if email == "a@x.com"));
        assert!(err.to_string().contains("rollback failed: connection reset"));
        assert!(err.to_string().contains("a@x.com"));
    }

    #[test]
    fn test_only_transaction_errors_are_retryable() {
        assert!(UserError::Transaction("pool timed out".into()).is_retryable());
        assert!(!UserError::Database("syntax error".into()).is_retryable());
        assert!(!UserError::IncorrectCredentials.is_retryable());
    }

    #[test]
    fn test_serialization_failure_and_deadlock_are_retryable() {
        for code in ["40001", "40P01"] {
            let err = UserError::from(sqlstate::query_error(code, "could not serialize access"));
            assert!(matches!(err, UserError::Transaction(_)), "{code}: {err:?}");
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn test_pool_acquire_timeout_is_retryable() {
        let err = UserError::from(DbErr::ConnectionAcquire(sea_orm::ConnAcquireErr::Timeout));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_other_database_errors_are_not_retryable() {
        let err = UserError::from(sqlstate::query_error("42601", "syntax error"));
        assert!(matches!(err, UserError::Database(_)));
        assert!(!err.is_retryable());

        let err = UserError::from(DbErr::Custom("bad row".into()));
        assert!(matches!(err, UserError::Database(_)));
    }

    #[test]
    fn test_not_found_display_names_the_key() {
        let err = UserError::NotFound(UserKey::Email("ghost@x.com".into()));
        assert_eq!(err.to_string(), "User not found by email 'ghost@x.com'");
        assert!(err.is_not_found());
    }
}
