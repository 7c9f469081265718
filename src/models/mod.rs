//! Database-backed models and their domain errors.

use thiserror::Error;

pub mod snippets;
pub mod users;

pub use snippets::Snippet;

/// Errors from snippet reads and writes.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No live record matches; expired rows count as absent.
    #[error("no matching record found")]
    NotFound,

    #[error("storage unavailable")]
    Unavailable(#[source] sqlx::Error),
}

/// Errors from login attempts.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email and wrong password are deliberately indistinguishable.
    #[error("email or password is incorrect")]
    InvalidCredentials,

    #[error("storage unavailable")]
    Unavailable(#[source] sqlx::Error),
}

/// Errors from user registration.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("a user with this email address already exists")]
    DuplicateEmail,

    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),

    #[error("storage unavailable")]
    Unavailable(#[source] sqlx::Error),
}

/// True when `err` is a unique-constraint violation (SQLSTATE 23505). The
/// structured code is the only signal used; error text is never parsed.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    #[test]
    fn unique_violation_matches_sqlstate_23505() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn other_codes_are_not_unique_violations() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23503"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError { code: None }));
        assert!(!is_unique_violation(&err));
    }

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
