//! Error types for pgboard
//!
//! Every fallible operation returns [`DbResult`]. Driver errors are folded
//! into the [`DbError`] taxonomy in exactly one place ([`DbError::from_db_error`]),
//! so callers match on error kind instead of SQLSTATE strings.

use thiserror::Error;

/// Result type alias for pgboard operations
pub type DbResult<T> = Result<T, DbError>;

/// Error taxonomy for database operations.
///
/// The retry layer treats `Validation`, `NotFound` and `Duplicate` as
/// permanent (see [`DbError::is_permanent`]); everything else may be retried.
#[derive(Debug, Error)]
pub enum DbError {
    /// Connection-level failure (refused, host not found, socket dropped)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement shape problem (missing table, unknown column)
    #[error("Query error: {message}")]
    Query {
        message: String,
        code: Option<String>,
        /// Text of the failing statement, when the execution layer knows it.
        sql: Option<String>,
        #[source]
        cause: Option<tokio_postgres::Error>,
    },

    /// Transaction lifecycle misuse (unknown id, already finished)
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Input rejected, locally or by a NOT NULL / foreign key constraint
    #[error("Validation error: {message}")]
    Validation {
        field: Option<String>,
        message: String,
        code: Option<String>,
        #[source]
        cause: Option<tokio_postgres::Error>,
    },

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate value: {message}")]
    Duplicate {
        field: Option<String>,
        message: String,
        code: Option<String>,
        #[source]
        cause: Option<tokio_postgres::Error>,
    },

    /// Anything the classifier does not recognize, SQLSTATE preserved
    #[error("Database error: {message}")]
    Database {
        message: String,
        code: Option<String>,
        #[source]
        cause: Option<tokio_postgres::Error>,
    },
}

impl DbError {
    /// Create a transaction error
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction(message.into())
    }

    /// Create a validation error with no field context
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            field: None,
            message: message.into(),
            code: None,
            cause: None,
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a unique violation
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Errors that no amount of retrying will fix.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::NotFound(_) | Self::Duplicate { .. }
        )
    }

    /// Parse a tokio_postgres error into a specific DbError.
    ///
    /// Server-reported errors are classified by SQLSTATE; errors whose cause
    /// chain bottoms out in I/O (refused connection, dropped socket) become
    /// `Connection`; the rest fall through to `Database` with the original
    /// error attached.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        let classified = err.as_db_error().map(|db_err| {
            classify_code(
                db_err.code().code(),
                db_err.constraint().or(db_err.column()),
                db_err.message(),
            )
        });
        match classified {
            Some(kind) => kind.with_cause(err),
            None if err.is_closed() || has_io_cause(&err) => Self::Connection(err.to_string()),
            None => Self::Database {
                message: err.to_string(),
                code: None,
                cause: Some(err),
            },
        }
    }

    fn with_cause(self, err: tokio_postgres::Error) -> Self {
        match self {
            Self::Query {
                message, code, sql, ..
            } => Self::Query {
                message,
                code,
                sql,
                cause: Some(err),
            },
            Self::Validation {
                field, message, code, ..
            } => Self::Validation {
                field,
                message,
                code,
                cause: Some(err),
            },
            Self::Duplicate {
                field, message, code, ..
            } => Self::Duplicate {
                field,
                message,
                code,
                cause: Some(err),
            },
            Self::Database { message, code, .. } => Self::Database {
                message,
                code,
                cause: Some(err),
            },
            other => other,
        }
    }

    /// Attach the failing statement's text to a query error.
    ///
    /// Other kinds pass through unchanged; an already-recorded statement is
    /// kept.
    pub fn with_statement(self, statement: &str) -> Self {
        match self {
            Self::Query {
                message,
                code,
                sql: None,
                cause,
            } => Self::Query {
                message,
                code,
                sql: Some(statement.to_string()),
                cause,
            },
            other => other,
        }
    }
}

/// Map a vendor error code to an error kind.
///
/// This is the single place SQLSTATE values are known. `constraint` is the
/// violated constraint or column name when the server reported one.
pub(crate) fn classify_code(code: &str, constraint: Option<&str>, message: &str) -> DbError {
    let detail = match constraint {
        Some(name) => format!("{name}: {message}"),
        None => message.to_string(),
    };
    match code {
        // unique_violation
        "23505" => DbError::Duplicate {
            field: constraint.map(str::to_string),
            message: detail,
            code: Some(code.to_string()),
            cause: None,
        },
        // foreign_key_violation, not_null_violation
        "23503" | "23502" => DbError::Validation {
            field: constraint.map(str::to_string),
            message: detail,
            code: Some(code.to_string()),
            cause: None,
        },
        // undefined_table, undefined_column
        "42P01" | "42703" => DbError::Query {
            message: detail,
            code: Some(code.to_string()),
            sql: None,
            cause: None,
        },
        "ECONNREFUSED" | "ENOTFOUND" => DbError::Connection(detail),
        _ => DbError::Database {
            message: detail,
            code: Some(code.to_string()),
            cause: None,
        },
    }
}

fn has_io_cause(err: &tokio_postgres::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if cause.is::<std::io::Error>() {
            return true;
        }
        source = cause.source();
    }
    false
}

impl From<tokio_postgres::Error> for DbError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::from_db_error(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for DbError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Connection(err.to_string())
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::CreatePoolError> for DbError {
    fn from(err: deadpool_postgres::CreatePoolError) -> Self {
        Self::Connection(err.to_string())
    }
}
