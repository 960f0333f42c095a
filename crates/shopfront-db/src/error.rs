//! # Database Error Types
//!
//! Wraps `sqlx::Error` into a taxonomy the service layer can match on.
//! Constraint violations are classified by message because SQLite reports
//! them as flat strings; the UNIQUE and FOREIGN KEY prefixes are stable.

use thiserror::Error;

/// Database operation failure.
#[derive(Debug, Error)]
pub enum DbError {
    /// The targeted row does not exist (or an UPDATE matched nothing).
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// UNIQUE constraint violation: duplicate SKU, name, invoice number,
    /// or report date.
    #[error("duplicate value for {constraint}")]
    UniqueViolation { constraint: String },

    /// FOREIGN KEY constraint violation, e.g. deleting a product that still
    /// appears on invoices.
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Could not open or connect to the database.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration run failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// A query failed for a reason other than a classified constraint.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Pool acquire timed out; the operation is retryable.
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Anything else sqlx can report.
    #[error("internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether this failure hit a UNIQUE constraint on the given column
    /// (matched as `table.column` in SQLite's message).
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { constraint } if constraint.contains(column))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "record",
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                // SQLite constraint messages:
                //   "UNIQUE constraint failed: <table>.<column>"
                //   "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let constraint = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation { constraint }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for storage operations.
pub type DbResult<T> = Result<T, DbError>;
