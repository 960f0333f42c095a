//! # Service Errors
//!
//! The failure taxonomy crossing the service boundary. Storage-level
//! constraint violations are lifted into their business meaning here
//! (UNIQUE -> Conflict, missing row -> NotFound); everything else stays a
//! typed storage failure so the caller can distinguish "your input is wrong"
//! from "the database is down".

use thiserror::Error;

use shopfront_core::ValidationError;
use shopfront_db::DbError;

/// A failed service operation.
#[derive(Debug, Error)]
pub enum PosError {
    /// Malformed or out-of-range input, rejected before any write.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Uniqueness violation: duplicate SKU, product name, or invoice
    /// number; also a delete blocked by existing invoice references.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation targeted an id that does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An invoice cannot be created from an empty cart.
    #[error("cannot create an invoice from an empty cart")]
    EmptyCart,

    /// A cart line asks for more units than are on the shelf. Raised before
    /// anything is written.
    #[error("insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// The invoice committed but one or more stock decrements did not. The
    /// invoice stands; the named products need manual reconciliation.
    #[error("invoice {invoice_id} committed but stock adjustment failed for product(s) {product_ids:?}")]
    PartialCommit {
        invoice_id: i64,
        product_ids: Vec<i64>,
    },

    /// The persistence layer itself failed (connectivity, timeout,
    /// unclassified constraint).
    #[error("storage failure: {0}")]
    Storage(DbError),
}

impl From<DbError> for PosError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => PosError::NotFound { entity, id },
            DbError::UniqueViolation { constraint } => {
                PosError::Conflict(format!("duplicate value for {constraint}"))
            }
            other => PosError::Storage(other),
        }
    }
}

/// Result alias for service operations.
pub type PosResult<T> = Result<T, PosError>;
