//! # Repositories
//!
//! One repository per table, each a thin wrapper over the shared pool.
//! Repositories translate rows to domain types and constraint failures to
//! `DbError`; they never apply business rules.

pub mod invoice;
pub mod product;
pub mod report;

pub use invoice::InvoiceRepository;
pub use product::ProductRepository;
pub use report::ReportRepository;
