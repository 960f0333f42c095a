//! # shopfront-pos: Service Layer
//!
//! The three services behind the counter, composed as a pipeline from cart
//! to persisted report:
//!
//! ```text
//! presentation ──► BillingEngine ──► InventoryLedger ──► storage
//!                       │
//!                       └──(on demand)──► SalesAggregator ──► sales_reports
//! ```
//!
//! - [`InventoryLedger`] owns product records and is the only component that
//!   mutates stock.
//! - [`BillingEngine`] turns a validated cart into a durable invoice and a
//!   consistent stock state.
//! - [`SalesAggregator`] rolls invoices into per-day report rows,
//!   idempotently.
//!
//! Each service is constructed with an explicit [`shopfront_db::Database`]
//! handle; there is no shared global connection. All inputs are primitives or
//! core types, all failures are [`PosError`] variants.

pub mod billing;
pub mod error;
pub mod inventory;
pub mod reports;

pub use billing::BillingEngine;
pub use error::{PosError, PosResult};
pub use inventory::InventoryLedger;
pub use reports::SalesAggregator;
