//! # shopfront-core: Pure Business Logic
//!
//! The heart of the Shopfront POS: money arithmetic, invoice totals math,
//! domain types, and input validation, all as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! presentation layer (out of scope)
//!        │
//!        ▼
//! shopfront-pos   ── ledger / billing / reports services
//!        │
//!        ▼
//! shopfront-core  ── THIS CRATE: types, money, totals, validation
//!        │
//!        ▼
//! shopfront-db    ── SQLite repositories (depends on this crate's types)
//! ```
//!
//! ## Design Principles
//! 1. **Pure functions**: same input, same output; no clocks, no randomness.
//! 2. **Integer money**: every monetary value is minor units in an `i64`.
//! 3. **Explicit errors**: validation failures are typed enum variants.

pub mod error;
pub mod money;
pub mod totals;
pub mod types;
pub mod validation;

pub use error::ValidationError;
pub use money::Money;
pub use totals::{compute_totals, price_line, InvoiceTotals, NewInvoice, PricedLine};
pub use types::*;

/// The fixed flat sales-tax rate: 5% (500 basis points).
///
/// A single-location store with one tax regime; there is deliberately no
/// per-product or per-region rate table.
pub const TAX_RATE: types::TaxRate = types::TaxRate::from_bps(500);

/// Customer name recorded when the cashier leaves the field blank.
pub const WALK_IN_CUSTOMER: &str = "Walk-in Customer";

/// Maximum quantity of a single product on one invoice line.
///
/// Guards against fat-finger entries (1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum number of distinct lines on one invoice.
pub const MAX_INVOICE_LINES: usize = 100;
