//! # Domain Types
//!
//! The entities the store runs on: products, invoices with their line items,
//! and the per-day sales report rows derived from them.
//!
//! Every entity carries a storage-assigned integer `id`; the business keys
//! (SKU, invoice number, report date) are separate UNIQUE columns. Row-shaped
//! types derive `sqlx::FromRow` behind the `sqlx` feature so the storage crate
//! can map them without this crate pulling in a database runtime.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// A tax rate in basis points (1 bp = 0.01%), so 500 = 5%.
///
/// Basis points keep the rate in integer space end to end; the percentage
/// form exists for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Display-only percentage form (500 bps -> 5.0).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the inventory ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Storage-assigned primary key.
    pub id: i64,

    /// Display name. Unique across the store.
    pub name: String,

    /// Stock Keeping Unit - the business identifier. Unique.
    pub sku: String,

    /// Free-text category used for filtering.
    pub category: String,

    /// What the store pays per unit, in minor units.
    pub buying_price_cents: i64,

    /// What the customer pays per unit, in minor units.
    pub selling_price_cents: i64,

    /// Units currently on the shelf.
    pub quantity_in_stock: i64,

    /// Restock threshold: at or below this the product is flagged low.
    pub reorder_level: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn buying_price(&self) -> Money {
        Money::from_minor(self.buying_price_cents)
    }

    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_minor(self.selling_price_cents)
    }

    /// Whether stock has fallen to the reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.quantity_in_stock <= self.reorder_level
    }

    /// Profit per unit at current prices. May be negative if the product is
    /// being sold below cost.
    #[inline]
    pub fn unit_margin(&self) -> Money {
        self.selling_price() - self.buying_price()
    }
}

/// Input for creating a product; the ledger assigns id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub category: String,
    pub buying_price_cents: i64,
    pub selling_price_cents: i64,
    pub quantity_in_stock: i64,
    pub reorder_level: i64,
}

// =============================================================================
// Payment Method
// =============================================================================

/// The fixed set of tender types the store accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Upi,
}

// =============================================================================
// Invoice
// =============================================================================

/// A finalized sale. Immutable once written: there is no edit or void path,
/// corrections are new invoices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    /// Storage-assigned primary key.
    pub id: i64,

    /// Human-readable business key, globally unique:
    /// `INV-<timestamp-millis>-<5-char-token>`.
    pub invoice_number: String,

    /// Customer name; defaults to the walk-in placeholder when not given.
    pub customer_name: String,

    pub customer_phone: Option<String>,

    /// Sum of line quantities.
    pub total_items: i64,

    /// Sum of line totals, before tax.
    pub subtotal_cents: i64,

    /// `subtotal x TAX_RATE`, rounded to minor units.
    pub tax_cents: i64,

    /// `subtotal + tax`.
    pub total_amount_cents: i64,

    pub payment_method: PaymentMethod,

    /// When the sale happened.
    pub invoice_date: DateTime<Utc>,

    pub created_at: DateTime<Utc>,

    /// Line items, always eager-loaded with the header.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<InvoiceItem>,
}

impl Invoice {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_minor(self.subtotal_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_minor(self.tax_cents)
    }

    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_minor(self.total_amount_cents)
    }
}

// =============================================================================
// Invoice Item
// =============================================================================

/// One line on an invoice. Product name and unit price are frozen copies
/// taken at checkout: a historical invoice must not change when the product
/// record is edited later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceItem {
    pub id: i64,
    pub invoice_id: i64,
    pub product_id: i64,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// Selling price at time of sale, minor units (frozen).
    pub unit_price_cents: i64,
    /// `quantity x unit_price`.
    pub line_total_cents: i64,
}

impl InvoiceItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_minor(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_minor(self.line_total_cents)
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// What the presentation layer hands the billing engine: a product reference
/// and a quantity. Prices are never trusted from the caller; the engine
/// snapshots them from the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i64,
}

// =============================================================================
// Sales Report
// =============================================================================

/// One materialized row per calendar date: sales, profit, transaction count.
///
/// Derived, never authoritative - always reconstructable from the invoices of
/// that date. Upsert semantics keep it to at most one row per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalesReport {
    pub id: i64,
    pub sale_date: NaiveDate,
    pub total_sales_cents: i64,
    pub total_profit_cents: i64,
    pub total_transactions: i64,
    pub created_at: DateTime<Utc>,
}

impl SalesReport {
    #[inline]
    pub fn total_sales(&self) -> Money {
        Money::from_minor(self.total_sales_cents)
    }

    #[inline]
    pub fn total_profit(&self) -> Money {
        Money::from_minor(self.total_profit_cents)
    }
}
