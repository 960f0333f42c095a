//! # Invoice Totals
//!
//! Pure math from a priced cart to invoice figures. The billing engine feeds
//! this with product snapshots; nothing here touches storage, so the full
//! totals contract is testable by itself.
//!
//! Invariants enforced here:
//! - `line_total = quantity x unit_price`
//! - `subtotal  = sum of line totals`
//! - `tax       = subtotal x TAX_RATE` (rounded to minor units)
//! - `total     = subtotal + tax`
//! - `total_items = sum of quantities`

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Product, TaxRate};

/// A cart line after pricing: the frozen snapshot that becomes an invoice
/// item. Captured at checkout so later product edits never touch history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

/// The computed figures for an invoice header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_amount_cents: i64,
    pub total_items: i64,
}

/// Snapshots a product at the given quantity into a priced line.
///
/// Unit price is the product's *current* selling price; the caller has
/// already validated the quantity.
pub fn price_line(product: &Product, quantity: i64) -> PricedLine {
    let unit_price = product.selling_price();
    PricedLine {
        product_id: product.id,
        product_name: product.name.clone(),
        quantity,
        unit_price_cents: unit_price.minor(),
        line_total_cents: unit_price.times(quantity).minor(),
    }
}

/// Folds priced lines into invoice totals at the given tax rate.
pub fn compute_totals(lines: &[PricedLine], rate: TaxRate) -> InvoiceTotals {
    let subtotal: Money = lines
        .iter()
        .map(|l| Money::from_minor(l.line_total_cents))
        .sum();
    let tax = subtotal.tax_at(rate);

    InvoiceTotals {
        subtotal_cents: subtotal.minor(),
        tax_cents: tax.minor(),
        total_amount_cents: (subtotal + tax).minor(),
        total_items: lines.iter().map(|l| l.quantity).sum(),
    }
}

/// A fully priced and totalled invoice, ready for persistence. The storage
/// layer assigns the ids; everything else is already final.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub payment_method: crate::types::PaymentMethod,
    pub invoice_date: chrono::DateTime<chrono::Utc>,
    pub totals: InvoiceTotals,
    pub lines: Vec<PricedLine>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TAX_RATE;
    use chrono::Utc;

    fn product(id: i64, name: &str, price_cents: i64) -> Product {
        Product {
            id,
            name: name.into(),
            sku: format!("SKU-{id}"),
            category: "Test".into(),
            buying_price_cents: price_cents / 2,
            selling_price_cents: price_cents,
            quantity_in_stock: 100,
            reorder_level: 10,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn line_snapshot_freezes_name_and_price() {
        let p = product(7, "Sunflower Oil 1L", 18000);
        let line = price_line(&p, 3);
        assert_eq!(line.product_id, 7);
        assert_eq!(line.product_name, "Sunflower Oil 1L");
        assert_eq!(line.unit_price_cents, 18000);
        assert_eq!(line.line_total_cents, 54000);
    }

    #[test]
    fn spec_example_three_units_at_hundred() {
        // 3 x Rs 100.00 -> subtotal 300.00, tax 15.00, total 315.00
        let p = product(1, "Ghee 500g", 10000);
        let lines = vec![price_line(&p, 3)];
        let totals = compute_totals(&lines, TAX_RATE);

        assert_eq!(totals.subtotal_cents, 30000);
        assert_eq!(totals.tax_cents, 1500);
        assert_eq!(totals.total_amount_cents, 31500);
        assert_eq!(totals.total_items, 3);
    }

    #[test]
    fn totals_identity_holds_for_mixed_carts() {
        let a = product(1, "Tea 250g", 12550);
        let b = product(2, "Sugar 1kg", 4499);
        let c = product(3, "Salt 1kg", 1901);

        for qty in 1..=9 {
            let lines = vec![price_line(&a, qty), price_line(&b, 2), price_line(&c, 5)];
            let totals = compute_totals(&lines, TAX_RATE);

            let subtotal: i64 = lines.iter().map(|l| l.line_total_cents).sum();
            assert_eq!(totals.subtotal_cents, subtotal);
            assert_eq!(
                totals.total_amount_cents,
                totals.subtotal_cents + totals.tax_cents
            );
            assert_eq!(totals.total_items, qty + 7);
        }
    }

    #[test]
    fn empty_cart_totals_are_zero() {
        // The billing engine rejects empty carts before it gets here, but the
        // math itself must still be well-defined.
        let totals = compute_totals(&[], TAX_RATE);
        assert_eq!(totals.subtotal_cents, 0);
        assert_eq!(totals.tax_cents, 0);
        assert_eq!(totals.total_amount_cents, 0);
        assert_eq!(totals.total_items, 0);
    }
}
