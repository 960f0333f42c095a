//! # Input Validation
//!
//! Business-rule checks applied before anything is written. The database
//! enforces the same rules again via constraints (NOT NULL, UNIQUE, CHECK-ish
//! application guards); these functions exist so malformed input is rejected
//! early with a field-level message instead of a constraint error.

use crate::error::{ValidationError, ValidationResult};
use crate::types::NewProduct;
use crate::{MAX_INVOICE_LINES, MAX_LINE_QUANTITY};

/// Validates a product display name: non-empty after trimming, max 200 chars.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required { field: "name" });
    }
    if name.len() > 200 {
        return Err(ValidationError::TooLong { field: "name", max: 200 });
    }
    Ok(())
}

/// Validates a SKU: non-empty after trimming, max 50 chars.
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();
    if sku.is_empty() {
        return Err(ValidationError::Required { field: "sku" });
    }
    if sku.len() > 50 {
        return Err(ValidationError::TooLong { field: "sku", max: 50 });
    }
    Ok(())
}

/// Validates a category label: non-empty after trimming, max 100 chars.
pub fn validate_category(category: &str) -> ValidationResult<()> {
    let category = category.trim();
    if category.is_empty() {
        return Err(ValidationError::Required { field: "category" });
    }
    if category.len() > 100 {
        return Err(ValidationError::TooLong { field: "category", max: 100 });
    }
    Ok(())
}

/// Validates a price in minor units: strictly positive.
pub fn validate_price_cents(field: &'static str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive { field });
    }
    Ok(())
}

/// Validates a stock or reorder level: zero is fine, negative is not.
pub fn validate_stock_level(field: &'static str, level: i64) -> ValidationResult<()> {
    if level < 0 {
        return Err(ValidationError::MustBeNonNegative { field });
    }
    Ok(())
}

/// Validates a line quantity: 1 to MAX_LINE_QUANTITY.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive { field: "quantity" });
    }
    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity",
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// Validates the number of distinct lines on one invoice.
pub fn validate_line_count(lines: usize) -> ValidationResult<()> {
    if lines > MAX_INVOICE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "invoice lines",
            min: 1,
            max: MAX_INVOICE_LINES as i64,
        });
    }
    Ok(())
}

/// Validates a whole product spec before it is handed to storage.
pub fn validate_new_product(spec: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&spec.name)?;
    validate_sku(&spec.sku)?;
    validate_category(&spec.category)?;
    validate_price_cents("buying price", spec.buying_price_cents)?;
    validate_price_cents("selling price", spec.selling_price_cents)?;
    validate_stock_level("quantity in stock", spec.quantity_in_stock)?;
    validate_stock_level("reorder level", spec.reorder_level)?;
    Ok(())
}
