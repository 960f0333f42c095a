//! # Inventory Ledger
//!
//! Owns product records and stock quantity. This is the only component in
//! the system allowed to mutate stock; the billing engine routes its
//! decrements through storage operations this ledger fronts, never around
//! them.

use tracing::{info, instrument};

use crate::error::{PosError, PosResult};
use shopfront_core::validation::{validate_new_product, validate_stock_level};
use shopfront_core::{Money, NewProduct, Product};
use shopfront_db::{Database, DbError};

/// Thin logic layer over the `products` table.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    db: Database,
}

impl InventoryLedger {
    pub fn new(db: Database) -> Self {
        InventoryLedger { db }
    }

    /// Validates and persists a new product, returning its id.
    ///
    /// Duplicate SKU or name is reported as `Conflict`; the UNIQUE
    /// constraints in storage are the arbiter, not a pre-read.
    #[instrument(skip(self, spec), fields(sku = %spec.sku))]
    pub async fn add_product(&self, spec: &NewProduct) -> PosResult<i64> {
        validate_new_product(spec)?;

        let id = self.db.products().insert(spec).await?;
        info!(id, "product added");
        Ok(id)
    }

    /// Full-record replace by id.
    #[instrument(skip(self, product), fields(id = product.id))]
    pub async fn update_product(&self, product: &Product) -> PosResult<()> {
        validate_new_product(&NewProduct {
            name: product.name.clone(),
            sku: product.sku.clone(),
            category: product.category.clone(),
            buying_price_cents: product.buying_price_cents,
            selling_price_cents: product.selling_price_cents,
            quantity_in_stock: product.quantity_in_stock,
            reorder_level: product.reorder_level,
        })?;

        self.db.products().update(product).await?;
        info!("product updated");
        Ok(())
    }

    /// Hard delete. A product that appears on any invoice cannot be deleted;
    /// the attempt is reported as `Conflict` so historical invoices keep a
    /// resolvable product reference.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i64) -> PosResult<()> {
        match self.db.products().delete(id).await {
            Ok(()) => {
                info!("product deleted");
                Ok(())
            }
            Err(DbError::ForeignKeyViolation { .. }) => Err(PosError::Conflict(format!(
                "product {id} is referenced by existing invoices and cannot be deleted"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Sets stock to an absolute quantity (not a delta) and bumps the
    /// modification timestamp. Negative quantities are rejected before any
    /// write.
    #[instrument(skip(self))]
    pub async fn adjust_stock(&self, id: i64, new_quantity: i64) -> PosResult<()> {
        validate_stock_level("quantity in stock", new_quantity)?;

        self.db.products().set_stock(id, new_quantity).await?;
        info!(new_quantity, "stock adjusted");
        Ok(())
    }

    pub async fn product(&self, id: i64) -> PosResult<Product> {
        self.db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| PosError::NotFound {
                entity: "product",
                id: id.to_string(),
            })
    }

    pub async fn product_by_sku(&self, sku: &str) -> PosResult<Product> {
        self.db
            .products()
            .get_by_sku(sku)
            .await?
            .ok_or_else(|| PosError::NotFound {
                entity: "product",
                id: sku.to_string(),
            })
    }

    pub async fn list_products(&self) -> PosResult<Vec<Product>> {
        Ok(self.db.products().list_all().await?)
    }

    pub async fn products_in_category(&self, category: &str) -> PosResult<Vec<Product>> {
        Ok(self.db.products().list_by_category(category).await?)
    }

    /// Distinct category labels, sorted.
    pub async fn categories(&self) -> PosResult<Vec<String>> {
        Ok(self.db.products().list_categories().await?)
    }

    /// Products at or below their reorder level, lowest quantity first:
    /// the most urgent restock leads the list.
    pub async fn low_stock(&self) -> PosResult<Vec<Product>> {
        Ok(self.db.products().list_low_stock().await?)
    }

    /// Σ selling price × stock: what the shelf is worth at retail.
    /// Recomputed on demand; the table is small and correctness beats
    /// caching here.
    pub async fn inventory_value(&self) -> PosResult<Money> {
        Ok(Money::from_minor(
            self.db.products().inventory_value_cents().await?,
        ))
    }

    /// Σ buying price × stock: what the shelf cost to fill.
    pub async fn inventory_cost(&self) -> PosResult<Money> {
        Ok(Money::from_minor(
            self.db.products().inventory_cost_cents().await?,
        ))
    }

    pub async fn product_count(&self) -> PosResult<i64> {
        Ok(self.db.products().count().await?)
    }

    pub async fn total_stock(&self) -> PosResult<i64> {
        Ok(self.db.products().total_stock().await?)
    }
}
