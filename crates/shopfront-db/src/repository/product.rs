//! # Product Repository
//!
//! Row operations for the `products` table: CRUD, the two stock mutations
//! (absolute set and conditional decrement), and the aggregate scalars the
//! dashboard asks for.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use shopfront_core::{NewProduct, Product};

const PRODUCT_COLUMNS: &str = "id, name, sku, category, buying_price_cents, selling_price_cents, \
     quantity_in_stock, reorder_level, created_at, updated_at";

/// Repository for product rows.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product and returns its storage-assigned id.
    ///
    /// Duplicate SKU or name surfaces as `DbError::UniqueViolation`; the
    /// constraint, not a pre-read, is the arbiter.
    pub async fn insert(&self, spec: &NewProduct) -> DbResult<i64> {
        debug!(sku = %spec.sku, "inserting product");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO products (
                name, sku, category,
                buying_price_cents, selling_price_cents,
                quantity_in_stock, reorder_level,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
        )
        .bind(&spec.name)
        .bind(&spec.sku)
        .bind(&spec.category)
        .bind(spec.buying_price_cents)
        .bind(spec.selling_price_cents)
        .bind(spec.quantity_in_stock)
        .bind(spec.reorder_level)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// All products, name order.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn list_by_category(&self, category: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = ?1 ORDER BY name"
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Distinct category labels, sorted.
    pub async fn list_categories(&self) -> DbResult<Vec<String>> {
        let categories: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT category FROM products ORDER BY category")
                .fetch_all(&self.pool)
                .await?;

        Ok(categories)
    }

    /// Products at or below their reorder level, lowest quantity first so the
    /// most urgent restock leads the list. Ties break on id for a stable
    /// order.
    pub async fn list_low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE quantity_in_stock <= reorder_level \
             ORDER BY quantity_in_stock ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Full-record replace by id. `created_at` is preserved, `updated_at`
    /// bumped.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = product.id, "updating product");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                sku = ?3,
                category = ?4,
                buying_price_cents = ?5,
                selling_price_cents = ?6,
                quantity_in_stock = ?7,
                reorder_level = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.category)
        .bind(product.buying_price_cents)
        .bind(product.selling_price_cents)
        .bind(product.quantity_in_stock)
        .bind(product.reorder_level)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("product", product.id));
        }

        Ok(())
    }

    /// Hard delete. Fails with `ForeignKeyViolation` when the product appears
    /// on any invoice.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("product", id));
        }

        Ok(())
    }

    /// Sets stock to an absolute quantity. The caller has already rejected
    /// negatives.
    pub async fn set_stock(&self, id: i64, quantity: i64) -> DbResult<()> {
        debug!(id, quantity, "setting stock");

        let now = Utc::now();
        let result =
            sqlx::query("UPDATE products SET quantity_in_stock = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(quantity)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("product", id));
        }

        Ok(())
    }

    /// Atomically decrements stock if (and only if) enough is available.
    ///
    /// The condition rides inside the UPDATE itself, so concurrent sales of
    /// the same product serialize at the storage engine and a lost update is
    /// impossible. Returns `false` when stock was insufficient (or the id is
    /// unknown); the row is untouched in that case.
    pub async fn decrement_stock(&self, id: i64, quantity: i64) -> DbResult<bool> {
        debug!(id, quantity, "decrementing stock");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity_in_stock = quantity_in_stock - ?2,
                updated_at = ?3
            WHERE id = ?1 AND quantity_in_stock >= ?2
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Σ selling price × stock over all products, minor units.
    pub async fn inventory_value_cents(&self) -> DbResult<i64> {
        let value: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(selling_price_cents * quantity_in_stock), 0) FROM products",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(value)
    }

    /// Σ buying price × stock over all products, minor units.
    pub async fn inventory_cost_cents(&self) -> DbResult<i64> {
        let cost: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(buying_price_cents * quantity_in_stock), 0) FROM products",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(cost)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Total units on the shelf across all products.
    pub async fn total_stock(&self) -> DbResult<i64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(quantity_in_stock), 0) FROM products")
                .fetch_one(&self.pool)
                .await?;

        Ok(total)
    }
}
