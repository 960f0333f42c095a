//! # Invoice Repository
//!
//! Persistence for invoices and their line items.
//!
//! The header and its items are written inside one transaction: the header
//! goes first (items reference its assigned id), and either everything
//! commits or nothing does. Stock is not touched here; that is the billing
//! engine's separate, compensatable phase.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use shopfront_core::{Invoice, InvoiceItem, NewInvoice};

const INVOICE_COLUMNS: &str = "id, invoice_number, customer_name, customer_phone, total_items, \
     subtotal_cents, tax_cents, total_amount_cents, payment_method, invoice_date, created_at";

const ITEM_COLUMNS: &str =
    "id, invoice_id, product_id, product_name, quantity, unit_price_cents, line_total_cents";

/// Repository for invoice rows and their items.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Writes header and items as one transaction and returns the new
    /// invoice id.
    ///
    /// A duplicate invoice number aborts the whole transaction with
    /// `DbError::UniqueViolation`; the caller decides whether to regenerate
    /// and retry.
    pub async fn insert(&self, invoice: &NewInvoice) -> DbResult<i64> {
        debug!(invoice_number = %invoice.invoice_number, lines = invoice.lines.len(), "inserting invoice");

        let mut tx = self.pool.begin().await?;
        let now = chrono::Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO invoices (
                invoice_number, customer_name, customer_phone,
                total_items, subtotal_cents, tax_cents, total_amount_cents,
                payment_method, invoice_date, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&invoice.invoice_number)
        .bind(&invoice.customer_name)
        .bind(&invoice.customer_phone)
        .bind(invoice.totals.total_items)
        .bind(invoice.totals.subtotal_cents)
        .bind(invoice.totals.tax_cents)
        .bind(invoice.totals.total_amount_cents)
        .bind(invoice.payment_method)
        .bind(invoice.invoice_date)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let invoice_id = result.last_insert_rowid();

        for line in &invoice.lines {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    invoice_id, product_id, product_name,
                    quantity, unit_price_cents, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(invoice_id)
            .bind(line.product_id)
            .bind(&line.product_name)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.line_total_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(invoice_id)
    }

    /// Fetches one invoice with its items eager-loaded.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match invoice {
            Some(mut invoice) => {
                invoice.items = self.get_items(invoice.id).await?;
                Ok(Some(invoice))
            }
            None => Ok(None),
        }
    }

    /// All invoices, newest first, items eager-loaded.
    pub async fn list_all(&self) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY invoice_date DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.attach_items(invoices).await
    }

    /// Invoices whose calendar date falls in `[start, end]`, newest first,
    /// items eager-loaded.
    pub async fn list_in_range(&self, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Invoice>> {
        let invoices = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices \
             WHERE DATE(invoice_date) BETWEEN ?1 AND ?2 \
             ORDER BY invoice_date DESC, id DESC"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        self.attach_items(invoices).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn get_items(&self, invoice_id: i64) -> DbResult<Vec<InvoiceItem>> {
        let items = sqlx::query_as::<_, InvoiceItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM invoice_items WHERE invoice_id = ?1 ORDER BY id"
        ))
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn attach_items(&self, invoices: Vec<Invoice>) -> DbResult<Vec<Invoice>> {
        let mut out = Vec::with_capacity(invoices.len());
        for mut invoice in invoices {
            invoice.items = self.get_items(invoice.id).await?;
            out.push(invoice);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use chrono::{TimeZone, Utc};
    use shopfront_core::{InvoiceTotals, NewProduct, PaymentMethod, PricedLine};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database) -> i64 {
        db.products()
            .insert(&NewProduct {
                name: "Jaggery 1kg".into(),
                sku: "JAG-1KG".into(),
                category: "Sweeteners".into(),
                buying_price_cents: 5000,
                selling_price_cents: 6000,
                quantity_in_stock: 20,
                reorder_level: 5,
            })
            .await
            .unwrap()
    }

    fn new_invoice(number: &str, product_id: i64, date: chrono::DateTime<Utc>) -> NewInvoice {
        NewInvoice {
            invoice_number: number.into(),
            customer_name: "Walk-in Customer".into(),
            customer_phone: None,
            payment_method: PaymentMethod::Cash,
            invoice_date: date,
            totals: InvoiceTotals {
                subtotal_cents: 12000,
                tax_cents: 600,
                total_amount_cents: 12600,
                total_items: 2,
            },
            lines: vec![PricedLine {
                product_id,
                product_name: "Jaggery 1kg".into(),
                quantity: 2,
                unit_price_cents: 6000,
                line_total_cents: 12000,
            }],
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_round_trips_with_items() {
        let db = test_db().await;
        let product_id = seed_product(&db).await;
        let repo = db.invoices();

        let id = repo
            .insert(&new_invoice("INV-1-AAAAA", product_id, Utc::now()))
            .await
            .unwrap();
        assert!(id > 0);

        let invoice = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(invoice.invoice_number, "INV-1-AAAAA");
        assert_eq!(invoice.total_amount_cents, 12600);
        assert_eq!(invoice.items.len(), 1);
        assert_eq!(invoice.items[0].invoice_id, id);
        assert_eq!(invoice.items[0].product_name, "Jaggery 1kg");
        assert_eq!(invoice.items[0].line_total_cents, 12000);
    }

    #[tokio::test]
    async fn duplicate_invoice_number_rolls_back_items_too() {
        let db = test_db().await;
        let product_id = seed_product(&db).await;
        let repo = db.invoices();

        repo.insert(&new_invoice("INV-2-BBBBB", product_id, Utc::now()))
            .await
            .unwrap();
        let err = repo
            .insert(&new_invoice("INV-2-BBBBB", product_id, Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        // Exactly the first invoice's single item row exists.
        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoice_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(items, 1);
    }

    #[tokio::test]
    async fn range_query_is_inclusive_and_newest_first() {
        let db = test_db().await;
        let product_id = seed_product(&db).await;
        let repo = db.invoices();

        let d1 = Utc.with_ymd_and_hms(2026, 8, 1, 9, 0, 0).unwrap();
        let d2 = Utc.with_ymd_and_hms(2026, 8, 2, 9, 0, 0).unwrap();
        let d3 = Utc.with_ymd_and_hms(2026, 8, 3, 9, 0, 0).unwrap();

        repo.insert(&new_invoice("INV-3-C0001", product_id, d1)).await.unwrap();
        repo.insert(&new_invoice("INV-3-C0002", product_id, d2)).await.unwrap();
        repo.insert(&new_invoice("INV-3-C0003", product_id, d3)).await.unwrap();

        let range = repo
            .list_in_range(
                NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 8, 2).unwrap(),
            )
            .await
            .unwrap();

        let numbers: Vec<_> = range.iter().map(|i| i.invoice_number.as_str()).collect();
        assert_eq!(numbers, vec!["INV-3-C0002", "INV-3-C0001"]);
        assert!(range.iter().all(|i| !i.items.is_empty()));
    }

    #[tokio::test]
    async fn deleting_a_referenced_product_is_rejected() {
        let db = test_db().await;
        let product_id = seed_product(&db).await;
        db.invoices()
            .insert(&new_invoice("INV-4-DDDDD", product_id, Utc::now()))
            .await
            .unwrap();

        let err = db.products().delete(product_id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }), "got {err:?}");
    }
}
