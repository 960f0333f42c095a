//! # Sales Report Repository
//!
//! Row operations for the materialized per-day report table. The upsert is a
//! single `INSERT ... ON CONFLICT(sale_date) DO UPDATE`, so regenerating a
//! day's report is idempotent by construction and the one-row-per-date
//! invariant lives in the schema, not in application code.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use shopfront_core::SalesReport;

const REPORT_COLUMNS: &str =
    "id, sale_date, total_sales_cents, total_profit_cents, total_transactions, created_at";

/// Repository for sales-report rows.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Inserts or overwrites the row for `date` with the given metrics.
    pub async fn upsert(
        &self,
        date: NaiveDate,
        total_sales_cents: i64,
        total_profit_cents: i64,
        total_transactions: i64,
    ) -> DbResult<()> {
        debug!(%date, total_sales_cents, total_transactions, "upserting sales report");

        let now = chrono::Utc::now();
        sqlx::query(
            r#"
            INSERT INTO sales_reports (
                sale_date, total_sales_cents, total_profit_cents,
                total_transactions, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(sale_date) DO UPDATE SET
                total_sales_cents = excluded.total_sales_cents,
                total_profit_cents = excluded.total_profit_cents,
                total_transactions = excluded.total_transactions
            "#,
        )
        .bind(date)
        .bind(total_sales_cents)
        .bind(total_profit_cents)
        .bind(total_transactions)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_date(&self, date: NaiveDate) -> DbResult<Option<SalesReport>> {
        let report = sqlx::query_as::<_, SalesReport>(&format!(
            "SELECT {REPORT_COLUMNS} FROM sales_reports WHERE sale_date = ?1"
        ))
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(report)
    }

    /// Reports with `sale_date` in `[start, end]`, oldest first.
    pub async fn list_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<SalesReport>> {
        let reports = sqlx::query_as::<_, SalesReport>(&format!(
            "SELECT {REPORT_COLUMNS} FROM sales_reports \
             WHERE sale_date BETWEEN ?1 AND ?2 ORDER BY sale_date"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(reports)
    }

    /// Every materialized report, oldest first.
    pub async fn list_all(&self) -> DbResult<Vec<SalesReport>> {
        let reports = sqlx::query_as::<_, SalesReport>(&format!(
            "SELECT {REPORT_COLUMNS} FROM sales_reports ORDER BY sale_date"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(reports)
    }
}
