//! # Sales Aggregator
//!
//! Rolls invoices up into the per-day report table and answers period
//! queries over it.
//!
//! The report table is a cache, never the source of truth: every row is
//! recomputable from the invoices of its date, and regenerating a date is a
//! plain upsert. Profit figures inherit the billing engine's live buying
//! price lookup, so regenerating an old date after a cost change produces
//! the shifted figure, not the historical one.

use chrono::{Datelike, NaiveDate, Utc};
use tracing::{info, instrument};

use crate::billing::BillingEngine;
use crate::error::{PosError, PosResult};
use shopfront_core::{Money, SalesReport, ValidationError};
use shopfront_db::Database;

/// Materializes and serves per-day and per-period sales figures.
#[derive(Debug, Clone)]
pub struct SalesAggregator {
    db: Database,
    billing: BillingEngine,
}

impl SalesAggregator {
    pub fn new(db: Database) -> Self {
        let billing = BillingEngine::new(db.clone());
        SalesAggregator { db, billing }
    }

    /// Recomputes the date's metrics from its invoices and upserts the row,
    /// returning the stored report. Idempotent: rerunning for the same date
    /// overwrites rather than duplicates.
    #[instrument(skip(self))]
    pub async fn generate_daily_report(&self, date: NaiveDate) -> PosResult<SalesReport> {
        let sales = self.billing.daily_sales(date).await?;
        let profit = self.billing.daily_profit(date).await?;
        let transactions = self.billing.daily_transaction_count(date).await?;

        self.db
            .reports()
            .upsert(date, sales.minor(), profit.minor(), transactions)
            .await?;

        info!(%date, sales_cents = sales.minor(), transactions, "daily report generated");

        self.db
            .reports()
            .get_by_date(date)
            .await?
            .ok_or_else(|| PosError::NotFound {
                entity: "sales report",
                id: date.to_string(),
            })
    }

    /// Convenience for the end-of-day button: regenerates today's report.
    pub async fn generate_today_report(&self) -> PosResult<SalesReport> {
        self.generate_daily_report(Utc::now().date_naive()).await
    }

    /// The stored report for `date`, generating it first if no row exists
    /// yet. A date with no invoices still gets an all-zero row.
    pub async fn report_for_date(&self, date: NaiveDate) -> PosResult<SalesReport> {
        if let Some(report) = self.db.reports().get_by_date(date).await? {
            return Ok(report);
        }
        self.generate_daily_report(date).await
    }

    /// Stored reports with dates in `[start, end]`, oldest first. Dates that
    /// were never materialized are simply absent.
    pub async fn reports_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PosResult<Vec<SalesReport>> {
        Ok(self.db.reports().list_in_range(start, end).await?)
    }

    /// Every stored report, oldest first.
    pub async fn all_reports(&self) -> PosResult<Vec<SalesReport>> {
        Ok(self.db.reports().list_all().await?)
    }

    // -------------------------------------------------------------------------
    // Period rollups (read the stored rows; call generate_daily_report for
    // the dates you care about first if they may be stale)
    // -------------------------------------------------------------------------

    pub async fn monthly_reports(&self, year: i32, month: u32) -> PosResult<Vec<SalesReport>> {
        let (start, end) = month_bounds(year, month)?;
        self.reports_in_range(start, end).await
    }

    pub async fn monthly_sales(&self, year: i32, month: u32) -> PosResult<Money> {
        let reports = self.monthly_reports(year, month).await?;
        Ok(reports.iter().map(|r| r.total_sales()).sum())
    }

    pub async fn monthly_profit(&self, year: i32, month: u32) -> PosResult<Money> {
        let reports = self.monthly_reports(year, month).await?;
        Ok(reports.iter().map(|r| r.total_profit()).sum())
    }

    /// Profit as a percentage of sales for the month; zero when there were
    /// no sales.
    pub async fn monthly_profit_margin_percent(&self, year: i32, month: u32) -> PosResult<f64> {
        let reports = self.monthly_reports(year, month).await?;
        let sales: i64 = reports.iter().map(|r| r.total_sales_cents).sum();
        if sales == 0 {
            return Ok(0.0);
        }
        let profit: i64 = reports.iter().map(|r| r.total_profit_cents).sum();
        Ok(profit as f64 / sales as f64 * 100.0)
    }

    /// Mean invoice value across the month; zero when there were no
    /// transactions.
    pub async fn monthly_average_transaction_value(
        &self,
        year: i32,
        month: u32,
    ) -> PosResult<Money> {
        let reports = self.monthly_reports(year, month).await?;
        let transactions: i64 = reports.iter().map(|r| r.total_transactions).sum();
        if transactions == 0 {
            return Ok(Money::zero());
        }
        let sales: i64 = reports.iter().map(|r| r.total_sales_cents).sum();
        Ok(Money::from_minor(sales / transactions))
    }

    pub async fn yearly_sales(&self, year: i32) -> PosResult<Money> {
        let (start, end) = year_bounds(year)?;
        let reports = self.reports_in_range(start, end).await?;
        Ok(reports.iter().map(|r| r.total_sales()).sum())
    }

    pub async fn yearly_profit(&self, year: i32) -> PosResult<Money> {
        let (start, end) = year_bounds(year)?;
        let reports = self.reports_in_range(start, end).await?;
        Ok(reports.iter().map(|r| r.total_profit()).sum())
    }

    /// The stored report with the highest sales in `[start, end]`; `None`
    /// when no reports exist in the range. Ties go to the earlier date.
    pub async fn top_sales_day(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PosResult<Option<SalesReport>> {
        let reports = self.reports_in_range(start, end).await?;
        Ok(pick_max(reports, |r| r.total_sales_cents))
    }

    /// Highest-profit counterpart of [`top_sales_day`](Self::top_sales_day).
    pub async fn top_profit_day(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PosResult<Option<SalesReport>> {
        let reports = self.reports_in_range(start, end).await?;
        Ok(pick_max(reports, |r| r.total_profit_cents))
    }
}

/// First and last calendar day of the month; rejects month 0 or > 12.
fn month_bounds(year: i32, month: u32) -> PosResult<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or(PosError::Validation(
        ValidationError::OutOfRange { field: "month", min: 1, max: 12 },
    ))?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let end = next_month
        .and_then(|d| d.pred_opt())
        .ok_or(PosError::Validation(ValidationError::OutOfRange {
            field: "month",
            min: 1,
            max: 12,
        }))?;
    Ok((start, end))
}

fn year_bounds(year: i32) -> PosResult<(NaiveDate, NaiveDate)> {
    match (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(PosError::Validation(ValidationError::OutOfRange {
            field: "year",
            min: 0,
            max: i64::from(NaiveDate::MAX.year()),
        })),
    }
}

/// Oldest-first input makes `>` favor the earlier date on ties.
fn pick_max<K: Ord>(reports: Vec<SalesReport>, key: impl Fn(&SalesReport) -> K) -> Option<SalesReport> {
    let mut best: Option<SalesReport> = None;
    for report in reports {
        match &best {
            Some(b) if key(&report) > key(b) => best = Some(report),
            None => best = Some(report),
            _ => {}
        }
    }
    best
}
