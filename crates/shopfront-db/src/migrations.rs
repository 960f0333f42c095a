//! # Embedded Migrations
//!
//! SQL files from the workspace-root `migrations/sqlite/` directory are
//! compiled into the binary by `sqlx::migrate!`; no runtime file access is
//! needed. Applied versions are tracked in `_sqlx_migrations`, so running is
//! idempotent and each migration executes inside its own transaction.
//!
//! Adding a migration: create `NNN_description.sql` with the next sequence
//! number and never edit an already-shipped file.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending migrations in filename order.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    info!("migrations up to date");
    Ok(())
}

/// (total embedded, applied) migration counts, for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);
    Ok((total, applied as usize))
}
