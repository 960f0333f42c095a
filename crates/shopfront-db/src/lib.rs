//! # shopfront-db: SQLite Storage Layer
//!
//! Every SQL statement in the workspace lives here: pool management, embedded
//! migrations, and one repository per table (products, invoices + items,
//! sales reports). Rows map straight onto `shopfront-core` types; business
//! rules stay in the service layer above.
//!
//! ## Usage
//! ```rust,ignore
//! let db = Database::new(DbConfig::new("./shopfront.db")).await?;
//! let low = db.products().list_low_stock().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
