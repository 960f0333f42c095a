//! # Seed Data Generator
//!
//! Populates a database with sample grocery products for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p shopfront-db --bin seed
//! cargo run -p shopfront-db --bin seed -- --db ./data/shopfront.db
//! ```

use std::env;

use shopfront_core::NewProduct;
use shopfront_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (name, sku, category, buying cents, selling cents, stock, reorder level)
const SAMPLE_PRODUCTS: &[(&str, &str, &str, i64, i64, i64, i64)] = &[
    ("Basmati Rice 5kg", "RICE-BAS-5KG", "Grains", 40000, 45000, 25, 5),
    ("Wheat Flour 10kg", "ATTA-10KG", "Grains", 32000, 36000, 18, 4),
    ("Toor Dal 1kg", "DAL-TOOR-1KG", "Pulses", 11000, 13500, 40, 8),
    ("Chana Dal 1kg", "DAL-CHANA-1KG", "Pulses", 9000, 11000, 35, 8),
    ("Sugar 1kg", "SUGAR-1KG", "Staples", 4000, 4500, 60, 10),
    ("Salt 1kg", "SALT-1KG", "Staples", 1500, 2000, 80, 15),
    ("Sunflower Oil 1L", "OIL-SUN-1L", "Oils", 14000, 16500, 30, 6),
    ("Mustard Oil 1L", "OIL-MUS-1L", "Oils", 15000, 18000, 20, 6),
    ("Tea 250g", "TEA-250G", "Beverages", 10000, 12500, 45, 10),
    ("Instant Coffee 100g", "COF-100G", "Beverages", 18000, 22000, 15, 5),
    ("Ghee 500g", "GHEE-500G", "Dairy", 27000, 32000, 12, 4),
    ("Milk Powder 500g", "MILK-PWD-500G", "Dairy", 19000, 23000, 10, 5),
    ("Bath Soap 75g", "SOAP-75G", "Personal Care", 2500, 3500, 100, 20),
    ("Detergent 1kg", "DET-1KG", "Household", 9500, 12000, 28, 8),
    ("Matchboxes (pack of 10)", "MISC-MTCH", "Household", 800, 1200, 50, 10),
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./shopfront.db".to_string());
    info!(path = %db_path, "seeding database");

    let db = match Database::new(DbConfig::new(&db_path)).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("failed to open database: {e}");
            std::process::exit(1);
        }
    };

    let products = db.products();
    let mut inserted = 0usize;
    for &(name, sku, category, buying, selling, stock, reorder) in SAMPLE_PRODUCTS {
        let spec = NewProduct {
            name: name.to_string(),
            sku: sku.to_string(),
            category: category.to_string(),
            buying_price_cents: buying,
            selling_price_cents: selling,
            quantity_in_stock: stock,
            reorder_level: reorder,
        };
        match products.insert(&spec).await {
            Ok(id) => {
                inserted += 1;
                info!(id, sku, "inserted product");
            }
            // Re-running the seed against an existing database is fine;
            // existing rows are left alone.
            Err(e) if e.is_unique_violation_on("sku") || e.is_unique_violation_on("name") => {
                warn!(sku, "already present, skipping");
            }
            Err(e) => {
                eprintln!("failed to insert {sku}: {e}");
                std::process::exit(1);
            }
        }
    }

    info!(inserted, total = SAMPLE_PRODUCTS.len(), "seed complete");
    db.close().await;
}

fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
}
