//! # Seed Data Generator
//!
//! Populates a database with a demo catalog for trying the register.
//!
//! ## Usage
//! ```bash
//! cargo run -p till-db --bin seed
//!
//! # Specify database path
//! cargo run -p till-db --bin seed -- --db ./data/till.db
//! ```
//!
//! ## Generated Catalog
//! - Plain products (one stock column, no options)
//! - Drinks with size variants, each with its own price and stock
//! - A burger with a required single-choice "Doneness" group and an
//!   optional multiple-choice "Extras" group
//! - A combo that bundles the burger with fries (display only)

use std::env;
use till_core::{ModifierMode, Money};
use till_db::{CatalogRepository, Database, DbConfig, DbResult};

/// Plain products: (name, price in cents, stock)
const PLAIN: &[(&str, i64, i64)] = &[
    ("Notebook A5", 350, 40),
    ("Ballpoint Pen", 120, 200),
    ("Desk Lamp", 10000, 6),
    ("USB Cable", 899, 25),
    ("Coffee Beans 250g", 1250, 18),
];

/// Drinks with size variants: (name, base price, [(size, price, stock)])
const DRINKS: &[(&str, i64, &[(&str, i64, i64)])] = &[
    ("Latte", 400, &[("Small", 400, 30), ("Medium", 475, 30), ("Large", 550, 20)]),
    ("Iced Tea", 300, &[("Medium", 300, 25), ("Large", 380, 0)]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./till_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Till POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./till_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Till POS Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let catalog = db.catalog();
    let existing = catalog.count_active().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let created = seed_catalog(&catalog).await?;

    println!();
    println!("✓ Created {} products", created);
    for product in catalog.list_active_products(50).await? {
        println!(
            "  #{:<3} {:<20} {:>8}  stock {}",
            product.id,
            product.name,
            product.price().to_string(),
            product.current_stock
        );
    }

    Ok(())
}

async fn seed_catalog(catalog: &CatalogRepository) -> DbResult<usize> {
    let mut created = 0;

    for (name, price, stock) in PLAIN {
        catalog
            .insert_product(name, Money::from_cents(*price), *stock)
            .await?;
        created += 1;
    }

    for (name, price, sizes) in DRINKS {
        // Sold only through variants, so the product row holds no stock.
        let id = catalog
            .insert_product(name, Money::from_cents(*price), 0)
            .await?;
        for (size, size_price, stock) in sizes.iter() {
            catalog
                .insert_variant(id, size, Money::from_cents(*size_price), *stock)
                .await?;
        }
        created += 1;
    }

    let burger = catalog
        .insert_product("Burger", Money::from_cents(10000), 12)
        .await?;
    let doneness = catalog
        .insert_modifier_group(burger, "Doneness", ModifierMode::Single, true)
        .await?;
    for name in ["Medium", "Well done"] {
        catalog
            .insert_modifier_option(doneness, name, Money::zero())
            .await?;
    }
    let extras = catalog
        .insert_modifier_group(burger, "Extras", ModifierMode::Multiple, false)
        .await?;
    for (name, price) in [("Cheese", 1500), ("Bacon", 2000), ("Avocado", 1800)] {
        catalog
            .insert_modifier_option(extras, name, Money::from_cents(price))
            .await?;
    }
    created += 1;

    let fries = catalog
        .insert_product("Fries", Money::from_cents(450), 30)
        .await?;
    let combo = catalog
        .insert_product("Burger Combo", Money::from_cents(12500), 12)
        .await?;
    catalog.insert_bundle(combo, burger, 1).await?;
    catalog.insert_bundle(combo, fries, 1).await?;
    created += 2;

    Ok(created)
}
