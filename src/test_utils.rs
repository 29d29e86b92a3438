//! Shared test utilities for Bellevue.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::catalog::{Config, parse_config},
    core::{
        catalog::{Catalog, CatalogProduct, PriceCategory},
        seed::{SeedSummary, seed_catalog},
        user::create_user,
    },
    entities,
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::collections::HashMap;

/// Catalog used throughout the tests.
///
/// * breakfast: regular 8.00, reduced 6.00, surplus 10.00 (sort 1)
/// * lunch: regular 12.00, reduced 9.00, surplus 15.00 (sort 2)
/// * sauna: 10.00 (sort 3)
/// * coffee: 1.50 (no sort order)
/// * snacks: custom amount (sort 9)
pub const TEST_CATALOG_TOML: &str = r#"
    [[products]]
    code = "breakfast"
    name = "Breakfast"
    sort_order = 1
    prices = { regular = 800, reduced = 600, surplus = 1000 }

    [[products]]
    code = "lunch"
    name = "Lunch"
    sort_order = 2
    prices = { regular = 1200, reduced = 900, surplus = 1500 }

    [[products]]
    code = "sauna"
    name = "Sauna"
    sort_order = 3
    price = 1000

    [[products]]
    code = "coffee"
    name = "Coffee"
    price = 150

    [[products]]
    code = "snacks"
    name = "Snacks"
    pricing_mode = "custom"
    sort_order = 9
"#;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Parsed [`TEST_CATALOG_TOML`].
pub fn test_catalog_config() -> Config {
    parse_config(TEST_CATALOG_TOML).unwrap_or_default()
}

/// Builds the test catalog in memory, without a database.
///
/// Variant ids are assigned in config order; category ids are
/// regular = 1, reduced = 2, surplus = 3.
pub fn test_catalog() -> Catalog {
    let config = test_catalog_config();
    let mut products = Vec::new();
    let mut sort_orders = HashMap::new();

    for product in &config.products {
        let variants: Vec<(Option<PriceCategory>, Option<i64>)> = if product.prices.is_empty() {
            vec![(None, product.price)]
        } else {
            product
                .prices
                .iter()
                .map(|(category, price)| (Some(*category), Some(*price)))
                .collect()
        };
        for (category, price) in variants {
            products.push(CatalogProduct {
                id: i64::try_from(products.len()).unwrap_or_default() + 1,
                code: product.code.clone(),
                name: product.name.clone(),
                pricing_mode: product.pricing_mode,
                category,
                price,
            });
        }
        if let Some(sort_order) = product.sort_order {
            sort_orders.insert(product.code.clone(), sort_order);
        }
    }

    let category_ids = HashMap::from([
        (PriceCategory::Regular, 1),
        (PriceCategory::Reduced, 2),
        (PriceCategory::Surplus, 3),
    ]);
    Catalog::from_products(products, category_ids, sort_orders)
}

/// Seeds the database with [`TEST_CATALOG_TOML`].
pub async fn seed_test_catalog(db: &DatabaseConnection) -> Result<SeedSummary> {
    seed_catalog(db, &test_catalog_config()).await
}

/// Creates a test user from an email address.
///
/// # Defaults
/// * `first_name`: local part of the email, capitalized
/// * `last_name`: `"Tester"`
/// * `is_admin`: false
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
) -> Result<entities::user::Model> {
    let local = email.split('@').next().unwrap_or(email);
    let mut chars = local.chars();
    let first_name = chars
        .next()
        .map(|c| c.to_uppercase().chain(chars).collect::<String>())
        .unwrap_or_default();
    create_user(db, email, &first_name, "Tester", false).await
}

/// Inserts an unpaid invoice that only has a meals subtotal.
pub async fn create_test_invoice(
    db: &DatabaseConnection,
    user_id: i64,
    period: NaiveDate,
    total_eating: i64,
) -> Result<entities::invoice::Model> {
    let invoice = entities::invoice::ActiveModel {
        user_id: Set(user_id),
        period: Set(period),
        total_price: Set(total_eating),
        total_eating: Set(total_eating),
        total_coffee: Set(0),
        total_lecture: Set(0),
        total_sauna: Set(0),
        total_kiosk: Set(0),
        state: Set("unpaid".to_string()),
        ..Default::default()
    };
    Ok(invoice.insert(db).await?)
}

/// Sets up a complete test environment with a seeded catalog and one member.
/// Returns (db, catalog, user) for recording and aggregation tests.
pub async fn setup_with_catalog() -> Result<(DatabaseConnection, Catalog, entities::user::Model)>
{
    let db = setup_test_db().await?;
    seed_test_catalog(&db).await?;
    let catalog = Catalog::load(&db).await?;
    let user = create_test_user(&db, "anna@example.com").await?;
    Ok((db, catalog, user))
}
