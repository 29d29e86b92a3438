//! Catalog seeding - brings the product tables in line with config.toml.
//!
//! Seeding is idempotent: running it twice with the same file changes nothing
//! the second time. A price change updates the product row in place; existing
//! consumptions keep the unit price they snapshotted when they were written.
//! Variants that are no longer in the file are soft-deleted, so their rows stay
//! available to the history but leave the catalog.

use crate::{
    config::catalog::{Config, ProductConfig},
    core::catalog::{PriceCategory, PricingMode},
    entities::{
        PriceCategory as PriceCategoryEntity, Product, ProductFormOrder, price_category, product,
        product_form_order,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Counts of product variants touched by a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Variants soft-deleted because the config no longer lists them
    pub deleted: usize,
}

/// Seeds price categories, products and form order from `config` in one transaction.
///
/// # Errors
/// Returns an error if the configuration is invalid or any database operation
/// fails; in that case nothing is written.
pub async fn seed_catalog<C>(db: &C, config: &Config) -> Result<SeedSummary>
where
    C: TransactionTrait,
{
    config.validate()?;

    let txn = db.begin().await?;

    let category_ids = ensure_price_categories(&txn).await?;
    let mut summary = SeedSummary::default();
    let mut seeded = HashSet::new();

    for product_config in &config.products {
        for (category, price) in variants(product_config) {
            let category_id = match category {
                Some(c) => Some(*category_ids.get(&c).ok_or_else(|| Error::Config {
                    message: format!("Price category '{c}' missing after seeding"),
                })?),
                None => None,
            };
            upsert_product(&txn, product_config, category_id, price, &mut summary).await?;
            seeded.insert((product_config.code.clone(), category_id));
        }

        if let Some(sort_order) = product_config.sort_order {
            upsert_form_order(&txn, &product_config.code, sort_order).await?;
        }
    }

    summary.deleted = delete_unlisted_products(&txn, &seeded).await?;

    txn.commit().await?;

    info!(
        "Catalog seeded: {} inserted, {} updated, {} unchanged, {} deleted.",
        summary.inserted, summary.updated, summary.unchanged, summary.deleted
    );
    Ok(summary)
}

/// Inserts any missing price category and returns the id of each.
async fn ensure_price_categories<C>(db: &C) -> Result<HashMap<PriceCategory, i32>>
where
    C: ConnectionTrait,
{
    let mut ids = HashMap::new();
    for category in PriceCategory::ALL {
        let existing = PriceCategoryEntity::find()
            .filter(price_category::Column::Name.eq(category.as_str()))
            .one(db)
            .await?;

        let id = if let Some(row) = existing {
            row.id
        } else {
            let row = price_category::ActiveModel {
                name: Set(category.as_str().to_string()),
                ..Default::default()
            }
            .insert(db)
            .await?;
            debug!("Created price category '{}'", category);
            row.id
        };
        ids.insert(category, id);
    }
    Ok(ids)
}

/// Every `(category, price)` variant a product config describes.
fn variants(config: &ProductConfig) -> Vec<(Option<PriceCategory>, Option<i64>)> {
    match config.pricing_mode {
        PricingMode::Custom => vec![(None, None)],
        PricingMode::Fixed if config.prices.is_empty() => vec![(None, config.price)],
        PricingMode::Fixed => config
            .prices
            .iter()
            .map(|(category, price)| (Some(*category), Some(*price)))
            .collect(),
    }
}

async fn upsert_product<C>(
    db: &C,
    config: &ProductConfig,
    price_category_id: Option<i32>,
    price: Option<i64>,
    summary: &mut SeedSummary,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();
    let category_filter = match price_category_id {
        Some(id) => product::Column::PriceCategoryId.eq(id),
        None => product::Column::PriceCategoryId.is_null(),
    };

    let existing = Product::find()
        .filter(product::Column::Code.eq(config.code.as_str()))
        .filter(category_filter)
        .one(db)
        .await?;

    if let Some(row) = existing {
        if row.name == config.name
            && row.price == price
            && row.pricing_mode == config.pricing_mode.as_str()
            && !row.is_deleted
        {
            summary.unchanged += 1;
            return Ok(());
        }

        let code = row.code.clone();
        let mut active_model: product::ActiveModel = row.into();
        active_model.name = Set(config.name.clone());
        active_model.pricing_mode = Set(config.pricing_mode.as_str().to_string());
        active_model.price = Set(price);
        active_model.is_deleted = Set(false);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
        debug!("Updated product '{}' ({:?})", code, price_category_id);
        summary.updated += 1;
    } else {
        let new_product = product::ActiveModel {
            name: Set(config.name.clone()),
            code: Set(config.code.clone()),
            pricing_mode: Set(config.pricing_mode.as_str().to_string()),
            price_category_id: Set(price_category_id),
            price: Set(price),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        new_product.insert(db).await?;
        debug!("Inserted product '{}' ({:?})", config.code, price_category_id);
        summary.inserted += 1;
    }
    Ok(())
}

/// Soft-deletes every active variant whose (code, category) is not in `seeded`.
async fn delete_unlisted_products<C>(
    db: &C,
    seeded: &HashSet<(String, Option<i32>)>,
) -> Result<usize>
where
    C: ConnectionTrait,
{
    let now = Utc::now().naive_utc();
    let active = Product::find()
        .filter(product::Column::IsDeleted.eq(false))
        .all(db)
        .await?;

    let mut deleted = 0;
    for row in active {
        if seeded.contains(&(row.code.clone(), row.price_category_id)) {
            continue;
        }
        let code = row.code.clone();
        let price_category_id = row.price_category_id;
        let mut active_model: product::ActiveModel = row.into();
        active_model.is_deleted = Set(true);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
        debug!("Deleted product '{}' ({:?})", code, price_category_id);
        deleted += 1;
    }
    Ok(deleted)
}

async fn upsert_form_order<C>(db: &C, code: &str, sort_order: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = ProductFormOrder::find_by_id(code.to_string()).one(db).await?;

    if let Some(row) = existing {
        if row.sort_order != sort_order {
            let mut active_model: product_form_order::ActiveModel = row.into();
            active_model.sort_order = Set(sort_order);
            active_model.update(db).await?;
        }
    } else {
        product_form_order::ActiveModel {
            code: Set(code.to_string()),
            sort_order: Set(sort_order),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}
