//! Catalog command - seeds the product tables and swaps in the fresh catalog.

use crate::{
    cli::AppContext,
    config::catalog::{load_config, load_default_config},
    core::seed::seed_catalog,
    errors::Result,
};
use std::path::PathBuf;
use tracing::info;

/// Seeds the catalog from `path` (or the default config) and reloads it.
pub async fn seed(ctx: &AppContext, path: Option<PathBuf>) -> Result<String> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => load_default_config()?,
    };
    info!("Seeding {} products from config", config.products.len());

    let summary = seed_catalog(&ctx.database, &config).await?;
    let catalog = ctx.catalog.reload(&ctx.database).await?;

    Ok(format!(
        "Catalog seeded: {} inserted, {} updated, {} unchanged, {} deleted ({} products on the form).",
        summary.inserted,
        summary.updated,
        summary.unchanged,
        summary.deleted,
        catalog.specs().len()
    ))
}
