//! Database configuration module for Bellevue.
//!
//! This module handles the `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL. Creation is
//! idempotent, which lets every start of the binary call [`create_tables`].

use crate::entities::{
    Comment, Consumption, Invoice, PriceCategory, Product, ProductFormOrder, User, comment,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/bellevue.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns the
/// default local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Directory a file-backed `SQLite` URL points into, if any.
fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?.split('?').next()?;
    Path::new(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

/// Establishes a connection to the database named by [`get_database_url`].
///
/// `SQLite` does not create missing directories, so the parent directory of
/// the database file is created first.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(dir) = sqlite_parent_dir(&database_url) {
        std::fs::create_dir_all(dir)?;
    }
    debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables (if missing) plus the unique (user, date) index on comments.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    // Parents first so foreign keys resolve in declaration order
    let tables = vec![
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(PriceCategory),
        schema.create_table_from_entity(Product),
        schema.create_table_from_entity(ProductFormOrder),
        schema.create_table_from_entity(Consumption),
        schema.create_table_from_entity(Comment),
        schema.create_table_from_entity(Invoice),
    ];

    for mut table in tables {
        table.if_not_exists();
        db.execute(builder.build(&table)).await?;
    }

    let comment_per_day = Index::create()
        .if_not_exists()
        .name("idx_comments_user_date")
        .table(Comment)
        .col(comment::Column::UserId)
        .col(comment::Column::Date)
        .unique()
        .to_owned();
    db.execute(builder.build(&comment_per_day)).await?;

    info!("Database tables ensured.");
    Ok(())
}
