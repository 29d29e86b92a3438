//! Consumption recording - the write path for one member's day.
//!
//! A day is always written as a whole: the member's existing rows for that
//! date are deleted and the submitted entries inserted in their place. Callers
//! that need the comment written atomically with the rows pass in an open
//! transaction; [`replace_day`] opens one of its own.

use crate::{
    entities::{Consumption, consumption},
    errors::{Error, FieldErrors, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use tracing::{debug, instrument};

/// One resolved line ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumptionEntry {
    pub product_id: i64,
    pub price_category_id: Option<i32>,
    /// Unit price in Rappen, snapshotted into the stored row
    pub unit_price: i64,
    pub quantity: i64,
}

impl ConsumptionEntry {
    /// `quantity * unit_price` in Rappen, `None` if it does not fit an `i64`.
    #[must_use]
    pub const fn total(&self) -> Option<i64> {
        self.quantity.checked_mul(self.unit_price)
    }
}

/// Replaces the member's rows for `date` with `entries` on the given connection.
///
/// Must run inside a transaction if the delete and the inserts are to be
/// atomic. Every entry needs a positive quantity and a total that fits an
/// `i64`; otherwise nothing is touched.
///
/// # Errors
/// Returns `Error::Validation` for a non-positive quantity, a negative unit
/// price or an overflowing total, or a database error.
#[instrument(skip(db, entries), fields(entries = entries.len()))]
pub async fn record_day<C>(
    db: &C,
    user_id: i64,
    date: NaiveDate,
    entries: &[ConsumptionEntry],
) -> Result<Vec<consumption::Model>>
where
    C: ConnectionTrait,
{
    if let Some(bad) = entries
        .iter()
        .find(|e| e.quantity <= 0 || e.unit_price < 0 || e.total().is_none())
    {
        let mut errors = FieldErrors::new();
        errors.add(
            "activities",
            format!("invalid line for product {}", bad.product_id),
        );
        return Err(Error::Validation(errors));
    }

    let deleted = Consumption::delete_many()
        .filter(consumption::Column::UserId.eq(user_id))
        .filter(consumption::Column::Date.eq(date))
        .exec(db)
        .await?;
    debug!("Removed {} existing rows", deleted.rows_affected);

    let now = Utc::now();
    let mut stored = Vec::with_capacity(entries.len());
    for entry in entries {
        let total_price = entry.total().unwrap_or_default();
        let row = consumption::ActiveModel {
            user_id: Set(user_id),
            product_id: Set(entry.product_id),
            price_category_id: Set(entry.price_category_id),
            date: Set(date),
            unit_price: Set(entry.unit_price),
            quantity: Set(entry.quantity),
            total_price: Set(total_price),
            created_at: Set(now),
            ..Default::default()
        };
        stored.push(row.insert(db).await?);
    }

    debug!("Stored {} rows", stored.len());
    Ok(stored)
}

/// Atomically replaces the member's rows for `date`.
///
/// # Errors
/// Same as [`record_day`]. On error the previous rows are left intact.
pub async fn replace_day<C>(
    db: &C,
    user_id: i64,
    date: NaiveDate,
    entries: &[ConsumptionEntry],
) -> Result<Vec<consumption::Model>>
where
    C: TransactionTrait,
{
    let txn = db.begin().await?;
    let stored = record_day(&txn, user_id, date, entries).await?;
    txn.commit().await?;
    Ok(stored)
}

/// Rows the member recorded on `date`, in insertion order.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_consumptions_for_day<C>(
    db: &C,
    user_id: i64,
    date: NaiveDate,
) -> Result<Vec<consumption::Model>>
where
    C: ConnectionTrait,
{
    Consumption::find()
        .filter(consumption::Column::UserId.eq(user_id))
        .filter(consumption::Column::Date.eq(date))
        .order_by_asc(consumption::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sum of `total_price` over all of the member's rows, computed by the database.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn sum_consumption_totals<C>(db: &C, user_id: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let total: Option<Option<i64>> = Consumption::find()
        .select_only()
        .column_as(consumption::Column::TotalPrice.sum(), "total")
        .filter(consumption::Column::UserId.eq(user_id))
        .into_tuple()
        .one(db)
        .await?;
    Ok(total.flatten().unwrap_or(0))
}
