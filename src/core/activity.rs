//! Activity aggregation - turns a member's consumption rows into days and months.
//!
//! The grouping functions are pure and work on [`ActivityRow`] values so they
//! can be tested without a database. Days keep the order of the incoming rows
//! (the loader returns them newest first); months are always sorted newest
//! first. All arithmetic is in integer Rappen.

use crate::{
    core::{catalog::compare_sort_order, comment::get_comments_for_user, money::format_chf},
    entities::{
        Consumption, PriceCategory as PriceCategoryEntity, Product, ProductFormOrder, consumption,
    },
    errors::{Error, Result},
};
use chrono::{Datelike, Days, NaiveDate};
use sea_orm::{QueryOrder, prelude::*};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;
use tracing::instrument;

/// One consumption row as read from storage, joined with its product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRow {
    pub date: NaiveDate,
    pub product_id: i64,
    pub product_name: String,
    pub product_code: String,
    pub unit_price: i64,
    pub quantity: i64,
    /// Price category name, None for category-less products
    pub price_category: Option<String>,
    /// Display position of the product code
    pub sort_order: Option<i32>,
}

/// One product line of a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub product_id: i64,
    pub name: String,
    pub code: String,
    pub unit_price: i64,
    pub quantity: i64,
    pub price_category: Option<String>,
    pub sort_order: Option<i32>,
}

impl LineItem {
    /// Line total in Rappen, saturating at `i64::MAX`.
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.quantity.saturating_mul(self.unit_price)
    }
}

/// Everything a member recorded on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityDay {
    pub date: NaiveDate,
    /// Sum of the line totals in Rappen
    pub total_price: i64,
    pub items: Vec<LineItem>,
    pub comment: Option<String>,
}

/// The days of one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityMonth {
    /// First day of the month
    pub month: NaiveDate,
    /// Sum of the day totals in Rappen
    pub total_price: i64,
    pub days: Vec<ActivityDay>,
}

/// First day of the month containing `date`.
#[must_use]
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// Groups rows into one [`ActivityDay`] per distinct date.
///
/// Days appear in the order their date first occurs in `rows`. Rows of the
/// same day sharing product, unit price and price category are merged into a
/// single line with the summed quantity. Lines are ordered by sort order
/// (missing last), then by product name. Sums saturate instead of wrapping.
#[must_use]
pub fn group_days(rows: &[ActivityRow], comments: &HashMap<NaiveDate, String>) -> Vec<ActivityDay> {
    let mut days: Vec<ActivityDay> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for row in rows {
        let position = *index.entry(row.date).or_insert_with(|| {
            days.push(ActivityDay {
                date: row.date,
                total_price: 0,
                items: Vec::new(),
                comment: comments.get(&row.date).cloned(),
            });
            days.len() - 1
        });
        let day = &mut days[position];

        let existing = day.items.iter_mut().find(|item| {
            item.product_id == row.product_id
                && item.unit_price == row.unit_price
                && item.price_category == row.price_category
        });
        match existing {
            Some(item) => item.quantity = item.quantity.saturating_add(row.quantity),
            None => day.items.push(LineItem {
                product_id: row.product_id,
                name: row.product_name.clone(),
                code: row.product_code.clone(),
                unit_price: row.unit_price,
                quantity: row.quantity,
                price_category: row.price_category.clone(),
                sort_order: row.sort_order,
            }),
        }
        day.total_price = day
            .total_price
            .saturating_add(row.quantity.saturating_mul(row.unit_price));
    }

    for day in &mut days {
        day.items.sort_by(|a, b| {
            compare_sort_order(a.sort_order, b.sort_order).then_with(|| a.name.cmp(&b.name))
        });
    }
    days
}

/// Groups days by calendar month, newest month first.
///
/// Days keep their relative order inside each month.
#[must_use]
pub fn group_months(days: Vec<ActivityDay>) -> Vec<ActivityMonth> {
    let mut months: BTreeMap<NaiveDate, ActivityMonth> = BTreeMap::new();
    for day in days {
        let key = month_start(day.date);
        let month = months.entry(key).or_insert_with(|| ActivityMonth {
            month: key,
            total_price: 0,
            days: Vec::new(),
        });
        month.total_price = month.total_price.saturating_add(day.total_price);
        month.days.push(day);
    }
    months.into_values().rev().collect()
}

/// Loads the member's rows newest date first, insertion order within a date.
#[instrument(skip(db))]
async fn load_rows<C>(db: &C, user_id: i64, date: Option<NaiveDate>) -> Result<Vec<ActivityRow>>
where
    C: ConnectionTrait,
{
    let category_names: HashMap<i32, String> = PriceCategoryEntity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let sort_orders: HashMap<String, i32> = ProductFormOrder::find()
        .all(db)
        .await?
        .into_iter()
        .map(|o| (o.code, o.sort_order))
        .collect();

    let mut query = Consumption::find().filter(consumption::Column::UserId.eq(user_id));
    if let Some(date) = date {
        query = query.filter(consumption::Column::Date.eq(date));
    }
    let rows = query
        .order_by_desc(consumption::Column::Date)
        .order_by_asc(consumption::Column::Id)
        .find_also_related(Product)
        .all(db)
        .await?;

    rows.into_iter()
        .map(|(row, product)| {
            let product = product.ok_or_else(|| Error::Config {
                message: format!("Consumption {} references a missing product", row.id),
            })?;
            Ok(ActivityRow {
                date: row.date,
                product_id: product.id,
                sort_order: sort_orders.get(&product.code).copied(),
                product_name: product.name,
                product_code: product.code,
                unit_price: row.unit_price,
                quantity: row.quantity,
                price_category: row
                    .price_category_id
                    .and_then(|id| category_names.get(&id).cloned()),
            })
        })
        .collect()
}

/// All of the member's days that have at least one consumption, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_activity_days<C>(db: &C, user_id: i64) -> Result<Vec<ActivityDay>>
where
    C: ConnectionTrait,
{
    let rows = load_rows(db, user_id, None).await?;
    let comments = get_comments_for_user(db, user_id).await?;
    Ok(group_days(&rows, &comments))
}

/// The member's activity grouped by month, newest month first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_activity_months<C>(db: &C, user_id: i64) -> Result<Vec<ActivityMonth>>
where
    C: ConnectionTrait,
{
    Ok(group_months(get_activity_days(db, user_id).await?))
}

/// A single day for the edit view. Days without consumptions come back empty
/// but still carry their comment.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_activity_day<C>(db: &C, user_id: i64, date: NaiveDate) -> Result<ActivityDay>
where
    C: ConnectionTrait,
{
    let rows = load_rows(db, user_id, Some(date)).await?;
    let comment = crate::core::comment::get_comment(db, user_id, date)
        .await?
        .map(|c| c.comment);
    let comments = comment
        .iter()
        .map(|c| (date, c.clone()))
        .collect::<HashMap<_, _>>();

    Ok(group_days(&rows, &comments)
        .into_iter()
        .next()
        .unwrap_or(ActivityDay {
            date,
            total_price: 0,
            items: Vec::new(),
            comment,
        }))
}

/// Renders one day as plain text.
#[must_use]
pub fn format_day(day: &ActivityDay) -> String {
    let mut out = format!(
        "{}  CHF {}\n",
        day.date.format("%a %d.%m.%Y"),
        format_chf(day.total_price)
    );
    for item in &day.items {
        let category = item
            .price_category
            .as_deref()
            .map(|c| format!(" ({c})"))
            .unwrap_or_default();
        writeln!(
            out,
            "    {}x {}{} @ {} = {}",
            item.quantity,
            item.name,
            category,
            format_chf(item.unit_price),
            format_chf(item.total())
        )
        .ok();
    }
    if let Some(comment) = &day.comment {
        writeln!(out, "    \"{comment}\"").ok();
    }
    out
}

/// Renders the monthly overview as plain text.
#[must_use]
pub fn format_overview(months: &[ActivityMonth]) -> String {
    if months.is_empty() {
        return "No activities recorded.".to_string();
    }

    let mut out = String::new();
    for month in months {
        writeln!(
            out,
            "{}  CHF {}",
            month.month.format("%B %Y"),
            format_chf(month.total_price)
        )
        .ok();
        for day in &month.days {
            out.push_str("  ");
            out.push_str(&format_day(day));
        }
    }
    out
}
