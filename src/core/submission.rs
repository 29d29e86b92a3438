//! Activity submission - stores a validated form as the member's whole day.

use crate::{
    core::{
        catalog::Catalog,
        comment::{delete_comment, upsert_comment},
        consumption::{ConsumptionEntry, record_day},
        form::{ActivityForm, parse_activity_form},
    },
    entities::consumption,
    errors::Result,
};
use sea_orm::TransactionTrait;
use std::collections::HashMap;
use tracing::{info, instrument};

/// Replaces the member's day with the products of `form` and writes its comment.
///
/// Every product is priced before storage is touched, so a catalog miss
/// leaves the database alone. Consumptions and comment are written in one
/// transaction; an empty comment removes the stored one.
///
/// # Errors
/// Returns `Error::MissingPrice` if the catalog cannot price a product,
/// `Error::Validation` if a line total overflows, or a database error.
/// Nothing is written in any of these cases.
#[instrument(skip(db, catalog, form), fields(date = %form.date))]
pub async fn submit_activity_day<C>(
    db: &C,
    catalog: &Catalog,
    user_id: i64,
    form: &ActivityForm,
) -> Result<Vec<consumption::Model>>
where
    C: TransactionTrait,
{
    let entries = form
        .products
        .iter()
        .map(|p| catalog.resolve(p))
        .collect::<Result<Vec<ConsumptionEntry>>>()?;

    let txn = db.begin().await?;
    let stored = record_day(&txn, user_id, form.date, &entries).await?;
    if form.comment.is_empty() {
        delete_comment(&txn, user_id, form.date).await?;
    } else {
        upsert_comment(&txn, user_id, form.date, &form.comment).await?;
    }
    txn.commit().await?;

    info!(
        "Recorded {} products for user {} on {}",
        stored.len(),
        user_id,
        form.date
    );
    Ok(stored)
}

/// Parses raw form fields and submits them.
///
/// # Errors
/// Returns `Error::Validation` without touching storage when the form is
/// invalid, otherwise the errors of [`submit_activity_day`].
pub async fn submit_activity_form<C>(
    db: &C,
    catalog: &Catalog,
    user_id: i64,
    fields: &HashMap<String, String>,
) -> Result<Vec<consumption::Model>>
where
    C: TransactionTrait,
{
    let form = parse_activity_form(catalog, fields)?;
    submit_activity_day(db, catalog, user_id, &form).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{
        activity::get_activity_day,
        catalog::{PriceCategory, PricingMode},
        comment::get_comment,
        consumption::{get_consumptions_for_day, sum_consumption_totals},
        form::ParsedProduct,
        seed::seed_catalog,
    };
    use crate::config::catalog::parse_config;
    use crate::errors::Error;
    use crate::test_utils::*;
    use chrono::NaiveDate;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[tokio::test]
    async fn test_resubmission_is_idempotent() -> Result<()> {
        let (db, catalog, user) = setup_with_catalog().await?;
        let payload = fields(&[
            ("date", "2025-01-15"),
            ("activities[lunch][quantity]", "2"),
            ("activities[lunch][price_category]", "regular"),
            ("activities[snacks][amount_chf]", "4.50"),
            ("comment", "guest"),
        ]);

        submit_activity_form(&db, &catalog, user.id, &payload).await?;
        let once = get_activity_day(&db, user.id, day()).await?;
        submit_activity_form(&db, &catalog, user.id, &payload).await?;
        let twice = get_activity_day(&db, user.id, day()).await?;

        assert_eq!(once, twice);
        assert_eq!(twice.total_price, 2 * 1200 + 450);
        assert_eq!(get_consumptions_for_day(&db, user.id, day()).await?.len(), 2);
        assert_eq!(twice.comment.as_deref(), Some("guest"));
        Ok(())
    }

    #[tokio::test]
    async fn test_resubmission_overwrites_not_merges() -> Result<()> {
        let (db, catalog, user) = setup_with_catalog().await?;

        submit_activity_form(
            &db,
            &catalog,
            user.id,
            &fields(&[
                ("date", "2025-01-15"),
                ("activities[sauna][quantity]", "1"),
                ("activities[coffee][quantity]", "2"),
                ("comment", "first"),
            ]),
        )
        .await?;
        submit_activity_form(
            &db,
            &catalog,
            user.id,
            &fields(&[("date", "2025-01-15"), ("activities[coffee][quantity]", "1")]),
        )
        .await?;

        let activity = get_activity_day(&db, user.id, day()).await?;
        assert_eq!(activity.items.len(), 1);
        assert_eq!(activity.items[0].code, "coffee");
        assert_eq!(activity.total_price, 150);
        // an empty comment removes the stored one
        assert!(get_comment(&db, user.id, day()).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_all_zero_submission_never_reaches_storage() {
        let catalog = test_catalog();
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = submit_activity_form(
            &db,
            &catalog,
            1,
            &fields(&[
                ("date", "2025-01-15"),
                ("activities[lunch][quantity]", "0"),
                ("activities[lunch][price_category]", "regular"),
                ("activities[snacks][amount_chf]", "0"),
            ]),
        )
        .await;

        assert!(result.unwrap_err().is_validation());
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_category_never_reaches_storage() {
        let catalog = test_catalog();
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = submit_activity_form(
            &db,
            &catalog,
            1,
            &fields(&[
                ("date", "2025-01-15"),
                ("activities[lunch][quantity]", "1"),
                ("activities[lunch][price_category]", "platinum"),
            ]),
        )
        .await;

        let errors = result.unwrap_err();
        assert!(
            errors
                .field_errors()
                .unwrap()
                .contains("activities[lunch][price_category]")
        );
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_overflowing_quantity_never_reaches_storage() {
        let catalog = test_catalog();
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = submit_activity_form(
            &db,
            &catalog,
            1,
            &fields(&[
                ("date", "2025-01-15"),
                ("activities[lunch][quantity]", "9223372036854775807"),
                ("activities[lunch][price_category]", "regular"),
            ]),
        )
        .await;

        let error = result.unwrap_err();
        assert!(error.is_validation());
        assert_eq!(
            error.field_errors().unwrap().get("activities[lunch][quantity]"),
            Some("quantity is too large")
        );
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_missing_price_is_internal_and_writes_nothing() {
        let catalog = test_catalog();
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let form = ActivityForm {
            date: day(),
            products: vec![ParsedProduct {
                code: "dinner".to_string(),
                category: Some(PriceCategory::Regular),
                quantity: 1,
                amount: None,
            }],
            comment: String::new(),
        };

        let result = submit_activity_day(&db, &catalog, 1, &form).await;
        let error = result.unwrap_err();
        assert!(matches!(error, Error::MissingPrice { .. }));
        assert!(!error.is_validation());
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_price_change_does_not_alter_history() -> Result<()> {
        let (db, catalog, user) = setup_with_catalog().await?;
        submit_activity_form(
            &db,
            &catalog,
            user.id,
            &fields(&[("date", "2025-01-15"), ("activities[sauna][quantity]", "2")]),
        )
        .await?;

        let raised = parse_config(&TEST_CATALOG_TOML.replace("price = 1000", "price = 1400"))?;
        seed_catalog(&db, &raised).await?;
        let new_catalog = crate::core::catalog::Catalog::load(&db).await?;
        assert_eq!(new_catalog.unit_price("sauna", "")?, 1400);
        assert_eq!(
            new_catalog.product("snacks", None).unwrap().pricing_mode,
            PricingMode::Custom
        );

        let activity = get_activity_day(&db, user.id, day()).await?;
        assert_eq!(activity.items[0].unit_price, 1000);
        assert_eq!(sum_consumption_totals(&db, user.id).await?, 2000);
        Ok(())
    }
}
