//! Activity commands - record a day and show overviews.

use crate::{
    cli::AppContext,
    core::{
        activity::{format_day, format_overview, get_activity_day, get_activity_months},
        form::{COMMENT_FIELD, DATE_FIELD},
        money::format_chf,
        submission::submit_activity_form,
        user::get_user_by_id,
    },
    errors::Result,
};
use chrono::{Local, NaiveDate};
use std::collections::HashMap;
use std::fmt::Write;

/// Submits `fields` as the member's day and echoes what was stored.
///
/// `date` and `comment` override the `date` and `comment` form fields.
pub async fn record(
    ctx: &AppContext,
    user_id: i64,
    date: Option<NaiveDate>,
    fields: Vec<(String, String)>,
    comment: Option<String>,
) -> Result<String> {
    let member = get_user_by_id(&ctx.database, user_id).await?;

    let mut fields: HashMap<String, String> = fields.into_iter().collect();
    if let Some(date) = date {
        fields.insert(DATE_FIELD.to_string(), date.format("%Y-%m-%d").to_string());
    }
    fields
        .entry(DATE_FIELD.to_string())
        .or_insert_with(|| Local::now().date_naive().format("%Y-%m-%d").to_string());
    if let Some(comment) = comment {
        fields.insert(COMMENT_FIELD.to_string(), comment);
    }

    let catalog = ctx.catalog.current().await;
    let stored = submit_activity_form(&ctx.database, &catalog, member.id, &fields).await?;

    let total: i64 = stored.iter().map(|c| c.total_price).sum();
    let day = stored.first().map(|c| c.date).unwrap_or_default();
    Ok(format!(
        "Recorded {} products for {} on {}: CHF {}",
        stored.len(),
        member.email,
        day.format("%d.%m.%Y"),
        format_chf(total)
    ))
}

/// The member's monthly overview.
pub async fn overview(ctx: &AppContext, user_id: i64) -> Result<String> {
    let member = get_user_by_id(&ctx.database, user_id).await?;
    let months = get_activity_months(&ctx.database, member.id).await?;
    Ok(format_overview(&months))
}

/// One day of the member, followed by the form values it would prefill.
pub async fn day(ctx: &AppContext, user_id: i64, date: NaiveDate) -> Result<String> {
    let member = get_user_by_id(&ctx.database, user_id).await?;
    let activity = get_activity_day(&ctx.database, member.id, date).await?;
    let catalog = ctx.catalog.current().await;

    let mut out = format_day(&activity);
    out.push_str("Form:\n");
    for spec in catalog.form_values(&activity) {
        let checked = spec
            .categories
            .iter()
            .find(|c| c.checked)
            .map(|c| format!(" [{}]", c.category))
            .unwrap_or_default();
        let value = if spec.is_custom_amount {
            format!("CHF {}", format_chf(spec.count_or_amount))
        } else {
            spec.count_or_amount.to_string()
        };
        writeln!(out, "    {}: {}{}", spec.label, value, checked).ok();
    }
    Ok(out)
}
