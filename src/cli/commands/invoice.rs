//! Invoice commands - list a member's invoices and print payment references.

use crate::{
    cli::AppContext,
    core::{invoice, user::get_user_by_id},
    errors::Result,
};
use chrono::{Local, NaiveDate};
use std::fmt::Write;

/// Lists the member's invoices, newest first.
pub async fn list(ctx: &AppContext, user_id: i64) -> Result<String> {
    let member = get_user_by_id(&ctx.database, user_id).await?;
    let invoices = invoice::get_invoices_for_user(&ctx.database, member.id).await?;
    if invoices.is_empty() {
        return Ok(format!("No invoices for {}.", member.email));
    }

    let mut out = String::new();
    for inv in &invoices {
        writeln!(out, "{}", invoice::format_invoice_summary(inv)).ok();
        writeln!(
            out,
            "    {}",
            invoice::payment_reference(inv, &member.first_name)
        )
        .ok();
    }
    Ok(out)
}

/// Payment references for the month before `today` (defaults to the local date).
pub async fn references(ctx: &AppContext, today: Option<NaiveDate>) -> Result<String> {
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let references = invoice::get_payment_references(&ctx.database, today).await?;
    if references.is_empty() {
        return Ok("No invoices for the previous month.".to_string());
    }

    let mut out = String::new();
    for (email, reference) in references {
        writeln!(out, "{email}: {reference}").ok();
    }
    Ok(out)
}
