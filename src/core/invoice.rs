//! Invoice projection - read-only access to the monthly bills.
//!
//! Invoices are written by the external billing batch; this module only reads
//! them and renders the payment reference members put on their transfers.

use crate::{
    core::{activity::month_start, money::format_chf, user::get_all_users},
    entities::{Invoice, invoice},
    errors::{Error, Result},
};
use chrono::{Months, NaiveDate};
use sea_orm::{QueryOrder, prelude::*};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Payment state of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceState {
    Unpaid,
    Paid,
}

impl InvoiceState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for InvoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            other => Err(Error::InvalidInvoiceState {
                state: other.to_string(),
            }),
        }
    }
}

impl invoice::Model {
    /// Billed month for display, e.g. `January 2025`.
    #[must_use]
    pub fn month_year(&self) -> String {
        self.period.format("%B %Y").to_string()
    }

    /// Billed month as `2025-01`.
    #[must_use]
    pub fn period_yyyymm(&self) -> String {
        self.period.format("%Y-%m").to_string()
    }

    /// Parsed payment state.
    ///
    /// # Errors
    /// Returns `Error::InvalidInvoiceState` for anything but `unpaid` or `paid`.
    pub fn state(&self) -> Result<InvoiceState> {
        self.state.parse()
    }
}

/// All invoices of a member, newest period first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_invoices_for_user<C>(db: &C, user_id: i64) -> Result<Vec<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .filter(invoice::Column::UserId.eq(user_id))
        .order_by_desc(invoice::Column::Period)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The member's invoice for the month containing `month`.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_invoice_for_period<C>(
    db: &C,
    user_id: i64,
    month: NaiveDate,
) -> Result<Option<invoice::Model>>
where
    C: ConnectionTrait,
{
    Invoice::find()
        .filter(invoice::Column::UserId.eq(user_id))
        .filter(invoice::Column::Period.eq(month_start(month)))
        .one(db)
        .await
        .map_err(Into::into)
}

/// The member's invoice for the month before `today`.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_invoice_of_previous_month<C>(
    db: &C,
    user_id: i64,
    today: NaiveDate,
) -> Result<Option<invoice::Model>>
where
    C: ConnectionTrait,
{
    let Some(previous) = month_start(today).checked_sub_months(Months::new(1)) else {
        return Ok(None);
    };
    get_invoice_for_period(db, user_id, previous).await
}

/// Builds the payment reference, e.g. `Anna: 2025-01: Essen 24.00, Kaffee 3.00`.
///
/// Only non-zero subtotals are listed, in the order meals, lectures, coffee,
/// sauna, kiosk. Without any, the reference ends after the period.
#[must_use]
pub fn payment_reference(invoice: &invoice::Model, first_name: &str) -> String {
    let positions: Vec<String> = [
        ("Essen", invoice.total_eating),
        ("Vorträge", invoice.total_lecture),
        ("Kaffee", invoice.total_coffee),
        ("Sauna", invoice.total_sauna),
        ("Kiosk", invoice.total_kiosk),
    ]
    .into_iter()
    .filter(|(_, amount)| *amount > 0)
    .map(|(label, amount)| format!("{label} {}", format_chf(amount)))
    .collect();

    if positions.is_empty() {
        return format!("{first_name}: {}", invoice.period_yyyymm());
    }
    format!(
        "{first_name}: {}: {}",
        invoice.period_yyyymm(),
        positions.join(", ")
    )
}

/// Formats an invoice as a one-line summary for display.
#[must_use]
pub fn format_invoice_summary(invoice: &invoice::Model) -> String {
    format!(
        "{}: CHF {} ({})",
        invoice.month_year(),
        format_chf(invoice.total_price),
        invoice.state
    )
}

/// Payment references of every member for the month before `today`.
///
/// Members without an invoice for that month are skipped.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn get_payment_references<C>(db: &C, today: NaiveDate) -> Result<Vec<(String, String)>>
where
    C: ConnectionTrait,
{
    let mut references = Vec::new();
    for user in get_all_users(db).await? {
        match get_invoice_of_previous_month(db, user.id, today).await? {
            Some(invoice) => {
                references.push((user.email.clone(), payment_reference(&invoice, &user.first_name)));
            }
            None => debug!("No invoice for {} before {}", user.email, today),
        }
    }
    if references.is_empty() {
        warn!("No invoices found for the month before {}", today);
    }
    Ok(references)
}
