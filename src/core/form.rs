//! Activity form parsing - untrusted form fields to validated products.
//!
//! Field names follow the `activities[<code>][quantity]`,
//! `activities[<code>][price_category]` and `activities[<code>][amount_chf]`
//! pattern, plus a top-level `date` and `comment`. Every product spec of the
//! catalog is visited and all problems are collected before returning, so the
//! caller can show them together. Parsing never touches storage.

use crate::{
    core::{
        catalog::{Catalog, PriceCategory},
        money::{MoneyError, parse_chf},
    },
    errors::{Error, FieldErrors, Result},
};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Name of the date field (ISO 8601, `YYYY-MM-DD`).
pub const DATE_FIELD: &str = "date";
/// Name of the free-text comment field.
pub const COMMENT_FIELD: &str = "comment";
/// Key of the error raised when the form contains no product at all.
pub const ACTIVITIES_FIELD: &str = "activities";

/// Quantity field of a fixed-price product.
#[must_use]
pub fn quantity_field(code: &str) -> String {
    format!("activities[{code}][quantity]")
}

/// Price category field of a fixed-price product with categories.
#[must_use]
pub fn category_field(code: &str) -> String {
    format!("activities[{code}][price_category]")
}

/// CHF amount field of a custom-amount product.
#[must_use]
pub fn amount_field(code: &str) -> String {
    format!("activities[{code}][amount_chf]")
}

/// One product line taken from the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedProduct {
    pub code: String,
    pub category: Option<PriceCategory>,
    /// Always positive
    pub quantity: i64,
    /// Amount in Rappen for custom-amount products
    pub amount: Option<i64>,
}

/// A validated activity form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityForm {
    pub date: NaiveDate,
    /// At least one entry
    pub products: Vec<ParsedProduct>,
    /// Trimmed comment, possibly empty
    pub comment: String,
}

/// Parses a submitted activity form against the catalog's product specs.
///
/// # Errors
/// Returns `Error::Validation` carrying every field error found. A form with
/// no product entries fails on the `activities` key even if it has a comment.
pub fn parse_activity_form(
    catalog: &Catalog,
    fields: &HashMap<String, String>,
) -> Result<ActivityForm> {
    let mut errors = FieldErrors::new();
    let value = |name: &str| field_value(fields, name);

    let date = NaiveDate::parse_from_str(value(DATE_FIELD), "%Y-%m-%d").ok();
    if date.is_none() {
        errors.add(DATE_FIELD, "invalid date input");
    }

    let mut products = Vec::new();
    for spec in catalog.specs() {
        let parsed = if spec.is_custom_amount {
            parse_custom_amount(&spec.code, value(&amount_field(&spec.code)), &mut errors)
        } else {
            parse_quantity(
                catalog,
                &spec.code,
                spec.has_categories,
                value(&quantity_field(&spec.code)),
                value(&category_field(&spec.code)),
                &mut errors,
            )
        };
        products.extend(parsed);
    }

    if products.is_empty() && errors.is_empty() {
        errors.add(ACTIVITIES_FIELD, "nothing to submit");
    }

    match date {
        Some(date) if errors.is_empty() => Ok(ActivityForm {
            date,
            products,
            comment: value(COMMENT_FIELD).to_string(),
        }),
        _ => Err(Error::Validation(errors)),
    }
}

fn field_value<'a>(fields: &'a HashMap<String, String>, name: &str) -> &'a str {
    fields.get(name).map_or("", |v| v.trim())
}

/// Reads a fixed-price product. Empty or zero quantities yield `None`.
///
/// The category is checked even when the quantity is bad, so both fields can
/// be reported together.
fn parse_quantity(
    catalog: &Catalog,
    code: &str,
    has_categories: bool,
    quantity: &str,
    category: &str,
    errors: &mut FieldErrors,
) -> Option<ParsedProduct> {
    if quantity.is_empty() {
        return None;
    }
    let quantity = match quantity.parse::<i64>() {
        Ok(0) => return None,
        Ok(q) if q < 0 => {
            errors.add(quantity_field(code), "input is a negative number");
            None
        }
        Ok(q) => Some(q),
        Err(_) => {
            errors.add(quantity_field(code), "input is not a number");
            None
        }
    };

    let category_is_valid = !has_categories || catalog.is_known_category(code, category);
    if !category_is_valid {
        errors.add(category_field(code), "invalid price category");
    }
    let quantity = quantity.filter(|_| category_is_valid)?;

    Some(ParsedProduct {
        code: code.to_string(),
        category: if has_categories {
            PriceCategory::from_name(category)
        } else {
            None
        },
        quantity,
        amount: None,
    })
}

/// Reads a custom-amount product. Empty amounts and amounts rounding to zero yield `None`.
fn parse_custom_amount(code: &str, amount: &str, errors: &mut FieldErrors) -> Option<ParsedProduct> {
    if amount.is_empty() {
        return None;
    }
    match parse_chf(amount) {
        Ok(0) => None,
        Ok(rappen) => Some(ParsedProduct {
            code: code.to_string(),
            category: None,
            quantity: 1,
            amount: Some(rappen),
        }),
        Err(MoneyError::Negative) => {
            errors.add(amount_field(code), "input is a negative number");
            None
        }
        Err(_) => {
            errors.add(amount_field(code), "invalid custom amount CHF");
            None
        }
    }
}
