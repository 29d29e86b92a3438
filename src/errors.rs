//! Unified error types for the Bellevue ledger.
//!
//! Three kinds of failure matter to callers: validation errors caused by user
//! input (reported back field by field), configuration errors where the price
//! catalog lacks an entry the form can emit, and storage errors. Only the
//! first kind is safe to show to the submitter, along with a failed login.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Field-level validation failures keyed by form field name.
///
/// Errors accumulate instead of stopping at the first one so that a form can be
/// re-rendered with every problem highlighted at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Creates an empty error set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a message to a field. A later message for the same field replaces the earlier one.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    /// Returns the message attached to `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Whether `field` has an error attached.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over `(field, message)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {0}")]
    Validation(FieldErrors),

    #[error("No catalog price for product '{code}' with price category '{category}'")]
    MissingPrice { code: String, category: String },

    #[error("User not found: {id}")]
    UserNotFound { id: String },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid invoice state: {state}")]
    InvalidInvoiceState { state: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

impl Error {
    /// True for errors caused by the submitter's input rather than by the system.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns the field errors when this is a validation failure.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_accumulate_and_display_in_order() {
        let mut errors = FieldErrors::new();
        errors.add("date", "invalid date input");
        errors.add("activities[lunch][quantity]", "input is not a number");

        assert_eq!(errors.len(), 2);
        assert!(errors.contains("date"));
        assert_eq!(
            errors.to_string(),
            "activities[lunch][quantity]: input is not a number; date: invalid date input"
        );
    }

    #[test]
    fn test_is_validation() {
        let validation = Error::Validation(FieldErrors::new());
        let missing = Error::MissingPrice {
            code: "lunch".to_string(),
            category: "regular".to_string(),
        };

        assert!(validation.is_validation());
        assert!(validation.field_errors().is_some());
        assert!(!missing.is_validation());
        assert!(missing.field_errors().is_none());
    }
}
