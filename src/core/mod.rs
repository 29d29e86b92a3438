//! Core business logic - framework-agnostic pricing, recording, aggregation and invoicing.

/// Activity aggregation: consumption rows into days and months
pub mod activity;
/// Pricing catalog lookup and the shared, reloadable catalog handle
pub mod catalog;
/// Per-day comments with upsert semantics
pub mod comment;
/// Whole-day consumption recording (write path)
pub mod consumption;
/// Activity form parsing and validation
pub mod form;
/// Monthly invoice projection and payment references
pub mod invoice;
/// CHF / Rappen conversion
pub mod money;
/// Catalog seeding from `config.toml`
pub mod seed;
/// Activity submission: parsed form to stored day
pub mod submission;
/// Member records
pub mod user;
