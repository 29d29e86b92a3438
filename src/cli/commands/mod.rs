//! Command implementations organized by area.

/// Activity recording and overviews
pub mod activity;

/// Catalog seeding
pub mod catalog;

/// Invoice listing and payment references
pub mod invoice;

/// Member management
pub mod user;
