/// Database configuration and connection management
pub mod database;

/// Price catalog configuration loading from config.toml
pub mod catalog;
