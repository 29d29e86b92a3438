//! Price catalog configuration loading from config.toml
//!
//! The products defined in config.toml are used to seed the `products`,
//! `price_categories` and `product_form_order` tables. Prices are given in
//! Rappen so the file never carries floating point amounts.

use crate::core::catalog::{PriceCategory, PricingMode};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_VAR: &str = "BELLEVUE_CONFIG";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// List of product configurations to seed
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

/// Configuration for a single product code
#[derive(Debug, Deserialize, Clone)]
pub struct ProductConfig {
    /// Code used in form field names, e.g. `lunch`
    pub code: String,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub pricing_mode: PricingMode,
    /// Unit price in Rappen for category-less fixed products
    pub price: Option<i64>,
    /// Unit prices in Rappen per price category
    #[serde(default)]
    pub prices: BTreeMap<PriceCategory, i64>,
    /// Position on the activity form, lower first
    pub sort_order: Option<i32>,
}

impl ProductConfig {
    /// Checks that the pricing fields fit the pricing mode.
    ///
    /// # Errors
    /// Returns `Error::Config` naming the offending product code.
    pub fn validate(&self) -> Result<()> {
        let fail = |message: &str| {
            Err(Error::Config {
                message: format!("Product '{}': {message}", self.code),
            })
        };

        if self.code.trim().is_empty() {
            return fail("code must not be empty");
        }
        match self.pricing_mode {
            PricingMode::Custom => {
                if self.price.is_some() || !self.prices.is_empty() {
                    return fail("custom-amount products take no catalog price");
                }
            }
            PricingMode::Fixed => {
                if self.price.is_some() == !self.prices.is_empty() {
                    return fail("set exactly one of `price` or `prices`");
                }
                if self.price.is_some_and(|p| p < 0) || self.prices.values().any(|p| *p < 0) {
                    return fail("prices must not be negative");
                }
            }
        }
        Ok(())
    }
}

impl Config {
    /// Validates every product and rejects duplicate codes.
    ///
    /// # Errors
    /// Returns the first `Error::Config` found.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for product in &self.products {
            product.validate()?;
            if !seen.insert(product.code.as_str()) {
                return Err(Error::Config {
                    message: format!("Product '{}' is defined twice", product.code),
                });
            }
        }
        Ok(())
    }
}

/// Parses and validates catalog configuration from a TOML string
///
/// # Errors
/// Returns an error if the TOML syntax is invalid, required fields are
/// missing or a product fails validation.
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads catalog configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or [`parse_config`] fails.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_config(&contents)
}

/// Loads catalog configuration from `$BELLEVUE_CONFIG`, or ./config.toml when unset
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_catalog_config() {
        let toml_str = r#"
            [[products]]
            code = "lunch"
            name = "Mittagessen"
            sort_order = 2
            prices = { regular = 1200, reduced = 900, surplus = 1500 }

            [[products]]
            code = "sauna"
            name = "Sauna"
            price = 1000

            [[products]]
            code = "snacks"
            name = "Kiosk"
            pricing_mode = "custom"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.products.len(), 3);

        let lunch = &config.products[0];
        assert_eq!(lunch.pricing_mode, PricingMode::Fixed);
        assert_eq!(lunch.prices.get(&PriceCategory::Reduced), Some(&900));
        assert_eq!(lunch.sort_order, Some(2));

        assert_eq!(config.products[1].price, Some(1000));
        assert!(config.products[1].prices.is_empty());
        assert_eq!(config.products[2].pricing_mode, PricingMode::Custom);
    }

    #[test]
    fn test_rejects_unknown_category() {
        let toml_str = r#"
            [[products]]
            code = "lunch"
            name = "Mittagessen"
            prices = { vip = 100 }
        "#;
        assert!(matches!(parse_config(toml_str), Err(Error::Config { .. })));
    }

    #[test]
    fn test_rejects_inconsistent_pricing() {
        let both = r#"
            [[products]]
            code = "lunch"
            name = "Mittagessen"
            price = 1200
            prices = { regular = 1200 }
        "#;
        let neither = r#"
            [[products]]
            code = "lunch"
            name = "Mittagessen"
        "#;
        let priced_custom = r#"
            [[products]]
            code = "snacks"
            name = "Kiosk"
            pricing_mode = "custom"
            price = 100
        "#;
        let duplicate = r#"
            [[products]]
            code = "sauna"
            name = "Sauna"
            price = 1000

            [[products]]
            code = "sauna"
            name = "Sauna 2"
            price = 1200
        "#;

        for input in [both, neither, priced_custom, duplicate] {
            assert!(matches!(parse_config(input), Err(Error::Config { .. })));
        }
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_config("/nonexistent/bellevue/config.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
