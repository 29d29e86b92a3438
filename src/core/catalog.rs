//! Pricing catalog - resolves product codes and price categories to unit prices.
//!
//! The catalog is loaded once from the database at startup and treated as an
//! immutable value afterwards. Request-scoped code borrows it through an
//! `Arc<Catalog>` handed out by [`SharedCatalog`]; an explicit reload builds a
//! fresh catalog and swaps the whole value, it never mutates one in place.
//!
//! The catalog is meant to be exhaustive for every code and category the
//! activity form can emit. A lookup miss is therefore a deployment defect and
//! surfaces as [`Error::MissingPrice`], not as a field error.

use crate::{
    core::{
        activity::ActivityDay,
        consumption::ConsumptionEntry,
        form::{ParsedProduct, quantity_field},
    },
    entities::{PriceCategory as PriceCategoryEntity, Product, ProductFormOrder, product},
    errors::{Error, FieldErrors, Result},
};
use sea_orm::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// How a product is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PricingMode {
    /// Unit price comes from the catalog
    #[default]
    Fixed,
    /// The member enters the amount (e.g. snacks from the kiosk)
    Custom,
}

impl PricingMode {
    /// Name as stored in `products.pricing_mode`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Custom => "custom",
        }
    }

    /// Parses the stored name; unknown names yield `None`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "fixed" => Some(Self::Fixed),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// A named pricing tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PriceCategory {
    Regular,
    Reduced,
    Surplus,
}

impl PriceCategory {
    /// Every recognized category.
    pub const ALL: [Self; 3] = [Self::Regular, Self::Reduced, Self::Surplus];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Reduced => "reduced",
            Self::Surplus => "surplus",
        }
    }

    /// Parses a submitted category name. Matching is exact; `"Regular"` is not accepted.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for PriceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup key of one product variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceKey {
    /// Product code, e.g. `"lunch"`
    pub code: String,
    /// Price category, None for category-less products
    pub category: Option<PriceCategory>,
}

impl PriceKey {
    #[must_use]
    pub fn new(code: &str, category: Option<PriceCategory>) -> Self {
        Self {
            code: code.to_string(),
            category,
        }
    }
}

/// One active product variant as held by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogProduct {
    /// Database id of the variant
    pub id: i64,
    pub code: String,
    /// Display name
    pub name: String,
    pub pricing_mode: PricingMode,
    pub category: Option<PriceCategory>,
    /// Unit price in Rappen, None for custom-amount products
    pub price: Option<i64>,
}

/// A selectable price category of a form spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryOption {
    pub category: PriceCategory,
    /// Unit price in Rappen for this category
    pub price: i64,
    /// Whether this option is pre-selected on the form
    pub checked: bool,
}

/// How one product code appears on the activity form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSpec {
    pub label: String,
    pub code: String,
    pub has_categories: bool,
    pub is_custom_amount: bool,
    /// Category options ordered by category name
    pub categories: Vec<CategoryOption>,
    pub sort_order: Option<i32>,
    /// Prefilled quantity, or amount in Rappen for custom-amount products
    pub count_or_amount: i64,
}

/// Immutable price catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: HashMap<PriceKey, CatalogProduct>,
    category_ids: HashMap<PriceCategory, i32>,
    sort_orders: HashMap<String, i32>,
    specs: Vec<ProductSpec>,
}

impl Catalog {
    /// Builds a catalog from already-loaded parts.
    ///
    /// Form specs are derived by grouping variants by code. Specs are ordered
    /// by sort order (codes without one last), then by code.
    #[must_use]
    pub fn from_products(
        products: Vec<CatalogProduct>,
        category_ids: HashMap<PriceCategory, i32>,
        sort_orders: HashMap<String, i32>,
    ) -> Self {
        let mut by_code: BTreeMap<String, Vec<&CatalogProduct>> = BTreeMap::new();
        for p in &products {
            by_code.entry(p.code.clone()).or_default().push(p);
        }

        let mut specs: Vec<ProductSpec> = by_code
            .into_iter()
            .map(|(code, variants)| {
                let mut categories: Vec<CategoryOption> = variants
                    .iter()
                    .filter_map(|v| {
                        Some(CategoryOption {
                            category: v.category?,
                            price: v.price?,
                            checked: v.category == Some(PriceCategory::Regular),
                        })
                    })
                    .collect();
                categories.sort_by(|a, b| a.category.as_str().cmp(b.category.as_str()));

                ProductSpec {
                    label: variants
                        .first()
                        .map(|v| v.name.clone())
                        .unwrap_or_default(),
                    has_categories: variants.iter().any(|v| v.category.is_some()),
                    is_custom_amount: variants
                        .iter()
                        .any(|v| v.pricing_mode == PricingMode::Custom),
                    categories,
                    sort_order: sort_orders.get(&code).copied(),
                    count_or_amount: 0,
                    code,
                }
            })
            .collect();
        specs.sort_by(|a, b| {
            compare_sort_order(a.sort_order, b.sort_order).then_with(|| a.code.cmp(&b.code))
        });

        let products = products
            .into_iter()
            .map(|p| (PriceKey::new(&p.code, p.category), p))
            .collect();

        Self {
            products,
            category_ids,
            sort_orders,
            specs,
        }
    }

    /// Loads the catalog from the `products`, `price_categories` and `product_form_order` tables.
    ///
    /// Soft-deleted products are left out. A product whose category or pricing
    /// mode is not recognized is a configuration error.
    pub async fn load<C>(db: &C) -> Result<Self>
    where
        C: ConnectionTrait,
    {
        let mut category_ids = HashMap::new();
        for row in PriceCategoryEntity::find().all(db).await? {
            match PriceCategory::from_name(&row.name) {
                Some(category) => {
                    category_ids.insert(category, row.id);
                }
                None => warn!("Ignoring unknown price category '{}' in database", row.name),
            }
        }

        let rows = Product::find()
            .filter(product::Column::IsDeleted.eq(false))
            .find_also_related(PriceCategoryEntity)
            .all(db)
            .await?;

        let mut products = Vec::with_capacity(rows.len());
        for (row, category) in rows {
            let category = match category {
                Some(c) => Some(PriceCategory::from_name(&c.name).ok_or_else(|| Error::Config {
                    message: format!(
                        "Product '{}' uses unknown price category '{}'",
                        row.code, c.name
                    ),
                })?),
                None => None,
            };
            let pricing_mode =
                PricingMode::from_name(&row.pricing_mode).ok_or_else(|| Error::Config {
                    message: format!(
                        "Product '{}' has unknown pricing mode '{}'",
                        row.code, row.pricing_mode
                    ),
                })?;
            products.push(CatalogProduct {
                id: row.id,
                code: row.code,
                name: row.name,
                pricing_mode,
                category,
                price: row.price,
            });
        }

        let sort_orders = ProductFormOrder::find()
            .all(db)
            .await?
            .into_iter()
            .map(|o| (o.code, o.sort_order))
            .collect();

        let catalog = Self::from_products(products, category_ids, sort_orders);
        info!(
            "Loaded price catalog with {} product variants in {} form specs.",
            catalog.products.len(),
            catalog.specs.len()
        );
        Ok(catalog)
    }

    /// The ordered activity form specs.
    #[must_use]
    pub fn specs(&self) -> &[ProductSpec] {
        &self.specs
    }

    /// The variant for `code` and `category`, if the catalog has it.
    #[must_use]
    pub fn product(&self, code: &str, category: Option<PriceCategory>) -> Option<&CatalogProduct> {
        self.products.get(&PriceKey::new(code, category))
    }

    /// Resolves a code and a submitted category name to a unit price in Rappen.
    ///
    /// `category` must be empty for category-less products. Unknown codes,
    /// unknown categories and custom-amount products (which have no catalog
    /// price) all yield [`Error::MissingPrice`].
    pub fn unit_price(&self, code: &str, category: &str) -> Result<i64> {
        let missing = || Error::MissingPrice {
            code: code.to_string(),
            category: category.to_string(),
        };

        let category = if category.is_empty() {
            None
        } else {
            Some(PriceCategory::from_name(category).ok_or_else(missing)?)
        };

        self.product(code, category)
            .and_then(|p| p.price)
            .ok_or_else(missing)
    }

    /// Whether `category` is one of the categories offered for `code`.
    #[must_use]
    pub fn is_known_category(&self, code: &str, category: &str) -> bool {
        PriceCategory::from_name(category)
            .is_some_and(|c| self.products.contains_key(&PriceKey::new(code, Some(c))))
    }

    /// Database id of a price category.
    #[must_use]
    pub fn category_id(&self, category: PriceCategory) -> Option<i32> {
        self.category_ids.get(&category).copied()
    }

    /// Display position of a product code.
    #[must_use]
    pub fn sort_order(&self, code: &str) -> Option<i32> {
        self.sort_orders.get(code).copied()
    }

    /// Maps a parsed form product to a storable consumption entry.
    ///
    /// Fixed-price products take their unit price from the catalog; custom
    /// products use the amount entered on the form with a quantity of one.
    ///
    /// # Errors
    /// Returns `Error::MissingPrice` for a code or category the catalog does not
    /// price, and `Error::Validation` on the quantity field when the line total
    /// does not fit an `i64`.
    pub fn resolve(&self, parsed: &ParsedProduct) -> Result<ConsumptionEntry> {
        let category_name = parsed.category.map_or("", PriceCategory::as_str);
        let missing = || Error::MissingPrice {
            code: parsed.code.clone(),
            category: category_name.to_string(),
        };

        let product = self.product(&parsed.code, parsed.category).ok_or_else(missing)?;

        let unit_price = match (product.pricing_mode, parsed.amount) {
            (PricingMode::Custom, Some(amount)) => amount,
            (PricingMode::Fixed, _) => product.price.ok_or_else(missing)?,
            (PricingMode::Custom, None) => return Err(missing()),
        };

        let price_category_id = match parsed.category {
            Some(category) => Some(self.category_id(category).ok_or_else(missing)?),
            None => None,
        };

        let entry = ConsumptionEntry {
            product_id: product.id,
            price_category_id,
            unit_price,
            quantity: parsed.quantity,
        };
        if entry.total().is_none() {
            let mut errors = FieldErrors::new();
            errors.add(quantity_field(&parsed.code), "quantity is too large");
            return Err(Error::Validation(errors));
        }
        Ok(entry)
    }

    /// Returns a copy of the form specs prefilled with an existing day.
    ///
    /// Used by the edit view: quantities (or custom amounts) are filled in and
    /// the recorded category is the checked option. The catalog itself is untouched.
    #[must_use]
    pub fn form_values(&self, day: &ActivityDay) -> Vec<ProductSpec> {
        let mut specs = self.specs.clone();
        for spec in &mut specs {
            for item in day.items.iter().filter(|i| i.code == spec.code) {
                spec.count_or_amount = if spec.is_custom_amount {
                    item.total()
                } else {
                    item.quantity
                };
                if let Some(recorded) = item.price_category.as_deref() {
                    for option in &mut spec.categories {
                        option.checked = option.category.as_str() == recorded;
                    }
                }
            }
        }
        specs
    }
}

/// Orders optional sort positions ascending with missing positions last.
pub(crate) fn compare_sort_order(a: Option<i32>, b: Option<i32>) -> std::cmp::Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    }
}

/// Process-wide handle to the current catalog.
///
/// Readers get a cheap `Arc` clone and keep using it for the whole operation,
/// even if a reload happens meanwhile.
#[derive(Debug, Default)]
pub struct SharedCatalog {
    inner: RwLock<Arc<Catalog>>,
}

impl SharedCatalog {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: RwLock::new(Arc::new(catalog)),
        }
    }

    /// The catalog currently in effect.
    pub async fn current(&self) -> Arc<Catalog> {
        Arc::clone(&*self.inner.read().await)
    }

    /// Swaps in a new catalog.
    pub async fn replace(&self, catalog: Catalog) {
        let mut writer = self.inner.write().await;
        *writer = Arc::new(catalog);
    }

    /// Loads a fresh catalog from the database and swaps it in.
    ///
    /// On a load failure the current catalog stays in effect.
    pub async fn reload<C>(&self, db: &C) -> Result<Arc<Catalog>>
    where
        C: ConnectionTrait,
    {
        let fresh = Arc::new(Catalog::load(db).await?);
        let mut writer = self.inner.write().await;
        *writer = Arc::clone(&fresh);
        info!("Price catalog reloaded.");
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::activity::LineItem;
    use crate::test_utils::*;
    use chrono::NaiveDate;

    fn variant(
        id: i64,
        code: &str,
        category: Option<PriceCategory>,
        price: Option<i64>,
    ) -> CatalogProduct {
        CatalogProduct {
            id,
            code: code.to_string(),
            name: code.to_uppercase(),
            pricing_mode: if price.is_some() {
                PricingMode::Fixed
            } else {
                PricingMode::Custom
            },
            category,
            price,
        }
    }

    fn small_catalog() -> Catalog {
        let products = vec![
            variant(1, "lunch", Some(PriceCategory::Regular), Some(1200)),
            variant(2, "lunch", Some(PriceCategory::Reduced), Some(900)),
            variant(3, "sauna", None, Some(1000)),
            variant(4, "snacks", None, None),
        ];
        let category_ids = HashMap::from([
            (PriceCategory::Regular, 1),
            (PriceCategory::Reduced, 2),
            (PriceCategory::Surplus, 3),
        ]);
        let sort_orders = HashMap::from([("sauna".to_string(), 1), ("lunch".to_string(), 2)]);
        Catalog::from_products(products, category_ids, sort_orders)
    }

    #[test]
    fn test_unit_price_lookup() -> Result<()> {
        let catalog = small_catalog();

        assert_eq!(catalog.unit_price("lunch", "regular")?, 1200);
        assert_eq!(catalog.unit_price("lunch", "reduced")?, 900);
        assert_eq!(catalog.unit_price("sauna", "")?, 1000);
        Ok(())
    }

    #[test]
    fn test_unit_price_missing_is_configuration_error() {
        let catalog = small_catalog();

        // category exists in general but not for lunch
        assert!(matches!(
            catalog.unit_price("lunch", "surplus"),
            Err(Error::MissingPrice { .. })
        ));
        // category-less product asked with a category
        assert!(matches!(
            catalog.unit_price("sauna", "regular"),
            Err(Error::MissingPrice { .. })
        ));
        // categorized product asked without one
        assert!(matches!(
            catalog.unit_price("lunch", ""),
            Err(Error::MissingPrice { .. })
        ));
        assert!(matches!(
            catalog.unit_price("dinner", "regular"),
            Err(Error::MissingPrice { .. })
        ));
        // custom products have no catalog price
        assert!(matches!(
            catalog.unit_price("snacks", ""),
            Err(Error::MissingPrice { .. })
        ));
    }

    #[test]
    fn test_is_known_category() {
        let catalog = small_catalog();

        assert!(catalog.is_known_category("lunch", "regular"));
        assert!(!catalog.is_known_category("lunch", "surplus"));
        assert!(!catalog.is_known_category("lunch", "vip"));
        assert!(!catalog.is_known_category("lunch", ""));
        assert!(!catalog.is_known_category("sauna", "regular"));
    }

    #[test]
    fn test_specs_are_ordered_and_grouped() {
        let catalog = small_catalog();
        let codes: Vec<&str> = catalog.specs().iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["sauna", "lunch", "snacks"]);

        let lunch = &catalog.specs()[1];
        assert!(lunch.has_categories);
        assert!(!lunch.is_custom_amount);
        let options: Vec<(PriceCategory, i64, bool)> = lunch
            .categories
            .iter()
            .map(|o| (o.category, o.price, o.checked))
            .collect();
        assert_eq!(
            options,
            vec![
                (PriceCategory::Reduced, 900, false),
                (PriceCategory::Regular, 1200, true),
            ]
        );

        let snacks = &catalog.specs()[2];
        assert!(snacks.is_custom_amount);
        assert!(!snacks.has_categories);
        assert!(snacks.categories.is_empty());
    }

    #[test]
    fn test_resolve_fixed_and_custom() -> Result<()> {
        let catalog = small_catalog();

        let lunch = catalog.resolve(&ParsedProduct {
            code: "lunch".to_string(),
            category: Some(PriceCategory::Reduced),
            quantity: 2,
            amount: None,
        })?;
        assert_eq!(
            lunch,
            ConsumptionEntry {
                product_id: 2,
                price_category_id: Some(2),
                unit_price: 900,
                quantity: 2,
            }
        );

        let snacks = catalog.resolve(&ParsedProduct {
            code: "snacks".to_string(),
            category: None,
            quantity: 1,
            amount: Some(1235),
        })?;
        assert_eq!(snacks.product_id, 4);
        assert_eq!(snacks.unit_price, 1235);
        assert_eq!(snacks.price_category_id, None);

        let unknown = catalog.resolve(&ParsedProduct {
            code: "lunch".to_string(),
            category: Some(PriceCategory::Surplus),
            quantity: 1,
            amount: None,
        });
        assert!(matches!(unknown, Err(Error::MissingPrice { .. })));
        Ok(())
    }

    #[test]
    fn test_resolve_rejects_overflowing_total() {
        let catalog = small_catalog();

        let result = catalog.resolve(&ParsedProduct {
            code: "lunch".to_string(),
            category: Some(PriceCategory::Regular),
            quantity: i64::MAX,
            amount: None,
        });

        let error = result.unwrap_err();
        assert_eq!(
            error.field_errors().and_then(|e| e.get("activities[lunch][quantity]")),
            Some("quantity is too large")
        );
    }

    #[test]
    fn test_form_values_prefill_without_touching_catalog() {
        let catalog = small_catalog();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let day = ActivityDay {
            date,
            total_price: 1800 + 450,
            items: vec![
                LineItem {
                    product_id: 2,
                    name: "LUNCH".to_string(),
                    code: "lunch".to_string(),
                    unit_price: 900,
                    quantity: 2,
                    price_category: Some("reduced".to_string()),
                    sort_order: Some(2),
                },
                LineItem {
                    product_id: 4,
                    name: "SNACKS".to_string(),
                    code: "snacks".to_string(),
                    unit_price: 450,
                    quantity: 1,
                    price_category: None,
                    sort_order: None,
                },
            ],
            comment: None,
        };

        let specs = catalog.form_values(&day);
        let lunch = specs.iter().find(|s| s.code == "lunch").unwrap();
        assert_eq!(lunch.count_or_amount, 2);
        let checked: Vec<PriceCategory> = lunch
            .categories
            .iter()
            .filter(|o| o.checked)
            .map(|o| o.category)
            .collect();
        assert_eq!(checked, vec![PriceCategory::Reduced]);

        let snacks = specs.iter().find(|s| s.code == "snacks").unwrap();
        assert_eq!(snacks.count_or_amount, 450);

        // shared specs keep their defaults
        let shared = catalog.specs().iter().find(|s| s.code == "lunch").unwrap();
        assert_eq!(shared.count_or_amount, 0);
        assert!(
            shared
                .categories
                .iter()
                .any(|o| o.category == PriceCategory::Regular && o.checked)
        );
    }

    #[tokio::test]
    async fn test_load_from_seeded_database() -> Result<()> {
        let db = setup_test_db().await?;
        seed_test_catalog(&db).await?;

        let catalog = Catalog::load(&db).await?;
        assert_eq!(catalog.unit_price("lunch", "regular")?, 1200);
        assert_eq!(catalog.unit_price("lunch", "surplus")?, 1500);
        assert_eq!(catalog.unit_price("sauna", "")?, 1000);
        assert!(catalog.product("snacks", None).is_some());
        assert!(catalog.category_id(PriceCategory::Reduced).is_some());
        assert_eq!(catalog.sort_order("breakfast"), Some(1));
        assert_eq!(catalog.sort_order("coffee"), None);

        let codes: Vec<&str> = catalog.specs().iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["breakfast", "lunch", "sauna", "snacks", "coffee"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_skips_deleted_products() -> Result<()> {
        use sea_orm::{ActiveModelTrait, Set};

        let db = setup_test_db().await?;
        seed_test_catalog(&db).await?;

        let sauna = Product::find()
            .filter(product::Column::Code.eq("sauna"))
            .one(&db)
            .await?
            .unwrap();
        let mut active: product::ActiveModel = sauna.into();
        active.is_deleted = Set(true);
        active.update(&db).await?;

        let catalog = Catalog::load(&db).await?;
        assert!(catalog.product("sauna", None).is_none());
        assert!(catalog.specs().iter().all(|s| s.code != "sauna"));
        Ok(())
    }

    #[tokio::test]
    async fn test_shared_catalog_reload_swaps_whole_value() -> Result<()> {
        let db = setup_test_db().await?;
        let shared = SharedCatalog::new(Catalog::default());

        let before = shared.current().await;
        assert!(before.specs().is_empty());

        seed_test_catalog(&db).await?;
        let reloaded = shared.reload(&db).await?;

        // handles taken before the reload keep the old catalog
        assert!(before.specs().is_empty());
        assert!(!reloaded.specs().is_empty());
        assert_eq!(shared.current().await.unit_price("lunch", "regular")?, 1200);
        Ok(())
    }
}
