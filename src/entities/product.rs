//! Product entity - One priced variant of something a member can consume.
//!
//! A product row is identified by its code plus an optional price category, so
//! `lunch` exists once per category (regular, reduced, surplus) while `sauna`
//! or `snacks` exist once with no category. Custom-amount products carry no
//! price; the member enters the amount when logging the day.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Lunch", "Sauna")
    pub name: String,
    /// Form code shared by all category variants (e.g., `"lunch"`)
    pub code: String,
    /// `"fixed"` for catalog-priced products, `"custom"` for user-entered amounts
    pub pricing_mode: String,
    /// Price category of this variant, None for category-less products
    pub price_category_id: Option<i32>,
    /// Unit price in Rappen, None for custom-amount products
    pub price: Option<i64>,
    /// Soft delete flag - hidden from the catalog, kept for history
    pub is_deleted: bool,
    /// When the product was created
    pub created_at: DateTime,
    /// When the product was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product variant may belong to one price category
    #[sea_orm(
        belongs_to = "super::price_category::Entity",
        from = "Column::PriceCategoryId",
        to = "super::price_category::Column::Id"
    )]
    PriceCategory,
    /// One product has many consumptions
    #[sea_orm(has_many = "super::consumption::Entity")]
    Consumptions,
}

impl Related<super::price_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PriceCategory.def()
    }
}

impl Related<super::consumption::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Consumptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
