//! Consumption entity - One priced line a member logged for a day.
//!
//! `unit_price` is a snapshot taken when the row is written, so later catalog
//! price changes never alter historical totals. `total_price` is always
//! `quantity * unit_price`.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Consumption database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "consumptions")]
pub struct Model {
    /// Unique identifier for the consumption
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Member who consumed
    pub user_id: i64,
    /// Product variant consumed
    pub product_id: i64,
    /// Price category the member chose, None for category-less products
    pub price_category_id: Option<i32>,
    /// Calendar day of the consumption
    pub date: Date,
    /// Unit price in Rappen at the time of recording
    pub unit_price: i64,
    /// Number of units, always positive
    pub quantity: i64,
    /// `quantity * unit_price` in Rappen
    pub total_price: i64,
    /// When the row was written
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Consumption and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each consumption belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// Each consumption references one product variant
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// Optional price category of the consumption
    #[sea_orm(
        belongs_to = "super::price_category::Entity",
        from = "Column::PriceCategoryId",
        to = "super::price_category::Column::Id"
    )]
    PriceCategory,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::price_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PriceCategory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
