//! Price category entity - Named pricing tiers (regular, reduced, surplus).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Price category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "price_categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Category name as submitted by the activity form, e.g. `"regular"`
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
