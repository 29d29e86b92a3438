//! Invoice entity - Monthly bill per member, written by the billing batch.
//!
//! This crate only reads invoices. Subtotals are in Rappen and `state` is
//! either `"unpaid"` or `"paid"`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    /// Unique identifier for the invoice
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Member the invoice is addressed to
    pub user_id: i64,
    /// First day of the billed month
    pub period: Date,
    /// Grand total in Rappen
    pub total_price: i64,
    /// Meals subtotal
    pub total_eating: i64,
    /// Coffee subtotal
    pub total_coffee: i64,
    /// Lecture subtotal
    pub total_lecture: i64,
    /// Sauna subtotal
    pub total_sauna: i64,
    /// Kiosk (snacks) subtotal
    pub total_kiosk: i64,
    /// `"unpaid"` or `"paid"`
    pub state: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each invoice belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
