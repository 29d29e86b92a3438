//! Product form order entity - Display position of a product code.
//!
//! Controls the order of products on the activity form and of line items in
//! activity overviews. Codes without an entry are shown last.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_form_order")]
pub struct Model {
    /// Product code this position applies to
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,
    /// Ascending display position
    pub sort_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
