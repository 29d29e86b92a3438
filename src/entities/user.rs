//! User entity - Members who log activities and receive invoices.
//!
//! Members sign in either with a password, stored as a bcrypt hash, or through
//! an external OpenID Connect provider, in which case no hash is kept.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login email address, unique across users
    #[sea_orm(unique)]
    pub email: String,
    /// First name, used in payment references
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Whether the user may see the admin overview
    pub is_admin: bool,
    /// Login method, `"password"` or `"openidconnect"`
    pub method: String,
    /// bcrypt hash, only set for password logins
    #[serde(skip_serializing, default)]
    pub hashed_password: Option<String>,
    /// When the user signed up
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many consumptions
    #[sea_orm(has_many = "super::consumption::Entity")]
    Consumptions,
    /// One user has many day comments
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
    /// One user has many monthly invoices
    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoices,
}

impl Related<super::consumption::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Consumptions.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
