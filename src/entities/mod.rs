//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod comment;
pub mod consumption;
pub mod invoice;
pub mod price_category;
pub mod product;
pub mod product_form_order;
pub mod user;

// Re-export specific types to avoid conflicts
pub use comment::{Column as CommentColumn, Entity as Comment, Model as CommentModel};
pub use consumption::{
    Column as ConsumptionColumn, Entity as Consumption, Model as ConsumptionModel,
};
pub use invoice::{Column as InvoiceColumn, Entity as Invoice, Model as InvoiceModel};
pub use price_category::{
    Column as PriceCategoryColumn, Entity as PriceCategory, Model as PriceCategoryModel,
};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use product_form_order::{
    Column as ProductFormOrderColumn, Entity as ProductFormOrder, Model as ProductFormOrderModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
