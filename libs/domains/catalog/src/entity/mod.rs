//! Sea-ORM entities for the `categories`, `products` and `product_images` tables.

pub mod category;
pub mod product;
pub mod product_image;

use sea_orm::ActiveValue::{self, NotSet, Set};

use crate::error::CatalogError;

pub(crate) fn id_value(id: Option<i32>) -> ActiveValue<i32> {
    match id {
        Some(id) => Set(id),
        None => NotSet,
    }
}

pub(crate) fn corrupt_row(table: &str, id: i32, reason: impl std::fmt::Display) -> CatalogError {
    CatalogError::Internal(format!("Stored {} row {} is invalid: {}", table, id, reason))
}
