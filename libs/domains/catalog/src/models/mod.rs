//! Catalog aggregates and the request/response types of the services.

mod category;
mod dto;
mod image;
mod product;

pub use category::Category;
pub use dto::*;
pub use image::{ImageOrder, ProductImage, ProductImages};
pub use product::Product;

/// Shared identity equality: persisted entities are equal when their ids are,
/// unsaved ones never are.
pub(crate) fn same_identity(a: Option<i32>, b: Option<i32>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}
