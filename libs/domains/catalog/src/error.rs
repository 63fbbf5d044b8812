use domain_kernel::{ErrorKind, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Category {0} not found")]
    CategoryNotFound(i32),

    #[error("Product {0} not found")]
    ProductNotFound(i32),

    #[error("Image {0} not found")]
    ImageNotFound(i32),

    #[error("A category named '{0}' already exists")]
    DuplicateCategoryName(String),

    #[error("A product with SKU '{0}' already exists")]
    DuplicateSku(String),

    #[error("Category {0} is inactive")]
    InactiveCategory(i32),

    #[error("Category {category_id} cannot be deleted because it has {products} associated product(s)")]
    CategoryHasProducts { category_id: i32, products: u64 },

    #[error("Category {0} cannot be deleted because it has subcategories")]
    CategoryHasSubcategories(i32),

    #[error("Another image of product {product_id} already uses order {order}")]
    OrderTaken { product_id: i32, order: i32 },

    #[error("Image storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Validation(_) => ErrorKind::Validation,
            CatalogError::CategoryNotFound(_)
            | CatalogError::ProductNotFound(_)
            | CatalogError::ImageNotFound(_) => ErrorKind::NotFound,
            CatalogError::DuplicateCategoryName(_)
            | CatalogError::DuplicateSku(_)
            | CatalogError::InactiveCategory(_)
            | CatalogError::CategoryHasProducts { .. }
            | CatalogError::CategoryHasSubcategories(_)
            | CatalogError::OrderTaken { .. } => ErrorKind::Conflict,
            CatalogError::Storage(_) | CatalogError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        CatalogError::Validation(ValidationError::new(field, message))
    }
}

impl From<sea_orm::DbErr> for CatalogError {
    fn from(err: sea_orm::DbErr) -> Self {
        CatalogError::Internal(format!("Database error: {}", err))
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Storage(err.to_string())
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
