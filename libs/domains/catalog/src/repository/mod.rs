//! Persistence contracts for the catalog and their in-memory implementation.

mod memory;

pub use memory::{
    InMemoryCatalogUnitOfWork, InMemoryCategoryRepository, InMemoryProductImageRepository,
    InMemoryProductRepository,
};

use async_trait::async_trait;
use domain_kernel::{Decimal, Name, PageRequest, Sku};
use std::collections::HashMap;

use crate::error::CatalogResult;
use crate::models::{Category, Product, ProductImage, ProductOrder};

/// Category listing criteria. `search_term` is lower-case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryQuery {
    pub is_active: Option<bool>,
    pub search_term: Option<String>,
}

/// Product listing criteria. `search_term` is lower-case and matched against
/// name, description and SKU.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    pub is_active: Option<bool>,
    pub category_id: Option<i32>,
    pub search_term: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

/// Trimmed, lower-cased search term; `None` when blank.
pub fn normalize_term(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// Repository trait for Category persistence
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> CatalogResult<Option<Category>>;

    async fn get_by_ids(&self, ids: &[i32]) -> CatalogResult<Vec<Category>>;

    /// Case-insensitive, ignoring the category `exclude_id`
    async fn name_exists(&self, name: &Name, exclude_id: Option<i32>) -> CatalogResult<bool>;

    async fn has_children(&self, id: i32) -> CatalogResult<bool>;

    /// Active categories ordered by name
    async fn list_active(&self) -> CatalogResult<Vec<Category>>;

    async fn count(&self, query: &CategoryQuery) -> CatalogResult<u64>;

    /// One page ordered by name
    async fn list_page(
        &self,
        query: &CategoryQuery,
        page: &PageRequest,
    ) -> CatalogResult<Vec<Category>>;

    async fn add(&self, category: Category) -> CatalogResult<Category>;

    async fn update(&self, category: Category) -> CatalogResult<Category>;

    async fn remove(&self, id: i32) -> CatalogResult<bool>;
}

/// Repository trait for Product persistence
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> CatalogResult<Option<Product>>;

    async fn sku_exists(&self, sku: &Sku) -> CatalogResult<bool>;

    async fn count_by_category(&self, category_id: i32) -> CatalogResult<u64>;

    /// Product counts per category in one query; categories without products are absent
    async fn count_by_categories(&self, category_ids: &[i32]) -> CatalogResult<HashMap<i32, u64>>;

    async fn count(&self, query: &ProductQuery) -> CatalogResult<u64>;

    /// One page in the given order; ties break on id
    async fn list_page(
        &self,
        query: &ProductQuery,
        order: &ProductOrder,
        page: &PageRequest,
    ) -> CatalogResult<Vec<Product>>;

    async fn add(&self, product: Product) -> CatalogResult<Product>;

    async fn update(&self, product: Product) -> CatalogResult<Product>;

    /// Delete the product and all of its images atomically
    async fn remove_with_images(&self, id: i32) -> CatalogResult<bool>;
}

/// Repository trait for ProductImage persistence
#[async_trait]
pub trait ProductImageRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> CatalogResult<Option<ProductImage>>;

    /// Ordered by order, then id
    async fn list_by_product(&self, product_id: i32) -> CatalogResult<Vec<ProductImage>>;

    async fn order_taken(
        &self,
        product_id: i32,
        order: i32,
        exclude_id: Option<i32>,
    ) -> CatalogResult<bool>;

    /// Insert; a primary image demotes the product's other images in the same transaction
    async fn add(&self, image: ProductImage) -> CatalogResult<ProductImage>;

    /// Write `image`; a primary image demotes the product's other images in
    /// the same transaction
    async fn update(&self, image: ProductImage) -> CatalogResult<ProductImage>;

    /// Demote current primaries and promote `image_id` atomically
    async fn set_primary(&self, product_id: i32, image_id: i32) -> CatalogResult<ProductImage>;

    /// Write a batch of `(image_id, order)` atomically
    async fn apply_orders(&self, product_id: i32, orders: &[(i32, i32)]) -> CatalogResult<()>;

    async fn remove(&self, id: i32) -> CatalogResult<bool>;
}

/// Typed access to the catalog repositories
pub trait CatalogUnitOfWork: Send + Sync {
    type Categories: CategoryRepository;
    type Products: ProductRepository;
    type Images: ProductImageRepository;

    fn categories(&self) -> &Self::Categories;
    fn products(&self) -> &Self::Products;
    fn images(&self) -> &Self::Images;
}
