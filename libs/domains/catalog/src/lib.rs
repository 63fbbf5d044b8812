//! Catalog Domain
//!
//! Categories, products and product images, with uploads handed to an
//! [`ImageStore`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ CategoryService / ProductService /      │  ← Business rules, validation order
//! │ ProductImageService                     │
//! └──────┬──────────────────────┬───────────┘
//!        │                      │
//! ┌──────▼──────────────┐ ┌─────▼──────┐
//! │ CatalogUnitOfWork   │ │ ImageStore │  ← Collaborators
//! │ categories/products │ └────────────┘
//! │ /images             │
//! └──────┬──────────────┘
//!        │
//! ┌──────▼──────────────────────────────┐
//! │ Models                              │  ← Category, Product, ProductImages
//! └─────────────────────────────────────┘
//! ```
//!
//! Writes that touch several images (primary demotion, reordering, removing
//! a product with its images) are single repository calls, so PostgreSQL runs
//! each inside one transaction and the in-memory store under one write lock.
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::ImageStorageConfig;
//! use domain_catalog::{CategoryService, InMemoryCatalogUnitOfWork, LocalImageStore, ProductService};
//!
//! let uow = InMemoryCatalogUnitOfWork::new();
//! let categories = CategoryService::new(uow.clone());
//! let store = LocalImageStore::new(ImageStorageConfig::new("./images", "http://localhost:8080/images/"));
//! let products = ProductService::new(uow, store);
//! ```

pub mod entity;
pub mod error;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod storage;

pub use error::{CatalogError, CatalogResult};
pub use models::{
    AddProductImage, Category, CategoryDto, CategoryFilter, CategorySummary, CreateCategory,
    CreateProduct, ImageOrder, ImageUpload, Product, ProductDto, ProductFilter, ProductImage,
    ProductImageDto, ProductImages, ProductOrder, ProductSortField, ProductSummary,
    UpdateCategory, UpdateProduct, UpdateProductImage, UNCATEGORIZED,
};
pub use postgres::PgCatalogUnitOfWork;
pub use repository::{
    CatalogUnitOfWork, CategoryQuery, CategoryRepository, InMemoryCatalogUnitOfWork,
    ProductImageRepository, ProductQuery, ProductRepository,
};
pub use service::{CategoryService, ProductImageService, ProductService};
pub use storage::{ImageStore, LocalImageStore};
