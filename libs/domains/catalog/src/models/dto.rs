use chrono::{DateTime, Utc};
use domain_kernel::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};
use validator::Validate;

use super::{Category, Product, ProductImage};

/// Display name for products without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

const DEFAULT_PAGE_SIZE: u32 = 10;

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

// ===== Categories =====

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_category_id: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryFilter {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub search_term: Option<String>,
    #[serde(default)]
    pub include_product_count: bool,
}

impl Default for CategoryFilter {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            is_active: None,
            search_term: None,
            include_product_count: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDto {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub parent_category_id: Option<i32>,
    pub product_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CategoryDto {
    pub fn new(category: &Category, product_count: u64) -> Self {
        Self {
            id: category.id.unwrap_or_default(),
            name: category.name.to_string(),
            description: category.description.to_string(),
            is_active: category.is_active,
            parent_category_id: category.parent_id,
            product_count,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub id: i32,
    pub name: String,
    pub is_active: bool,
    pub product_count: u64,
}

impl CategorySummary {
    pub fn new(category: &Category, product_count: u64) -> Self {
        Self {
            id: category.id.unwrap_or_default(),
            name: category.name.to_string(),
            is_active: category.is_active,
            product_count,
        }
    }
}

// ===== Products =====

/// File uploaded together with a new product
#[derive(Clone, Deserialize, Validate)]
pub struct ImageUpload {
    #[validate(length(min = 1, max = 255, message = "File name must be 1-255 characters"))]
    pub file_name: String,
    #[validate(length(min = 1, message = "Image file is empty"))]
    pub bytes: Vec<u8>,
    #[serde(default)]
    pub alt: String,
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .field("alt", &self.alt)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProduct {
    pub sku: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub currency: String,
    #[serde(default)]
    pub category_id: Option<i32>,
    #[serde(default)]
    #[validate(nested)]
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub currency: String,
    #[serde(default)]
    pub category_id: Option<i32>,
    pub is_active: bool,
}

/// Whitelisted sort columns. Parsing ignores case; anything else sorts by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProductSortField {
    #[default]
    Name,
    Price,
    Sku,
    CreatedAt,
}

impl ProductSortField {
    pub fn from_request(sort_by: Option<&str>) -> Self {
        sort_by
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or_default()
    }
}

/// Ordering applied to a product page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductOrder {
    By {
        field: ProductSortField,
        descending: bool,
    },
    /// Exact name match first, then name prefix, then by name.
    /// The term is lower-case.
    Relevance(String),
}

impl Default for ProductOrder {
    fn default() -> Self {
        ProductOrder::By {
            field: ProductSortField::Name,
            descending: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductFilter {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub category_id: Option<i32>,
    #[serde(default)]
    pub search_term: Option<String>,
    #[serde(default)]
    pub min_price: Option<Decimal>,
    #[serde(default)]
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub descending: bool,
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            is_active: None,
            category_id: None,
            search_term: None,
            min_price: None,
            max_price: None,
            sort_by: None,
            descending: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDto {
    pub id: i32,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub currency: String,
    pub category_id: Option<i32>,
    pub category_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub images: Vec<ProductImageDto>,
}

impl ProductDto {
    pub fn new(
        product: &Product,
        category_name: Option<&str>,
        images: &[ProductImage],
    ) -> Self {
        Self {
            id: product.id.unwrap_or_default(),
            sku: product.sku.to_string(),
            name: product.name.to_string(),
            description: product.description.to_string(),
            price: product.price.amount(),
            currency: product.price.currency().to_string(),
            category_id: product.category_id,
            category_name: category_name.unwrap_or(UNCATEGORIZED).to_string(),
            is_active: product.is_active,
            created_at: product.created_at,
            updated_at: product.updated_at,
            images: images.iter().map(ProductImageDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub id: i32,
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub currency: String,
    pub category_name: String,
    pub is_active: bool,
}

impl ProductSummary {
    pub fn new(product: &Product, category_name: Option<&str>) -> Self {
        Self {
            id: product.id.unwrap_or_default(),
            sku: product.sku.to_string(),
            name: product.name.to_string(),
            price: product.price.amount(),
            currency: product.price.currency().to_string(),
            category_name: category_name.unwrap_or(UNCATEGORIZED).to_string(),
            is_active: product.is_active,
        }
    }
}

// ===== Images =====

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddProductImage {
    pub product_id: i32,
    #[validate(length(max = 2048, message = "URL is too long"))]
    pub url: String,
    pub alt: String,
    #[validate(range(min = 0, message = "Order cannot be negative"))]
    pub order: i32,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProductImage {
    #[validate(length(max = 2048, message = "URL is too long"))]
    pub url: String,
    pub alt: String,
    #[validate(range(min = 0, message = "Order cannot be negative"))]
    pub order: i32,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductImageDto {
    pub id: i32,
    pub product_id: i32,
    pub url: String,
    pub alt: String,
    pub order: i32,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&ProductImage> for ProductImageDto {
    fn from(image: &ProductImage) -> Self {
        Self {
            id: image.id.unwrap_or_default(),
            product_id: image.product_id,
            url: image.url.to_string(),
            alt: image.alt.to_string(),
            order: image.order,
            is_primary: image.is_primary,
            created_at: image.created_at,
            updated_at: image.updated_at,
        }
    }
}
