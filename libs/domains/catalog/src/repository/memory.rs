use async_trait::async_trait;
use domain_kernel::{Name, PageRequest, Sku};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{
    CatalogUnitOfWork, CategoryQuery, CategoryRepository, ProductImageRepository, ProductQuery,
    ProductRepository,
};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    Category, Product, ProductImage, ProductImages, ProductOrder, ProductSortField,
};

#[derive(Debug, Default)]
struct Tables {
    categories: BTreeMap<i32, Category>,
    products: BTreeMap<i32, Product>,
    images: BTreeMap<i32, ProductImage>,
    last_category_id: i32,
    last_product_id: i32,
    last_image_id: i32,
}

impl Tables {
    fn products_in_category(&self, category_id: i32) -> u64 {
        self.products
            .values()
            .filter(|p| p.category_id == Some(category_id))
            .count() as u64
    }

    fn images_of(&self, product_id: i32) -> Vec<ProductImage> {
        self.images
            .values()
            .filter(|i| i.product_id == product_id)
            .cloned()
            .collect()
    }

    fn check_category_row(&self, category: &Category) -> CatalogResult<()> {
        if self
            .categories
            .values()
            .any(|c| c.id != category.id && c.name == category.name)
        {
            return Err(CatalogError::DuplicateCategoryName(category.name.to_string()));
        }
        match category.parent_id {
            Some(parent) if !self.categories.contains_key(&parent) => {
                Err(CatalogError::CategoryNotFound(parent))
            }
            _ => Ok(()),
        }
    }

    fn check_product_row(&self, product: &Product) -> CatalogResult<()> {
        if self
            .products
            .values()
            .any(|p| p.id != product.id && p.sku == product.sku)
        {
            return Err(CatalogError::DuplicateSku(product.sku.to_string()));
        }
        match product.category_id {
            Some(category) if !self.categories.contains_key(&category) => {
                Err(CatalogError::CategoryNotFound(category))
            }
            _ => Ok(()),
        }
    }

    fn check_image_position(&self, image: &ProductImage) -> CatalogResult<()> {
        if !self.products.contains_key(&image.product_id) {
            return Err(CatalogError::ProductNotFound(image.product_id));
        }
        if self.images.values().any(|i| {
            i.product_id == image.product_id && i.id != image.id && i.order == image.order
        }) {
            return Err(CatalogError::OrderTaken {
                product_id: image.product_id,
                order: image.order,
            });
        }
        Ok(())
    }

    fn store_images(&mut self, images: impl IntoIterator<Item = ProductImage>) {
        for image in images {
            if let Some(id) = image.id {
                self.images.insert(id, image);
            }
        }
    }
}

fn category_matches(category: &Category, query: &CategoryQuery) -> bool {
    query.is_active.is_none_or(|active| category.is_active == active)
        && query
            .search_term
            .as_deref()
            .is_none_or(|term| category.name.as_str().to_lowercase().contains(term))
}

fn product_matches(product: &Product, query: &ProductQuery) -> bool {
    let amount = product.price.amount();
    query.is_active.is_none_or(|active| product.is_active == active)
        && query
            .category_id
            .is_none_or(|id| product.category_id == Some(id))
        && query.search_term.as_deref().is_none_or(|term| {
            product.name.as_str().to_lowercase().contains(term)
                || product.description.folded().contains(term)
                || product.sku.as_str().to_lowercase().contains(term)
        })
        && query.min_price.is_none_or(|min| amount >= min)
        && query.max_price.is_none_or(|max| amount <= max)
}

fn relevance(product: &Product, term: &str) -> u8 {
    let name = product.name.as_str().to_lowercase();
    if name == term {
        0
    } else if name.starts_with(term) {
        1
    } else {
        2
    }
}

fn compare_products(a: &Product, b: &Product, order: &ProductOrder) -> Ordering {
    let primary = match order {
        ProductOrder::By { field, descending } => {
            let ordering = match field {
                ProductSortField::Name => a.name.as_str().cmp(b.name.as_str()),
                ProductSortField::Price => a.price.amount().cmp(&b.price.amount()),
                ProductSortField::Sku => a.sku.as_str().cmp(b.sku.as_str()),
                ProductSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            };
            if *descending {
                ordering.reverse()
            } else {
                ordering
            }
        }
        ProductOrder::Relevance(term) => relevance(a, term)
            .cmp(&relevance(b, term))
            .then_with(|| a.name.as_str().cmp(b.name.as_str())),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

fn page_of<T>(items: Vec<T>, page: &PageRequest) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

/// In-memory unit of work (for development/testing).
///
/// Enforces the same constraints as the PostgreSQL schema: unique category
/// names and SKUs, existing foreign keys, no category removal while products
/// or subcategories reference it, unique image order per product and a single
/// primary image per product.
#[derive(Debug, Clone)]
pub struct InMemoryCatalogUnitOfWork {
    categories: InMemoryCategoryRepository,
    products: InMemoryProductRepository,
    images: InMemoryProductImageRepository,
}

impl InMemoryCatalogUnitOfWork {
    pub fn new() -> Self {
        let tables = Arc::new(RwLock::new(Tables::default()));
        Self {
            categories: InMemoryCategoryRepository {
                tables: tables.clone(),
            },
            products: InMemoryProductRepository {
                tables: tables.clone(),
            },
            images: InMemoryProductImageRepository { tables },
        }
    }
}

impl Default for InMemoryCatalogUnitOfWork {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogUnitOfWork for InMemoryCatalogUnitOfWork {
    type Categories = InMemoryCategoryRepository;
    type Products = InMemoryProductRepository;
    type Images = InMemoryProductImageRepository;

    fn categories(&self) -> &Self::Categories {
        &self.categories
    }

    fn products(&self) -> &Self::Products {
        &self.products
    }

    fn images(&self) -> &Self::Images {
        &self.images
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryCategoryRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn get_by_id(&self, id: i32) -> CatalogResult<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn get_by_ids(&self, ids: &[i32]) -> CatalogResult<Vec<Category>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .filter_map(|id| tables.categories.get(id).cloned())
            .collect())
    }

    async fn name_exists(&self, name: &Name, exclude_id: Option<i32>) -> CatalogResult<bool> {
        let wanted = name.as_str().to_lowercase();
        Ok(self.tables.read().await.categories.values().any(|c| {
            c.id != exclude_id && c.name.as_str().to_lowercase() == wanted
        }))
    }

    async fn has_children(&self, id: i32) -> CatalogResult<bool> {
        Ok(self
            .tables
            .read()
            .await
            .categories
            .values()
            .any(|c| c.parent_id == Some(id)))
    }

    async fn list_active(&self) -> CatalogResult<Vec<Category>> {
        let mut active: Vec<Category> = self
            .tables
            .read()
            .await
            .categories
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()).then(a.id.cmp(&b.id)));
        Ok(active)
    }

    async fn count(&self, query: &CategoryQuery) -> CatalogResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .values()
            .filter(|c| category_matches(c, query))
            .count() as u64)
    }

    async fn list_page(
        &self,
        query: &CategoryQuery,
        page: &PageRequest,
    ) -> CatalogResult<Vec<Category>> {
        let mut matching: Vec<Category> = self
            .tables
            .read()
            .await
            .categories
            .values()
            .filter(|c| category_matches(c, query))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()).then(a.id.cmp(&b.id)));
        Ok(page_of(matching, page))
    }

    async fn add(&self, mut category: Category) -> CatalogResult<Category> {
        let mut tables = self.tables.write().await;
        tables.check_category_row(&category)?;

        tables.last_category_id += 1;
        let id = tables.last_category_id;
        category.id = Some(id);
        tables.categories.insert(id, category.clone());

        tracing::info!(category_id = id, "Created category");
        Ok(category)
    }

    async fn update(&self, category: Category) -> CatalogResult<Category> {
        let id = category
            .id
            .ok_or_else(|| CatalogError::Internal("Category has no id".to_string()))?;
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&id) {
            return Err(CatalogError::CategoryNotFound(id));
        }
        tables.check_category_row(&category)?;
        tables.categories.insert(id, category.clone());

        tracing::info!(category_id = id, "Updated category");
        Ok(category)
    }

    async fn remove(&self, id: i32) -> CatalogResult<bool> {
        let mut tables = self.tables.write().await;
        let products = tables.products_in_category(id);
        if products > 0 {
            return Err(CatalogError::CategoryHasProducts {
                category_id: id,
                products,
            });
        }
        if tables.categories.values().any(|c| c.parent_id == Some(id)) {
            return Err(CatalogError::CategoryHasSubcategories(id));
        }

        let removed = tables.categories.remove(&id).is_some();
        if removed {
            tracing::info!(category_id = id, "Deleted category");
        }
        Ok(removed)
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryProductRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn get_by_id(&self, id: i32) -> CatalogResult<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn sku_exists(&self, sku: &Sku) -> CatalogResult<bool> {
        Ok(self
            .tables
            .read()
            .await
            .products
            .values()
            .any(|p| &p.sku == sku))
    }

    async fn count_by_category(&self, category_id: i32) -> CatalogResult<u64> {
        Ok(self.tables.read().await.products_in_category(category_id))
    }

    async fn count_by_categories(&self, category_ids: &[i32]) -> CatalogResult<HashMap<i32, u64>> {
        let tables = self.tables.read().await;
        let mut counts = HashMap::new();
        for product in tables.products.values() {
            match product.category_id {
                Some(category_id) if category_ids.contains(&category_id) => {
                    *counts.entry(category_id).or_insert(0) += 1;
                }
                _ => {}
            }
        }
        Ok(counts)
    }

    async fn count(&self, query: &ProductQuery) -> CatalogResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .values()
            .filter(|p| product_matches(p, query))
            .count() as u64)
    }

    async fn list_page(
        &self,
        query: &ProductQuery,
        order: &ProductOrder,
        page: &PageRequest,
    ) -> CatalogResult<Vec<Product>> {
        let mut matching: Vec<Product> = self
            .tables
            .read()
            .await
            .products
            .values()
            .filter(|p| product_matches(p, query))
            .cloned()
            .collect();
        matching.sort_by(|a, b| compare_products(a, b, order));
        Ok(page_of(matching, page))
    }

    async fn add(&self, mut product: Product) -> CatalogResult<Product> {
        let mut tables = self.tables.write().await;
        tables.check_product_row(&product)?;

        tables.last_product_id += 1;
        let id = tables.last_product_id;
        product.id = Some(id);
        tables.products.insert(id, product.clone());

        tracing::info!(product_id = id, sku = %product.sku, "Created product");
        Ok(product)
    }

    async fn update(&self, product: Product) -> CatalogResult<Product> {
        let id = product
            .id
            .ok_or_else(|| CatalogError::Internal("Product has no id".to_string()))?;
        let mut tables = self.tables.write().await;
        if !tables.products.contains_key(&id) {
            return Err(CatalogError::ProductNotFound(id));
        }
        tables.check_product_row(&product)?;
        tables.products.insert(id, product.clone());

        tracing::info!(product_id = id, "Updated product");
        Ok(product)
    }

    async fn remove_with_images(&self, id: i32) -> CatalogResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.products.remove(&id).is_none() {
            return Ok(false);
        }
        let before = tables.images.len();
        tables.images.retain(|_, i| i.product_id != id);
        let images = before - tables.images.len();

        tracing::info!(product_id = id, images, "Deleted product");
        Ok(true)
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryProductImageRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl ProductImageRepository for InMemoryProductImageRepository {
    async fn get_by_id(&self, id: i32) -> CatalogResult<Option<ProductImage>> {
        Ok(self.tables.read().await.images.get(&id).cloned())
    }

    async fn list_by_product(&self, product_id: i32) -> CatalogResult<Vec<ProductImage>> {
        let images = self.tables.read().await.images_of(product_id);
        Ok(ProductImages::new(product_id, images).into_images())
    }

    async fn order_taken(
        &self,
        product_id: i32,
        order: i32,
        exclude_id: Option<i32>,
    ) -> CatalogResult<bool> {
        Ok(self.tables.read().await.images.values().any(|i| {
            i.product_id == product_id && i.order == order && i.id != exclude_id
        }))
    }

    async fn add(&self, mut image: ProductImage) -> CatalogResult<ProductImage> {
        let mut tables = self.tables.write().await;
        tables.check_image_position(&image)?;

        if image.is_primary {
            let demoted =
                ProductImages::new(image.product_id, tables.images_of(image.product_id))
                    .demote_all();
            tables.store_images(demoted);
        }

        tables.last_image_id += 1;
        let id = tables.last_image_id;
        image.id = Some(id);
        tables.images.insert(id, image.clone());

        tracing::info!(image_id = id, product_id = image.product_id, "Created product image");
        Ok(image)
    }

    async fn update(&self, image: ProductImage) -> CatalogResult<ProductImage> {
        let id = image
            .id
            .ok_or_else(|| CatalogError::Internal("Image has no id".to_string()))?;
        let mut tables = self.tables.write().await;
        if !tables.images.contains_key(&id) {
            return Err(CatalogError::ImageNotFound(id));
        }
        tables.check_image_position(&image)?;

        let mut demoted = 0;
        if image.is_primary {
            let others: Vec<ProductImage> = tables
                .images_of(image.product_id)
                .into_iter()
                .filter(|i| i.id != Some(id))
                .collect();
            let others = ProductImages::new(image.product_id, others).demote_all();
            demoted = others.len();
            tables.store_images(others);
        }
        tables.images.insert(id, image.clone());

        tracing::info!(image_id = id, demoted, "Updated product image");
        Ok(image)
    }

    async fn set_primary(&self, product_id: i32, image_id: i32) -> CatalogResult<ProductImage> {
        let mut tables = self.tables.write().await;
        let mut images = ProductImages::new(product_id, tables.images_of(product_id));
        let changed = images.set_primary(image_id)?;
        tables.store_images(changed);

        tracing::info!(product_id, image_id, "Set primary image");
        tables
            .images
            .get(&image_id)
            .cloned()
            .ok_or(CatalogError::ImageNotFound(image_id))
    }

    async fn apply_orders(&self, product_id: i32, orders: &[(i32, i32)]) -> CatalogResult<()> {
        let mut tables = self.tables.write().await;
        let mut images: BTreeMap<i32, ProductImage> = tables
            .images_of(product_id)
            .into_iter()
            .filter_map(|i| i.id.map(|id| (id, i)))
            .collect();

        for &(image_id, order) in orders {
            images
                .get_mut(&image_id)
                .ok_or(CatalogError::ImageNotFound(image_id))?
                .move_to(order);
        }

        let mut used = HashSet::new();
        if let Some(clash) = images.values().find(|i| !used.insert(i.order)) {
            return Err(CatalogError::OrderTaken {
                product_id,
                order: clash.order,
            });
        }

        tables.store_images(images.into_values());
        tracing::info!(product_id, moved = orders.len(), "Reordered product images");
        Ok(())
    }

    async fn remove(&self, id: i32) -> CatalogResult<bool> {
        let removed = self.tables.write().await.images.remove(&id).is_some();
        if removed {
            tracing::info!(image_id = id, "Deleted product image");
        }
        Ok(removed)
    }
}
