use async_trait::async_trait;
use chrono::Utc;
use database::postgres::{is_foreign_key_violation, is_unique_violation};
use domain_kernel::{Name, PageRequest, Sku};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Order};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    TransactionTrait,
};
use std::collections::HashMap;

use crate::entity::{category, product, product_image};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{Category, Product, ProductImage, ProductOrder, ProductSortField};
use crate::repository::{
    CatalogUnitOfWork, CategoryQuery, CategoryRepository, ProductImageRepository, ProductQuery,
    ProductRepository,
};

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// `%term%` with LIKE wildcards in `term` escaped.
fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

fn lower_like(column: &str, term: &str) -> Condition {
    Condition::all().add(Expr::cust_with_values(
        format!("LOWER(\"{}\") LIKE $1", column),
        [contains_pattern(term)],
    ))
}

fn lower_eq(column: &str, value: String) -> Condition {
    Condition::all().add(Expr::cust_with_values(
        format!("LOWER(\"{}\") = $1", column),
        [value],
    ))
}

/// PostgreSQL unit of work for categories, products and images
#[derive(Clone)]
pub struct PgCatalogUnitOfWork {
    categories: PgCategoryRepository,
    products: PgProductRepository,
    images: PgProductImageRepository,
}

impl PgCatalogUnitOfWork {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            categories: PgCategoryRepository { db: db.clone() },
            products: PgProductRepository { db: db.clone() },
            images: PgProductImageRepository { db },
        }
    }
}

impl CatalogUnitOfWork for PgCatalogUnitOfWork {
    type Categories = PgCategoryRepository;
    type Products = PgProductRepository;
    type Images = PgProductImageRepository;

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

// ===== Categories =====

#[derive(Clone)]
pub struct PgCategoryRepository {
    db: DatabaseConnection,
}

impl PgCategoryRepository {
    fn filtered(query: &CategoryQuery) -> Select<category::Entity> {
        let mut select = category::Entity::find();
        if let Some(active) = query.is_active {
            select = select.filter(category::Column::IsActive.eq(active));
        }
        if let Some(term) = &query.search_term {
            select = select.filter(lower_like("name", term));
        }
        select
    }

    fn map_write_error(err: DbErr, category: &Category) -> CatalogError {
        if is_unique_violation(&err) {
            CatalogError::DuplicateCategoryName(category.name.to_string())
        } else if is_foreign_key_violation(&err) {
            CatalogError::CategoryNotFound(category.parent_id.unwrap_or_default())
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn get_by_id(&self, id: i32) -> CatalogResult<Option<Category>> {
        category::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Category::try_from)
            .transpose()
    }

    async fn get_by_ids(&self, ids: &[i32]) -> CatalogResult<Vec<Category>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        category::Entity::find()
            .filter(category::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    async fn name_exists(&self, name: &Name, exclude_id: Option<i32>) -> CatalogResult<bool> {
        let mut query =
            category::Entity::find().filter(lower_eq("name", name.as_str().to_lowercase()));
        if let Some(id) = exclude_id {
            query = query.filter(category::Column::Id.ne(id));
        }

        Ok(query.count(&self.db).await? > 0)
    }

    async fn has_children(&self, id: i32) -> CatalogResult<bool> {
        let children = category::Entity::find()
            .filter(category::Column::ParentCategoryId.eq(id))
            .count(&self.db)
            .await?;
        Ok(children > 0)
    }

    async fn list_active(&self) -> CatalogResult<Vec<Category>> {
        category::Entity::find()
            .filter(category::Column::IsActive.eq(true))
            .order_by_asc(category::Column::Name)
            .order_by_asc(category::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    async fn count(&self, query: &CategoryQuery) -> CatalogResult<u64> {
        Ok(Self::filtered(query).count(&self.db).await?)
    }

    async fn list_page(
        &self,
        query: &CategoryQuery,
        page: &PageRequest,
    ) -> CatalogResult<Vec<Category>> {
        Self::filtered(query)
            .order_by_asc(category::Column::Name)
            .order_by_asc(category::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    async fn add(&self, category: Category) -> CatalogResult<Category> {
        let model = category::ActiveModel::from(&category)
            .insert(&self.db)
            .await
            .map_err(|e| Self::map_write_error(e, &category))?;

        tracing::info!(category_id = model.id, "Created category");
        Category::try_from(model)
    }

    async fn update(&self, category: Category) -> CatalogResult<Category> {
        let id = category
            .id
            .ok_or_else(|| CatalogError::Internal("Category has no id".to_string()))?;
        let model = category::ActiveModel::from(&category)
            .update(&self.db)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => CatalogError::CategoryNotFound(id),
                other => Self::map_write_error(other, &category),
            })?;

        tracing::info!(category_id = id, "Updated category");
        Category::try_from(model)
    }

    async fn remove(&self, id: i32) -> CatalogResult<bool> {
        let result = match category::Entity::delete_by_id(id).exec(&self.db).await {
            Ok(result) => result,
            Err(e) if is_foreign_key_violation(&e) => {
                let products = product::Entity::find()
                    .filter(product::Column::CategoryId.eq(id))
                    .count(&self.db)
                    .await?;
                return Err(if products > 0 {
                    CatalogError::CategoryHasProducts {
                        category_id: id,
                        products,
                    }
                } else {
                    CatalogError::CategoryHasSubcategories(id)
                });
            }
            Err(e) => return Err(e.into()),
        };

        if result.rows_affected > 0 {
            tracing::info!(category_id = id, "Deleted category");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

// ===== Products =====

#[derive(Clone)]
pub struct PgProductRepository {
    db: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct CategoryProductCount {
    category_id: i32,
    products: i64,
}

impl PgProductRepository {
    fn filtered(query: &ProductQuery) -> Select<product::Entity> {
        let mut select = product::Entity::find();
        if let Some(active) = query.is_active {
            select = select.filter(product::Column::IsActive.eq(active));
        }
        if let Some(category_id) = query.category_id {
            select = select.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(term) = &query.search_term {
            select = select.filter(
                Condition::any()
                    .add(lower_like("name", term))
                    .add(lower_like("description", term))
                    .add(lower_like("sku", term)),
            );
        }
        if let Some(min) = query.min_price {
            select = select.filter(product::Column::PriceAmount.gte(min));
        }
        if let Some(max) = query.max_price {
            select = select.filter(product::Column::PriceAmount.lte(max));
        }
        select
    }

    fn ordered(select: Select<product::Entity>, order: &ProductOrder) -> Select<product::Entity> {
        let select = match order {
            ProductOrder::By { field, descending } => {
                let column = match field {
                    ProductSortField::Name => product::Column::Name,
                    ProductSortField::Price => product::Column::PriceAmount,
                    ProductSortField::Sku => product::Column::Sku,
                    ProductSortField::CreatedAt => product::Column::CreatedAt,
                };
                let direction = if *descending { Order::Desc } else { Order::Asc };
                select.order_by(column, direction)
            }
            ProductOrder::Relevance(term) => select
                .order_by(
                    Expr::cust_with_values(
                        "CASE WHEN LOWER(\"name\") = $1 THEN 0 WHEN LOWER(\"name\") LIKE $2 THEN 1 ELSE 2 END",
                        [term.clone(), format!("{}%", escape_like(term))],
                    ),
                    Order::Asc,
                )
                .order_by_asc(product::Column::Name),
        };
        select.order_by_asc(product::Column::Id)
    }

    fn map_write_error(err: DbErr, product: &Product) -> CatalogError {
        if is_unique_violation(&err) {
            CatalogError::DuplicateSku(product.sku.to_string())
        } else if is_foreign_key_violation(&err) {
            CatalogError::CategoryNotFound(product.category_id.unwrap_or_default())
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn get_by_id(&self, id: i32) -> CatalogResult<Option<Product>> {
        product::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Product::try_from)
            .transpose()
    }

    async fn sku_exists(&self, sku: &Sku) -> CatalogResult<bool> {
        let count = product::Entity::find()
            .filter(product::Column::Sku.eq(sku.as_str()))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn count_by_category(&self, category_id: i32) -> CatalogResult<u64> {
        Ok(product::Entity::find()
            .filter(product::Column::CategoryId.eq(category_id))
            .count(&self.db)
            .await?)
    }

    async fn count_by_categories(&self, category_ids: &[i32]) -> CatalogResult<HashMap<i32, u64>> {
        if category_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = product::Entity::find()
            .select_only()
            .column(product::Column::CategoryId)
            .column_as(product::Column::Id.count(), "products")
            .filter(product::Column::CategoryId.is_in(category_ids.iter().copied()))
            .group_by(product::Column::CategoryId)
            .into_model::<CategoryProductCount>()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.category_id, r.products.max(0) as u64))
            .collect())
    }

    async fn count(&self, query: &ProductQuery) -> CatalogResult<u64> {
        Ok(Self::filtered(query).count(&self.db).await?)
    }

    async fn list_page(
        &self,
        query: &ProductQuery,
        order: &ProductOrder,
        page: &PageRequest,
    ) -> CatalogResult<Vec<Product>> {
        Self::ordered(Self::filtered(query), order)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    async fn add(&self, product: Product) -> CatalogResult<Product> {
        let model = product::ActiveModel::from(&product)
            .insert(&self.db)
            .await
            .map_err(|e| Self::map_write_error(e, &product))?;

        tracing::info!(product_id = model.id, sku = %product.sku, "Created product");
        Product::try_from(model)
    }

    async fn update(&self, product: Product) -> CatalogResult<Product> {
        let id = product
            .id
            .ok_or_else(|| CatalogError::Internal("Product has no id".to_string()))?;
        let model = product::ActiveModel::from(&product)
            .update(&self.db)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => CatalogError::ProductNotFound(id),
                other => Self::map_write_error(other, &product),
            })?;

        tracing::info!(product_id = id, "Updated product");
        Product::try_from(model)
    }

    async fn remove_with_images(&self, id: i32) -> CatalogResult<bool> {
        let txn = self.db.begin().await?;

        let images = product_image::Entity::delete_many()
            .filter(product_image::Column::ProductId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;
        let removed = product::Entity::delete_by_id(id).exec(&txn).await?.rows_affected > 0;

        if !removed {
            txn.rollback().await?;
            return Ok(false);
        }
        txn.commit().await?;

        tracing::info!(product_id = id, images, "Deleted product");
        Ok(true)
    }
}

// ===== Images =====

#[derive(Clone)]
pub struct PgProductImageRepository {
    db: DatabaseConnection,
}

impl PgProductImageRepository {
    async fn demote_primaries<C: ConnectionTrait>(
        conn: &C,
        product_id: i32,
        except: Option<i32>,
    ) -> Result<u64, DbErr> {
        let mut update = product_image::Entity::update_many()
            .col_expr(product_image::Column::IsPrimary, Expr::value(false))
            .col_expr(
                product_image::Column::UpdatedAt,
                Expr::value(Some(DateTimeWithTimeZone::from(Utc::now()))),
            )
            .filter(product_image::Column::ProductId.eq(product_id))
            .filter(product_image::Column::IsPrimary.eq(true));
        if let Some(id) = except {
            update = update.filter(product_image::Column::Id.ne(id));
        }
        Ok(update.exec(conn).await?.rows_affected)
    }

    fn map_write_error(err: DbErr, image: &ProductImage) -> CatalogError {
        if is_unique_violation(&err) {
            CatalogError::OrderTaken {
                product_id: image.product_id,
                order: image.order,
            }
        } else if is_foreign_key_violation(&err) {
            CatalogError::ProductNotFound(image.product_id)
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl ProductImageRepository for PgProductImageRepository {
    async fn get_by_id(&self, id: i32) -> CatalogResult<Option<ProductImage>> {
        product_image::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(ProductImage::try_from)
            .transpose()
    }

    async fn list_by_product(&self, product_id: i32) -> CatalogResult<Vec<ProductImage>> {
        product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .order_by_asc(product_image::Column::SortOrder)
            .order_by_asc(product_image::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(ProductImage::try_from)
            .collect()
    }

    async fn order_taken(
        &self,
        product_id: i32,
        order: i32,
        exclude_id: Option<i32>,
    ) -> CatalogResult<bool> {
        let mut query = product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .filter(product_image::Column::SortOrder.eq(order));
        if let Some(id) = exclude_id {
            query = query.filter(product_image::Column::Id.ne(id));
        }

        Ok(query.count(&self.db).await? > 0)
    }

    async fn add(&self, image: ProductImage) -> CatalogResult<ProductImage> {
        let txn = self.db.begin().await?;

        if image.is_primary {
            Self::demote_primaries(&txn, image.product_id, None).await?;
        }
        let model = product_image::ActiveModel::from(&image)
            .insert(&txn)
            .await
            .map_err(|e| Self::map_write_error(e, &image))?;
        txn.commit()
            .await
            .map_err(|e| Self::map_write_error(e, &image))?;

        tracing::info!(image_id = model.id, product_id = image.product_id, "Created product image");
        ProductImage::try_from(model)
    }

    async fn update(&self, image: ProductImage) -> CatalogResult<ProductImage> {
        let id = image
            .id
            .ok_or_else(|| CatalogError::Internal("Image has no id".to_string()))?;
        let txn = self.db.begin().await?;

        let demoted = if image.is_primary {
            Self::demote_primaries(&txn, image.product_id, Some(id)).await?
        } else {
            0
        };
        let model = product_image::ActiveModel::from(&image)
            .update(&txn)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => CatalogError::ImageNotFound(id),
                other => Self::map_write_error(other, &image),
            })?;
        txn.commit()
            .await
            .map_err(|e| Self::map_write_error(e, &image))?;

        tracing::info!(image_id = id, demoted, "Updated product image");
        ProductImage::try_from(model)
    }

    async fn set_primary(&self, product_id: i32, image_id: i32) -> CatalogResult<ProductImage> {
        let txn = self.db.begin().await?;

        let mut image = product_image::Entity::find_by_id(image_id)
            .filter(product_image::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?
            .map(ProductImage::try_from)
            .transpose()?
            .ok_or(CatalogError::ImageNotFound(image_id))?;

        Self::demote_primaries(&txn, product_id, Some(image_id)).await?;
        image.set_as_primary();
        let model = product_image::ActiveModel::from(&image).update(&txn).await?;
        txn.commit().await?;

        tracing::info!(product_id, image_id, "Set primary image");
        ProductImage::try_from(model)
    }

    async fn apply_orders(&self, product_id: i32, orders: &[(i32, i32)]) -> CatalogResult<()> {
        let txn = self.db.begin().await?;
        let now = DateTimeWithTimeZone::from(Utc::now());

        for &(image_id, order) in orders {
            let updated = product_image::Entity::update_many()
                .col_expr(product_image::Column::SortOrder, Expr::value(order))
                .col_expr(product_image::Column::UpdatedAt, Expr::value(Some(now)))
                .filter(product_image::Column::Id.eq(image_id))
                .filter(product_image::Column::ProductId.eq(product_id))
                .exec(&txn)
                .await?
                .rows_affected;
            if updated == 0 {
                txn.rollback().await?;
                return Err(CatalogError::ImageNotFound(image_id));
            }
        }

        // The (product_id, sort_order) constraint is deferred to commit.
        txn.commit().await.map_err(|e| {
            if is_unique_violation(&e) {
                CatalogError::validation("orders", "Image orders must be unique per product")
            } else {
                e.into()
            }
        })?;

        tracing::info!(product_id, moved = orders.len(), "Reordered product images");
        Ok(())
    }

    async fn remove(&self, id: i32) -> CatalogResult<bool> {
        let result = product_image::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected > 0 {
            tracing::info!(image_id = id, "Deleted product image");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
