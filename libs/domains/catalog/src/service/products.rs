use domain_kernel::{Decimal, Description, Money, Name, PageRequest, PagedResult, Sku, Url};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::instrument;

use super::{require_id, require_text, validate_input};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    Category, CreateProduct, ImageUpload, Product, ProductDto, ProductFilter, ProductImage,
    ProductOrder, ProductSortField, ProductSummary, UpdateProduct,
};
use crate::repository::{
    normalize_term, CatalogUnitOfWork, CategoryRepository, ProductImageRepository, ProductQuery,
    ProductRepository,
};
use crate::storage::ImageStore;

/// Service layer for Product business logic
#[derive(Clone)]
pub struct ProductService<U: CatalogUnitOfWork, S: ImageStore> {
    uow: Arc<U>,
    store: Arc<S>,
}

impl<U: CatalogUnitOfWork, S: ImageStore> ProductService<U, S> {
    pub fn new(uow: U, store: S) -> Self {
        Self {
            uow: Arc::new(uow),
            store: Arc::new(store),
        }
    }

    /// Create a product, storing the uploaded image (if any) as its primary
    /// image at order 1. A failed upload leaves neither the product nor the
    /// stored file behind.
    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_product(&self, input: CreateProduct) -> CatalogResult<ProductDto> {
        require_text("sku", "SKU", &input.sku)?;
        let (name, description, price) =
            parse_details(&input.name, &input.description, input.price, &input.currency)?;
        let sku = Sku::parse(&input.sku)?;
        validate_input(&input)?;
        let alt = input
            .image
            .as_ref()
            .map(|upload| upload_alt(upload, &name))
            .transpose()?;

        if self.uow.products().sku_exists(&sku).await? {
            return Err(CatalogError::DuplicateSku(sku.into_inner()));
        }

        let category = self.find_category(input.category_id).await?;
        let product = Product::new(sku, name, description, price, category.as_ref())?;

        let stored = match (&input.image, alt) {
            (Some(upload), Some(alt)) => Some((self.store_upload(upload).await?, alt)),
            _ => None,
        };
        let product = match self.uow.products().add(product).await {
            Ok(product) => product,
            Err(e) => {
                if let Some((url, _)) = &stored {
                    self.discard_file(url.as_str()).await;
                }
                return Err(e);
            }
        };

        let images = match stored {
            Some((url, alt)) => vec![self.attach_image(&product, url, alt).await?],
            None => Vec::new(),
        };

        Ok(ProductDto::new(
            &product,
            category.as_ref().map(|c| c.name().as_str()),
            &images,
        ))
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(&self, id: i32, input: UpdateProduct) -> CatalogResult<ProductDto> {
        require_id("product_id", id)?;
        let (name, description, price) =
            parse_details(&input.name, &input.description, input.price, &input.currency)?;
        let mut product = self.find(id).await?;

        let category = self.find_category(input.category_id).await?;
        product.set_category(category.as_ref())?;
        product.update_details(name, description, price, input.is_active);

        let product = self.uow.products().update(product).await?;
        let images = self.uow.images().list_by_product(id).await?;
        Ok(ProductDto::new(
            &product,
            category.as_ref().map(|c| c.name().as_str()),
            &images,
        ))
    }

    /// Removes the product together with its images.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i32) -> CatalogResult<()> {
        require_id("product_id", id)?;
        self.find(id).await?;

        if !self.uow.products().remove_with_images(id).await? {
            return Err(CatalogError::ProductNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i32) -> CatalogResult<ProductDto> {
        require_id("product_id", id)?;
        let product = self.find(id).await?;

        let category = match product.category_id() {
            Some(category_id) => self.uow.categories().get_by_id(category_id).await?,
            None => None,
        };
        let images = self.uow.images().list_by_product(id).await?;
        Ok(ProductDto::new(
            &product,
            category.as_ref().map(|c| c.name().as_str()),
            &images,
        ))
    }

    #[instrument(skip(self, filter))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
    ) -> CatalogResult<PagedResult<ProductSummary>> {
        let page = PageRequest::new(filter.page, filter.page_size)?;
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                return Err(CatalogError::validation(
                    "min_price",
                    "Minimum price cannot exceed maximum price",
                ));
            }
        }

        let query = ProductQuery {
            is_active: filter.is_active,
            category_id: filter.category_id,
            search_term: normalize_term(filter.search_term.as_deref()),
            min_price: filter.min_price,
            max_price: filter.max_price,
        };
        let order = ProductOrder::By {
            field: ProductSortField::from_request(filter.sort_by.as_deref()),
            descending: filter.descending,
        };
        self.page_of(&query, &order, page).await
    }

    /// Products matching `term` in name, description or SKU, best name
    /// matches first.
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        term: &str,
        page: u32,
        page_size: u32,
        only_active: bool,
    ) -> CatalogResult<PagedResult<ProductSummary>> {
        let term = normalize_term(Some(term))
            .ok_or_else(|| CatalogError::validation("search_term", "Search term is required"))?;
        let page = PageRequest::new(page, page_size)?;

        let query = ProductQuery {
            is_active: only_active.then_some(true),
            search_term: Some(term.clone()),
            ..Default::default()
        };
        self.page_of(&query, &ProductOrder::Relevance(term), page)
            .await
    }

    #[instrument(skip(self))]
    pub async fn products_by_category(
        &self,
        category_id: i32,
        page: u32,
        page_size: u32,
        only_active: bool,
    ) -> CatalogResult<PagedResult<ProductSummary>> {
        require_id("category_id", category_id)?;
        let page = PageRequest::new(page, page_size)?;
        if self.uow.categories().get_by_id(category_id).await?.is_none() {
            return Err(CatalogError::CategoryNotFound(category_id));
        }

        let query = ProductQuery {
            is_active: only_active.then_some(true),
            category_id: Some(category_id),
            ..Default::default()
        };
        self.page_of(&query, &ProductOrder::default(), page).await
    }

    async fn page_of(
        &self,
        query: &ProductQuery,
        order: &ProductOrder,
        page: PageRequest,
    ) -> CatalogResult<PagedResult<ProductSummary>> {
        let total = self.uow.products().count(query).await?;
        let products = self.uow.products().list_page(query, order, &page).await?;
        let names = self.category_names(&products).await?;

        let items = products
            .iter()
            .map(|p| {
                let name = p.category_id().and_then(|id| names.get(&id)).map(String::as_str);
                ProductSummary::new(p, name)
            })
            .collect();
        Ok(PagedResult::new(items, total, page))
    }

    /// Names of the categories referenced by `products`, in one lookup.
    async fn category_names(&self, products: &[Product]) -> CatalogResult<HashMap<i32, String>> {
        let ids: Vec<i32> = products
            .iter()
            .filter_map(Product::category_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let categories = self.uow.categories().get_by_ids(&ids).await?;

        Ok(categories
            .into_iter()
            .filter_map(|c| c.id().map(|id| (id, c.name().to_string())))
            .collect())
    }

    async fn store_upload(&self, upload: &ImageUpload) -> CatalogResult<Url> {
        let url = self.store.save(&upload.bytes, &upload.file_name).await?;
        match Url::parse(&url) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                self.discard_file(&url).await;
                Err(e.into())
            }
        }
    }

    /// Attach a stored upload as the primary image. On failure the product
    /// and the file are removed again.
    async fn attach_image(
        &self,
        product: &Product,
        url: Url,
        alt: Description,
    ) -> CatalogResult<ProductImage> {
        let product_id = product
            .id()
            .ok_or_else(|| CatalogError::Internal("Product has no id".to_string()))?;

        let mut image = ProductImage::new(product_id, url.clone(), alt, 1);
        image.set_as_primary();
        match self.uow.images().add(image).await {
            Ok(image) => {
                tracing::info!(product_id, image_id = ?image.id(), "Attached uploaded image");
                Ok(image)
            }
            Err(e) => {
                if let Err(cleanup) = self.uow.products().remove_with_images(product_id).await {
                    tracing::warn!(product_id, error = %cleanup, "Failed to remove product after image error");
                }
                self.discard_file(url.as_str()).await;
                Err(e)
            }
        }
    }

    async fn discard_file(&self, url: &str) {
        if let Err(e) = self.store.delete(url).await {
            tracing::warn!(url, error = %e, "Failed to delete stored image");
        }
    }

    async fn find(&self, id: i32) -> CatalogResult<Product> {
        self.uow
            .products()
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::ProductNotFound(id))
    }

    async fn find_category(&self, id: Option<i32>) -> CatalogResult<Option<Category>> {
        let Some(id) = id else {
            return Ok(None);
        };
        self.uow
            .categories()
            .get_by_id(id)
            .await?
            .map(Some)
            .ok_or(CatalogError::CategoryNotFound(id))
    }
}

/// Alt text for an upload, falling back to the product name.
fn upload_alt(upload: &ImageUpload, product_name: &Name) -> CatalogResult<Description> {
    if upload.alt.trim().is_empty() {
        Ok(Description::parse(product_name.as_str())?)
    } else {
        Ok(Description::parse(&upload.alt)?)
    }
}

fn parse_details(
    name: &str,
    description: &str,
    price: Decimal,
    currency: &str,
) -> CatalogResult<(Name, Description, Money)> {
    require_text("name", "Name", name)?;
    require_text("description", "Description", description)?;
    if price <= Decimal::ZERO {
        return Err(CatalogError::validation(
            "price",
            "Price must be greater than 0",
        ));
    }
    require_text("currency", "Currency", currency)?;

    Ok((
        Name::parse(name)?,
        Description::parse(description)?,
        Money::new(price, currency)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateCategory, UpdateCategory};
    use crate::repository::InMemoryCatalogUnitOfWork;
    use crate::service::CategoryService;
    use crate::storage::MockImageStore;
    use domain_kernel::ErrorKind;

    fn create(sku: &str, name: &str, cents: i64, category_id: Option<i32>) -> CreateProduct {
        CreateProduct {
            sku: sku.to_string(),
            name: name.to_string(),
            description: format!("{} description", name),
            price: Decimal::new(cents, 2),
            currency: "usd".to_string(),
            category_id,
            image: None,
        }
    }

    fn service(
        uow: &InMemoryCatalogUnitOfWork,
    ) -> ProductService<InMemoryCatalogUnitOfWork, MockImageStore> {
        ProductService::new(uow.clone(), MockImageStore::new())
    }

    async fn category(uow: &InMemoryCatalogUnitOfWork, name: &str) -> i32 {
        CategoryService::new(uow.clone())
            .create_category(CreateCategory {
                name: name.to_string(),
                description: String::new(),
                parent_category_id: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_product() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let tools = category(&uow, "Tools").await;

        let dto = service(&uow)
            .create_product(create("ham-1", "Hammer", 1999, Some(tools)))
            .await
            .unwrap();

        assert_eq!(dto.sku, "HAM-1");
        assert_eq!(dto.currency, "USD");
        assert_eq!(dto.category_name, "Tools");
        assert!(dto.is_active);
        assert!(dto.images.is_empty());
    }

    #[tokio::test]
    async fn test_create_validation_order() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let service = service(&uow);

        let mut input = create(" ", " ", 0, None);
        let err = service.create_product(input.clone()).await.unwrap_err();
        assert_eq!(err.to_string(), "SKU is required");

        input.sku = "HAM-1".to_string();
        let err = service.create_product(input.clone()).await.unwrap_err();
        assert_eq!(err.to_string(), "Name is required");

        input.name = "Hammer".to_string();
        input.description = "Claw hammer".to_string();
        let err = service.create_product(input.clone()).await.unwrap_err();
        assert_eq!(err.to_string(), "Price must be greater than 0");

        input.price = Decimal::ONE;
        input.currency = String::new();
        let err = service.create_product(input).await.unwrap_err();
        assert_eq!(err.to_string(), "Currency is required");
    }

    #[tokio::test]
    async fn test_create_duplicate_sku_is_canonical() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let service = service(&uow);
        service
            .create_product(create("HAM-1", "Hammer", 1999, None))
            .await
            .unwrap();

        let err = service
            .create_product(create("ham-1", "Other", 500, None))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateSku(ref s) if s == "HAM-1"));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_create_in_missing_or_inactive_category() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let service = service(&uow);

        let err = service
            .create_product(create("HAM-1", "Hammer", 1999, Some(9)))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::CategoryNotFound(9)));

        let archive = category(&uow, "Archive").await;
        CategoryService::new(uow.clone())
            .update_category(
                archive,
                UpdateCategory {
                    name: "Archive".to_string(),
                    description: String::new(),
                    is_active: false,
                },
            )
            .await
            .unwrap();

        let err = service
            .create_product(create("HAM-1", "Hammer", 1999, Some(archive)))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::InactiveCategory(id) if id == archive));
        assert_eq!(
            service.list_products(ProductFilter::default()).await.unwrap().total_count,
            0
        );
    }

    #[tokio::test]
    async fn test_create_with_upload_attaches_primary_image() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let mut store = MockImageStore::new();
        store
            .expect_save()
            .withf(|bytes: &[u8], file_name: &str| bytes == b"jpeg" && file_name == "hammer.jpg")
            .times(1)
            .returning(|_, _| Ok("https://cdn.example.com/images/abc.jpg".to_string()));
        let service = ProductService::new(uow.clone(), store);

        let mut input = create("HAM-1", "Hammer", 1999, None);
        input.image = Some(ImageUpload {
            file_name: "hammer.jpg".to_string(),
            bytes: b"jpeg".to_vec(),
            alt: String::new(),
        });
        let dto = service.create_product(input).await.unwrap();

        assert_eq!(dto.category_name, "Uncategorized");
        assert_eq!(dto.images.len(), 1);
        let image = &dto.images[0];
        assert_eq!(image.url, "https://cdn.example.com/images/abc.jpg");
        assert_eq!(image.alt, "Hammer");
        assert_eq!(image.order, 1);
        assert!(image.is_primary);
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces_as_internal() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let mut store = MockImageStore::new();
        store
            .expect_save()
            .returning(|_, _| Err(CatalogError::Storage("disk full".to_string())));
        let service = ProductService::new(uow, store);

        let mut input = create("HAM-1", "Hammer", 1999, None);
        input.image = Some(ImageUpload {
            file_name: "hammer.jpg".to_string(),
            bytes: b"jpeg".to_vec(),
            alt: "Front".to_string(),
        });
        let err = service.create_product(input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(
            service.list_products(ProductFilter::default()).await.unwrap().total_count,
            0
        );
    }

    #[tokio::test]
    async fn test_empty_upload_rejected_before_storing() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let mut store = MockImageStore::new();
        store.expect_save().never();
        let service = ProductService::new(uow, store);

        let mut input = create("HAM-1", "Hammer", 1999, None);
        input.image = Some(ImageUpload {
            file_name: "hammer.jpg".to_string(),
            bytes: Vec::new(),
            alt: String::new(),
        });
        let err = service.create_product(input.clone()).await.unwrap_err();
        assert_eq!(err.to_string(), "Image file is empty");

        input.image = None;
        let dto = service.create_product(input).await.unwrap();
        assert_eq!(dto.sku, "HAM-1");
    }

    #[tokio::test]
    async fn test_unusable_stored_url_discards_file() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let mut store = MockImageStore::new();
        store
            .expect_save()
            .returning(|_, _| Ok("/images/abc.jpg".to_string()));
        store
            .expect_delete()
            .withf(|url: &str| url == "/images/abc.jpg")
            .times(1)
            .returning(|_| Ok(true));
        let service = ProductService::new(uow, store);

        let mut input = create("HAM-1", "Hammer", 1999, None);
        input.image = Some(ImageUpload {
            file_name: "hammer.jpg".to_string(),
            bytes: b"jpeg".to_vec(),
            alt: String::new(),
        });
        let err = service.create_product(input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            service.list_products(ProductFilter::default()).await.unwrap().total_count,
            0
        );
    }

    #[tokio::test]
    async fn test_update_product() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let service = service(&uow);
        let tools = category(&uow, "Tools").await;
        let created = service
            .create_product(create("HAM-1", "Hammer", 1999, None))
            .await
            .unwrap();

        let dto = service
            .update_product(
                created.id,
                UpdateProduct {
                    name: "Claw Hammer".to_string(),
                    description: "Steel".to_string(),
                    price: Decimal::new(2499, 2),
                    currency: "eur".to_string(),
                    category_id: Some(tools),
                    is_active: false,
                },
            )
            .await
            .unwrap();

        assert_eq!(dto.name, "Claw Hammer");
        assert_eq!(dto.price, Decimal::new(2499, 2));
        assert_eq!(dto.currency, "EUR");
        assert_eq!(dto.category_name, "Tools");
        assert!(!dto.is_active);
        assert!(dto.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_product() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let service = service(&uow);
        let input = UpdateProduct {
            name: "Hammer".to_string(),
            description: "Steel".to_string(),
            price: Decimal::ONE,
            currency: "USD".to_string(),
            category_id: None,
            is_active: true,
        };

        let err = service.update_product(3, input.clone()).await.unwrap_err();
        assert!(matches!(err, CatalogError::ProductNotFound(3)));
        let err = service.update_product(0, input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = service.delete_product(3).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_product() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let service = service(&uow);
        let created = service
            .create_product(create("HAM-1", "Hammer", 1999, None))
            .await
            .unwrap();

        service.delete_product(created.id).await.unwrap();

        let err = service.get_product(created.id).await.unwrap_err();
        assert!(matches!(err, CatalogError::ProductNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_products_sorted_by_price_descending() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let service = service(&uow);
        let stock = [
            ("A-100", "Anvil", 9000),
            ("B-100", "Bolt", 50),
            ("C-100", "Chisel", 1200),
        ];
        for (sku, name, cents) in stock {
            service.create_product(create(sku, name, cents, None)).await.unwrap();
        }

        let page = service
            .list_products(ProductFilter {
                sort_by: Some("PRICE".to_string()),
                descending: true,
                ..Default::default()
            })
            .await
            .unwrap();

        let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Anvil", "Chisel", "Bolt"]);
        assert!(page.items.iter().all(|p| p.category_name == "Uncategorized"));
    }

    #[tokio::test]
    async fn test_list_products_unknown_sort_uses_name() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let service = service(&uow);
        for (sku, name) in [("Z-100", "Bolt"), ("A-100", "Chisel"), ("M-100", "Anvil")] {
            service.create_product(create(sku, name, 100, None)).await.unwrap();
        }

        let page = service
            .list_products(ProductFilter {
                sort_by: Some("color".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Anvil", "Bolt", "Chisel"]);
    }

    #[tokio::test]
    async fn test_list_products_inverted_price_range() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let err = service(&uow)
            .list_products(ProductFilter {
                min_price: Some(Decimal::TEN),
                max_price: Some(Decimal::ONE),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_search_ranks_exact_then_prefix_then_substring() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let service = service(&uow);
        for (sku, name) in [("P-001", "Big Widget"), ("P-002", "Widget Pro"), ("P-003", "Wid")] {
            service.create_product(create(sku, name, 100, None)).await.unwrap();
        }

        let page = service.search_products("WID", 1, 10, false).await.unwrap();

        let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Wid", "Widget Pro", "Big Widget"]);
    }

    #[tokio::test]
    async fn test_search_requires_term() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let err = service(&uow)
            .search_products("   ", 1, 10, true)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Search term is required");
    }

    #[tokio::test]
    async fn test_products_by_category() {
        let uow = InMemoryCatalogUnitOfWork::new();
        let service = service(&uow);
        let tools = category(&uow, "Tools").await;
        service
            .create_product(create("HAM-1", "Hammer", 1999, Some(tools)))
            .await
            .unwrap();
        service
            .create_product(create("BOLT-1", "Bolt", 50, None))
            .await
            .unwrap();

        let page = service.products_by_category(tools, 1, 10, true).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].category_name, "Tools");

        let err = service.products_by_category(99, 1, 10, true).await.unwrap_err();
        assert!(matches!(err, CatalogError::CategoryNotFound(99)));
    }
}
