use domain_kernel::{Description, Url};
use std::sync::Arc;
use tracing::instrument;

use super::{require_id, require_text, validate_input};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    AddProductImage, ImageOrder, ProductImage, ProductImageDto, ProductImages, UpdateProductImage,
};
use crate::repository::{CatalogUnitOfWork, ProductImageRepository, ProductRepository};

/// Service layer for product images.
///
/// Every write that touches more than one image (primary demotion, batch
/// reorder) goes through a single repository call so it commits atomically.
#[derive(Clone)]
pub struct ProductImageService<U: CatalogUnitOfWork> {
    uow: Arc<U>,
}

impl<U: CatalogUnitOfWork> ProductImageService<U> {
    pub fn new(uow: U) -> Self {
        Self { uow: Arc::new(uow) }
    }

    #[instrument(skip(self, input), fields(product_id = input.product_id, order = input.order))]
    pub async fn add_image(&self, input: AddProductImage) -> CatalogResult<ProductImageDto> {
        require_id("product_id", input.product_id)?;
        check_fields(&input.url, &input.alt)?;
        validate_input(&input)?;
        self.ensure_product(input.product_id).await?;

        if self
            .uow
            .images()
            .order_taken(input.product_id, input.order, None)
            .await?
        {
            return Err(CatalogError::OrderTaken {
                product_id: input.product_id,
                order: input.order,
            });
        }

        let mut image = ProductImage::new(
            input.product_id,
            Url::parse(&input.url)?,
            Description::parse(&input.alt)?,
            input.order,
        );
        if input.is_primary {
            image.set_as_primary();
        }

        let image = self.uow.images().add(image).await?;
        Ok(ProductImageDto::from(&image))
    }

    #[instrument(skip(self, input))]
    pub async fn update_image(
        &self,
        id: i32,
        input: UpdateProductImage,
    ) -> CatalogResult<ProductImageDto> {
        require_id("image_id", id)?;
        check_fields(&input.url, &input.alt)?;
        validate_input(&input)?;
        let mut image = self.find(id).await?;

        if self
            .uow
            .images()
            .order_taken(image.product_id(), input.order, Some(id))
            .await?
        {
            return Err(CatalogError::OrderTaken {
                product_id: image.product_id(),
                order: input.order,
            });
        }

        image.update_details(
            Url::parse(&input.url)?,
            Description::parse(&input.alt)?,
            input.order,
        );
        match (input.is_primary, image.is_primary()) {
            (true, false) => image.set_as_primary(),
            (false, true) => image.remove_as_primary(),
            _ => {}
        }

        let image = self.uow.images().update(image).await?;
        Ok(ProductImageDto::from(&image))
    }

    #[instrument(skip(self))]
    pub async fn delete_image(&self, id: i32) -> CatalogResult<()> {
        require_id("image_id", id)?;
        self.find(id).await?;

        if !self.uow.images().remove(id).await? {
            return Err(CatalogError::ImageNotFound(id));
        }
        Ok(())
    }

    /// Images of a product ordered by position
    #[instrument(skip(self))]
    pub async fn list_product_images(&self, product_id: i32) -> CatalogResult<Vec<ProductImageDto>> {
        require_id("product_id", product_id)?;
        self.ensure_product(product_id).await?;

        let images = self.uow.images().list_by_product(product_id).await?;
        Ok(images.iter().map(ProductImageDto::from).collect())
    }

    /// Move several images at once. Either every listed image moves or none
    /// does.
    #[instrument(skip(self, orders), fields(images = orders.len()))]
    pub async fn reorder_images(
        &self,
        product_id: i32,
        orders: &[ImageOrder],
    ) -> CatalogResult<Vec<ProductImageDto>> {
        require_id("product_id", product_id)?;
        if orders.is_empty() {
            return Err(CatalogError::validation(
                "orders",
                "At least one image order is required",
            ));
        }
        orders.iter().try_for_each(validate_input)?;
        self.ensure_product(product_id).await?;

        let current = self.uow.images().list_by_product(product_id).await?;
        let mut images = ProductImages::new(product_id, current);
        let moved = images.reorder(orders)?;

        if !moved.is_empty() {
            self.uow.images().apply_orders(product_id, &moved).await?;
        }
        Ok(images.images().iter().map(ProductImageDto::from).collect())
    }

    /// Make an image the product's only primary image. Already primary is a
    /// successful no-op.
    #[instrument(skip(self))]
    pub async fn set_primary_image(&self, image_id: i32) -> CatalogResult<ProductImageDto> {
        require_id("image_id", image_id)?;
        let image = self.find(image_id).await?;

        if image.is_primary() {
            tracing::debug!(image_id, "Image is already primary");
            return Ok(ProductImageDto::from(&image));
        }

        let image = self
            .uow
            .images()
            .set_primary(image.product_id(), image_id)
            .await?;
        Ok(ProductImageDto::from(&image))
    }

    async fn find(&self, id: i32) -> CatalogResult<ProductImage> {
        self.uow
            .images()
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::ImageNotFound(id))
    }

    async fn ensure_product(&self, product_id: i32) -> CatalogResult<()> {
        match self.uow.products().get_by_id(product_id).await? {
            Some(_) => Ok(()),
            None => Err(CatalogError::ProductNotFound(product_id)),
        }
    }
}

fn check_fields(url: &str, alt: &str) -> CatalogResult<()> {
    require_text("url", "URL", url)?;
    require_text("alt", "Alt text", alt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use crate::repository::InMemoryCatalogUnitOfWork;
    use domain_kernel::{Decimal, ErrorKind, Money, Name, Sku};

    async fn product(uow: &InMemoryCatalogUnitOfWork, sku: &str) -> i32 {
        let product = Product::new(
            Sku::parse(sku).unwrap(),
            Name::parse("Hammer").unwrap(),
            Description::parse("Claw hammer").unwrap(),
            Money::new(Decimal::new(1999, 2), "USD").unwrap(),
            None,
        )
        .unwrap();
        uow.products().add(product).await.unwrap().id().unwrap()
    }

    fn add(product_id: i32, order: i32, is_primary: bool) -> AddProductImage {
        AddProductImage {
            product_id,
            url: format!("https://cdn.example.com/images/{}-{}.png", product_id, order),
            alt: format!("View {}", order),
            order,
            is_primary,
        }
    }

    async fn setup() -> (
        ProductImageService<InMemoryCatalogUnitOfWork>,
        InMemoryCatalogUnitOfWork,
        i32,
    ) {
        let uow = InMemoryCatalogUnitOfWork::new();
        let product_id = product(&uow, "HAM-1").await;
        (ProductImageService::new(uow.clone()), uow, product_id)
    }

    fn primaries(images: &[ProductImageDto]) -> Vec<i32> {
        images.iter().filter(|i| i.is_primary).map(|i| i.id).collect()
    }

    #[tokio::test]
    async fn test_second_primary_demotes_first() {
        let (service, _, pid) = setup().await;

        service.add_image(add(pid, 1, true)).await.unwrap();
        let second = service.add_image(add(pid, 2, true)).await.unwrap();

        let images = service.list_product_images(pid).await.unwrap();
        assert_eq!(primaries(&images), vec![second.id]);
    }

    #[tokio::test]
    async fn test_add_image_checks() {
        let (service, _, pid) = setup().await;

        let err = service.add_image(add(0, 1, false)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut blank_alt = add(pid, 1, false);
        blank_alt.alt = " ".to_string();
        let err = service.add_image(blank_alt).await.unwrap_err();
        assert_eq!(err.to_string(), "Alt text is required");

        let err = service.add_image(add(pid, -1, false)).await.unwrap_err();
        assert_eq!(err.to_string(), "Order cannot be negative");

        let err = service.add_image(add(77, 1, false)).await.unwrap_err();
        assert!(matches!(err, CatalogError::ProductNotFound(77)));

        let mut relative = add(pid, 1, false);
        relative.url = "/images/a.png".to_string();
        let err = service.add_image(relative).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_add_image_order_taken_keeps_primary() {
        let (service, _, pid) = setup().await;
        let first = service.add_image(add(pid, 1, true)).await.unwrap();

        let err = service.add_image(add(pid, 1, true)).await.unwrap_err();
        assert!(matches!(err, CatalogError::OrderTaken { order: 1, .. }));

        let images = service.list_product_images(pid).await.unwrap();
        assert_eq!(primaries(&images), vec![first.id]);
    }

    #[tokio::test]
    async fn test_update_image_promotes_and_demotes_previous() {
        let (service, _, pid) = setup().await;
        let first = service.add_image(add(pid, 1, true)).await.unwrap();
        let second = service.add_image(add(pid, 2, false)).await.unwrap();

        let updated = service
            .update_image(
                second.id,
                UpdateProductImage {
                    url: "https://cdn.example.com/images/new.png".to_string(),
                    alt: "Side".to_string(),
                    order: 3,
                    is_primary: true,
                },
            )
            .await
            .unwrap();

        assert!(updated.is_primary);
        assert_eq!(updated.order, 3);
        assert_eq!(updated.alt, "Side");
        let images = service.list_product_images(pid).await.unwrap();
        assert_eq!(primaries(&images), vec![second.id]);
        assert_eq!(images[0].id, first.id);
    }

    #[tokio::test]
    async fn test_update_image_order_taken_by_other() {
        let (service, _, pid) = setup().await;
        service.add_image(add(pid, 1, false)).await.unwrap();
        let second = service.add_image(add(pid, 2, false)).await.unwrap();

        let err = service
            .update_image(
                second.id,
                UpdateProductImage {
                    url: second.url.clone(),
                    alt: second.alt.clone(),
                    order: 1,
                    is_primary: false,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        // Keeping its own order is fine
        service
            .update_image(
                second.id,
                UpdateProductImage {
                    url: second.url.clone(),
                    alt: "Renamed".to_string(),
                    order: 2,
                    is_primary: false,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reorder_with_duplicate_targets_changes_nothing() {
        let (service, _, pid) = setup().await;
        let a = service.add_image(add(pid, 1, false)).await.unwrap();
        let b = service.add_image(add(pid, 2, false)).await.unwrap();

        let err = service
            .reorder_images(
                pid,
                &[
                    ImageOrder { image_id: a.id, order: 5 },
                    ImageOrder { image_id: b.id, order: 5 },
                ],
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Duplicate orders in request: 5");

        let orders: Vec<_> = service
            .list_product_images(pid)
            .await
            .unwrap()
            .iter()
            .map(|i| (i.id, i.order))
            .collect();
        assert_eq!(orders, vec![(a.id, 1), (b.id, 2)]);
    }

    #[tokio::test]
    async fn test_reorder_foreign_images_listed() {
        let (service, uow, pid) = setup().await;
        let other = product(&uow, "HAM-2").await;
        let foreign = service.add_image(add(other, 1, false)).await.unwrap();
        let own = service.add_image(add(pid, 1, false)).await.unwrap();

        let err = service
            .reorder_images(
                pid,
                &[
                    ImageOrder { image_id: own.id, order: 2 },
                    ImageOrder { image_id: foreign.id, order: 3 },
                ],
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            format!("Images {} do not belong to product {}", foreign.id, pid)
        );
    }

    #[tokio::test]
    async fn test_reorder_swaps_positions() {
        let (service, _, pid) = setup().await;
        let a = service.add_image(add(pid, 1, false)).await.unwrap();
        let b = service.add_image(add(pid, 2, false)).await.unwrap();

        let images = service
            .reorder_images(
                pid,
                &[
                    ImageOrder { image_id: a.id, order: 2 },
                    ImageOrder { image_id: b.id, order: 1 },
                ],
            )
            .await
            .unwrap();

        let returned: Vec<_> = images.iter().map(|i| (i.id, i.order)).collect();
        assert_eq!(returned, vec![(b.id, 1), (a.id, 2)]);
        let stored: Vec<_> = service
            .list_product_images(pid)
            .await
            .unwrap()
            .iter()
            .map(|i| (i.id, i.order))
            .collect();
        assert_eq!(stored, returned);
    }

    #[tokio::test]
    async fn test_reorder_requires_entries() {
        let (service, _, pid) = setup().await;
        let err = service.reorder_images(pid, &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let image = service.add_image(add(pid, 1, false)).await.unwrap();
        let err = service
            .reorder_images(
                pid,
                &[ImageOrder {
                    image_id: image.id,
                    order: -1,
                }],
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Order cannot be negative");
    }

    #[tokio::test]
    async fn test_set_primary_image() {
        let (service, _, pid) = setup().await;
        let first = service.add_image(add(pid, 1, true)).await.unwrap();
        let second = service.add_image(add(pid, 2, false)).await.unwrap();

        let promoted = service.set_primary_image(second.id).await.unwrap();

        assert!(promoted.is_primary);
        let images = service.list_product_images(pid).await.unwrap();
        assert_eq!(primaries(&images), vec![second.id]);
        assert_eq!(images[0].id, first.id);
    }

    #[tokio::test]
    async fn test_set_primary_when_already_primary_does_not_write() {
        let (service, uow, pid) = setup().await;
        let first = service.add_image(add(pid, 1, true)).await.unwrap();
        let before = uow.images().get_by_id(first.id).await.unwrap().unwrap();

        let dto = service.set_primary_image(first.id).await.unwrap();

        let after = uow.images().get_by_id(first.id).await.unwrap().unwrap();
        assert!(dto.is_primary);
        assert_eq!(before.updated_at(), after.updated_at());
    }

    #[tokio::test]
    async fn test_set_primary_missing_image() {
        let (service, _, _) = setup().await;
        let err = service.set_primary_image(404).await.unwrap_err();
        assert!(matches!(err, CatalogError::ImageNotFound(404)));
    }

    #[tokio::test]
    async fn test_delete_image() {
        let (service, _, pid) = setup().await;
        let image = service.add_image(add(pid, 1, false)).await.unwrap();

        service.delete_image(image.id).await.unwrap();

        assert!(service.list_product_images(pid).await.unwrap().is_empty());
        let err = service.delete_image(image.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
