use chrono::{DateTime, Utc};
use domain_kernel::{Description, Url};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use validator::Validate;

use crate::error::{CatalogError, CatalogResult};

/// Picture of a product with a display position.
#[derive(Debug, Clone)]
pub struct ProductImage {
    pub(crate) id: Option<i32>,
    pub(crate) product_id: i32,
    pub(crate) url: Url,
    pub(crate) alt: Description,
    pub(crate) order: i32,
    pub(crate) is_primary: bool,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
}

impl ProductImage {
    pub fn new(product_id: i32, url: Url, alt: Description, order: i32) -> Self {
        Self {
            id: None,
            product_id,
            url,
            alt,
            order,
            is_primary: false,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub fn product_id(&self) -> i32 {
        self.product_id
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn alt(&self) -> &Description {
        &self.alt
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn update_details(&mut self, url: Url, alt: Description, order: i32) {
        self.url = url;
        self.alt = alt;
        self.order = order;
        self.touch();
    }

    pub fn set_as_primary(&mut self) {
        self.is_primary = true;
        self.touch();
    }

    pub fn remove_as_primary(&mut self) {
        self.is_primary = false;
        self.touch();
    }

    pub fn move_to(&mut self, order: i32) {
        self.order = order;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

impl PartialEq for ProductImage {
    fn eq(&self, other: &Self) -> bool {
        super::same_identity(self.id, other.id)
    }
}

/// Requested position for one image in a reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ImageOrder {
    pub image_id: i32,
    #[validate(range(min = 0, message = "Order cannot be negative"))]
    pub order: i32,
}

/// All images of one product.
///
/// Owns the rules that span images: at most one primary image, and no two
/// images sharing an order.
#[derive(Debug, Clone)]
pub struct ProductImages {
    product_id: i32,
    images: Vec<ProductImage>,
}

impl ProductImages {
    /// Images are kept sorted by order, then id.
    pub fn new(product_id: i32, mut images: Vec<ProductImage>) -> Self {
        images.sort_by_key(|i| (i.order, i.id));
        Self { product_id, images }
    }

    pub fn product_id(&self) -> i32 {
        self.product_id
    }

    pub fn images(&self) -> &[ProductImage] {
        &self.images
    }

    pub fn into_images(self) -> Vec<ProductImage> {
        self.images
    }

    pub fn primary(&self) -> Option<&ProductImage> {
        self.images.iter().find(|i| i.is_primary)
    }

    /// Demote every primary image; returns the images that changed.
    pub fn demote_all(&mut self) -> Vec<ProductImage> {
        self.images
            .iter_mut()
            .filter(|i| i.is_primary)
            .map(|i| {
                i.remove_as_primary();
                i.clone()
            })
            .collect()
    }

    /// Make `image_id` the only primary image.
    ///
    /// Returns the images that changed, which is empty when the image was
    /// already primary.
    pub fn set_primary(&mut self, image_id: i32) -> CatalogResult<Vec<ProductImage>> {
        let target = self
            .images
            .iter()
            .position(|i| i.id == Some(image_id))
            .ok_or(CatalogError::ImageNotFound(image_id))?;

        if self.images[target].is_primary {
            return Ok(Vec::new());
        }

        let mut changed = self.demote_all();
        self.images[target].set_as_primary();
        changed.push(self.images[target].clone());
        Ok(changed)
    }

    /// Apply a batch of new positions.
    ///
    /// Nothing changes unless every image belongs to this product, no target
    /// order is requested twice, and no target collides with an image left
    /// out of the batch. Returns `(image_id, order)` for the images that moved.
    pub fn reorder(&mut self, orders: &[ImageOrder]) -> CatalogResult<Vec<(i32, i32)>> {
        let own: HashSet<i32> = self.images.iter().filter_map(|i| i.id).collect();

        let foreign: BTreeSet<i32> = orders
            .iter()
            .map(|o| o.image_id)
            .filter(|id| !own.contains(id))
            .collect();
        if !foreign.is_empty() {
            return Err(CatalogError::validation(
                "orders",
                format!(
                    "Images {} do not belong to product {}",
                    join(&foreign),
                    self.product_id
                ),
            ));
        }

        let duplicates = repeated(orders.iter().map(|o| o.order));
        if !duplicates.is_empty() {
            return Err(CatalogError::validation(
                "orders",
                format!("Duplicate orders in request: {}", join(&duplicates)),
            ));
        }

        let repeated_ids = repeated(orders.iter().map(|o| o.image_id));
        if !repeated_ids.is_empty() {
            return Err(CatalogError::validation(
                "orders",
                format!("Images listed more than once: {}", join(&repeated_ids)),
            ));
        }

        let targets: BTreeMap<i32, i32> = orders.iter().map(|o| (o.image_id, o.order)).collect();
        if let Some(untouched) = self.images.iter().find(|i| {
            i.id.is_some_and(|id| !targets.contains_key(&id))
                && targets.values().any(|&order| order == i.order)
        }) {
            return Err(CatalogError::OrderTaken {
                product_id: self.product_id,
                order: untouched.order,
            });
        }

        let mut moved = Vec::new();
        for image in &mut self.images {
            let Some(id) = image.id else { continue };
            match targets.get(&id) {
                Some(&order) if image.order != order => {
                    image.move_to(order);
                    moved.push((id, order));
                }
                _ => {}
            }
        }
        self.images.sort_by_key(|i| (i.order, i.id));
        Ok(moved)
    }
}

fn repeated(values: impl Iterator<Item = i32>) -> BTreeSet<i32> {
    let mut seen = HashSet::new();
    values.filter(|v| !seen.insert(*v)).collect()
}

fn join(values: &BTreeSet<i32>) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
