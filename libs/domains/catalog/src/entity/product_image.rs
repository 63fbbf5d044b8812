use domain_kernel::{Description, Url};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

use crate::error::CatalogError;
use crate::models::ProductImage;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "product_images")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_id: i32,
    pub url: String,
    pub alt: String,
    pub sort_order: i32,
    pub is_primary: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for ProductImage {
    type Error = CatalogError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let url =
            Url::parse(&model.url).map_err(|e| super::corrupt_row("product image", model.id, e))?;
        let alt = Description::parse(&model.alt)
            .map_err(|e| super::corrupt_row("product image", model.id, e))?;

        Ok(ProductImage {
            id: Some(model.id),
            product_id: model.product_id,
            url,
            alt,
            order: model.sort_order,
            is_primary: model.is_primary,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.map(Into::into),
        })
    }
}

impl From<&ProductImage> for ActiveModel {
    fn from(image: &ProductImage) -> Self {
        ActiveModel {
            id: super::id_value(image.id),
            product_id: Set(image.product_id),
            url: Set(image.url.to_string()),
            alt: Set(image.alt.to_string()),
            sort_order: Set(image.order),
            is_primary: Set(image.is_primary),
            created_at: Set(image.created_at.into()),
            updated_at: Set(image.updated_at.map(Into::into)),
        }
    }
}
