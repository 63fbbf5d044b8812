use domain_kernel::{Description, Money, Name, Sku};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

use crate::error::CatalogError;
use crate::models::Product;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub sku: String,
    pub name: String,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((18, 2)))")]
    pub price_amount: Decimal,
    pub price_currency: String,
    pub category_id: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Product {
    type Error = CatalogError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let invalid = |e| super::corrupt_row("product", model.id, e);

        Ok(Product {
            id: Some(model.id),
            sku: Sku::parse(&model.sku).map_err(invalid)?,
            name: Name::parse(&model.name).map_err(invalid)?,
            description: Description::parse(&model.description).map_err(invalid)?,
            price: Money::new(model.price_amount, &model.price_currency).map_err(invalid)?,
            category_id: model.category_id,
            is_active: model.is_active,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.map(Into::into),
        })
    }
}

impl From<&Product> for ActiveModel {
    fn from(product: &Product) -> Self {
        ActiveModel {
            id: super::id_value(product.id),
            sku: Set(product.sku.to_string()),
            name: Set(product.name.to_string()),
            description: Set(product.description.to_string()),
            price_amount: Set(product.price.amount()),
            price_currency: Set(product.price.currency().to_string()),
            category_id: Set(product.category_id),
            is_active: Set(product.is_active),
            created_at: Set(product.created_at.into()),
            updated_at: Set(product.updated_at.map(Into::into)),
        }
    }
}
