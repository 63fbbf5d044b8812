use domain_kernel::{Description, Name};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

use crate::error::CatalogError;
use crate::models::Category;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub parent_category_id: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Category {
    type Error = CatalogError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let name =
            Name::parse(&model.name).map_err(|e| super::corrupt_row("category", model.id, e))?;
        let description = Description::parse(&model.description)
            .map_err(|e| super::corrupt_row("category", model.id, e))?;

        Ok(Category {
            id: Some(model.id),
            name,
            description,
            is_active: model.is_active,
            parent_id: model.parent_category_id,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.map(Into::into),
        })
    }
}

impl From<&Category> for ActiveModel {
    fn from(category: &Category) -> Self {
        ActiveModel {
            id: super::id_value(category.id),
            name: Set(category.name.to_string()),
            description: Set(category.description.to_string()),
            is_active: Set(category.is_active),
            parent_category_id: Set(category.parent_id),
            created_at: Set(category.created_at.into()),
            updated_at: Set(category.updated_at.map(Into::into)),
        }
    }
}
