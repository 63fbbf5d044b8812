use domain_kernel::Description;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

use crate::error::UserError;
use crate::models::Role;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub description: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Role {
    type Error = UserError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let description = Description::parse(&model.description).map_err(|e| {
            UserError::Internal(format!("Stored role {} is invalid: {}", model.id, e))
        })?;

        Ok(Role {
            id: Some(model.id),
            description,
            created_at: model.created_at.into(),
        })
    }
}

impl From<&Role> for ActiveModel {
    fn from(role: &Role) -> Self {
        ActiveModel {
            id: super::id_value(role.id),
            description: Set(role.description.to_string()),
            created_at: Set(role.created_at.into()),
        }
    }
}
