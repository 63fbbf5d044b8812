use domain_kernel::Email;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

use crate::error::UserError;
use crate::models::User;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub role_id: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for User {
    type Error = UserError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let email = Email::parse(&model.email).map_err(|e| {
            UserError::Internal(format!("Stored user {} is invalid: {}", model.id, e))
        })?;

        Ok(User {
            id: Some(model.id),
            email,
            password_hash: model.password_hash,
            role_id: model.role_id,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.map(Into::into),
        })
    }
}

impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        ActiveModel {
            id: super::id_value(user.id),
            email: Set(user.email.to_string()),
            password_hash: Set(user.password_hash.clone()),
            role_id: Set(user.role_id),
            created_at: Set(user.created_at.into()),
            updated_at: Set(user.updated_at.map(Into::into)),
        }
    }
}
