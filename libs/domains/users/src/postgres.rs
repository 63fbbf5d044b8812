use async_trait::async_trait;
use database::postgres::{is_foreign_key_violation, is_unique_violation};
use domain_kernel::{Description, Email};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use std::collections::HashMap;

use crate::entity::{role, user};
use crate::error::{UserError, UserResult};
use crate::models::{Role, User};
use crate::repository::{RoleRepository, UserRepository, UsersUnitOfWork};

/// PostgreSQL unit of work for roles and users
#[derive(Clone)]
pub struct PgUsersUnitOfWork {
    users: PgUserRepository,
    roles: PgRoleRepository,
}

impl PgUsersUnitOfWork {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: PgUserRepository { db: db.clone() },
            roles: PgRoleRepository { db },
        }
    }
}

impl UsersUnitOfWork for PgUsersUnitOfWork {
    type Users = PgUserRepository;
    type Roles = PgRoleRepository;

    fn users(&self) -> &Self::Users {
        &self.users
    }

    fn roles(&self) -> &Self::Roles {
        &self.roles
    }
}

#[derive(Clone)]
pub struct PgRoleRepository {
    db: DatabaseConnection,
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn get_by_id(&self, id: i32) -> UserResult<Option<Role>> {
        role::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Role::try_from)
            .transpose()
    }

    async fn get_all(&self) -> UserResult<Vec<Role>> {
        role::Entity::find()
            .order_by_asc(role::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Role::try_from)
            .collect()
    }

    async fn get_by_ids(&self, ids: &[i32]) -> UserResult<Vec<Role>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        role::Entity::find()
            .filter(role::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(Role::try_from)
            .collect()
    }

    async fn description_exists(
        &self,
        description: &Description,
        exclude_id: Option<i32>,
    ) -> UserResult<bool> {
        let mut query = role::Entity::find().filter(Expr::cust_with_values(
            "LOWER(\"description\") = $1",
            [description.folded()],
        ));
        if let Some(id) = exclude_id {
            query = query.filter(role::Column::Id.ne(id));
        }

        Ok(query.count(&self.db).await? > 0)
    }

    async fn add(&self, role: Role) -> UserResult<Role> {
        let model = role::ActiveModel::from(&role).insert(&self.db).await?;

        tracing::info!(role_id = model.id, "Created role");
        Role::try_from(model)
    }

    async fn update(&self, role: Role) -> UserResult<Role> {
        let id = role.id.ok_or_else(|| UserError::Internal("Role has no id".to_string()))?;
        let model = role::ActiveModel::from(&role)
            .update(&self.db)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => UserError::RoleNotFound(id),
                other => other.into(),
            })?;

        tracing::info!(role_id = id, "Updated role");
        Role::try_from(model)
    }

    async fn remove(&self, id: i32) -> UserResult<bool> {
        let result = match role::Entity::delete_by_id(id).exec(&self.db).await {
            Ok(result) => result,
            Err(e) if is_foreign_key_violation(&e) => {
                let users = user::Entity::find()
                    .filter(user::Column::RoleId.eq(id))
                    .count(&self.db)
                    .await?;
                return Err(UserError::RoleInUse { role_id: id, users });
            }
            Err(e) => return Err(e.into()),
        };

        if result.rows_affected > 0 {
            tracing::info!(role_id = id, "Deleted role");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct RoleUserCount {
    role_id: i32,
    users: i64,
}

impl PgUserRepository {
    fn map_write_error(err: DbErr, user: &User) -> UserError {
        if is_unique_violation(&err) {
            UserError::DuplicateEmail(user.email.to_string())
        } else if is_foreign_key_violation(&err) {
            UserError::RoleNotFound(user.role_id)
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_by_id(&self, id: i32) -> UserResult<Option<User>> {
        user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn get_all(&self) -> UserResult<Vec<User>> {
        user::Entity::find()
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn find_by_email(&self, email: &Email) -> UserResult<Option<User>> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(&self.db)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn email_exists(&self, email: &Email, exclude_id: Option<i32>) -> UserResult<bool> {
        let mut query = user::Entity::find().filter(user::Column::Email.eq(email.as_str()));
        if let Some(id) = exclude_id {
            query = query.filter(user::Column::Id.ne(id));
        }

        Ok(query.count(&self.db).await? > 0)
    }

    async fn count_by_role(&self, role_id: i32) -> UserResult<u64> {
        Ok(user::Entity::find()
            .filter(user::Column::RoleId.eq(role_id))
            .count(&self.db)
            .await?)
    }

    async fn count_by_roles(&self, role_ids: &[i32]) -> UserResult<HashMap<i32, u64>> {
        let mut counts: HashMap<i32, u64> = role_ids.iter().map(|&id| (id, 0)).collect();
        if role_ids.is_empty() {
            return Ok(counts);
        }

        let rows = user::Entity::find()
            .select_only()
            .column(user::Column::RoleId)
            .column_as(user::Column::Id.count(), "users")
            .filter(user::Column::RoleId.is_in(role_ids.iter().copied()))
            .group_by(user::Column::RoleId)
            .into_model::<RoleUserCount>()
            .all(&self.db)
            .await?;

        for row in rows {
            counts.insert(row.role_id, row.users.max(0) as u64);
        }
        Ok(counts)
    }

    async fn list_page(&self, offset: u64, limit: u64) -> UserResult<Vec<User>> {
        user::Entity::find()
            .order_by_asc(user::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn count(&self) -> UserResult<u64> {
        Ok(user::Entity::find().count(&self.db).await?)
    }

    async fn add(&self, user: User) -> UserResult<User> {
        let model = user::ActiveModel::from(&user)
            .insert(&self.db)
            .await
            .map_err(|e| Self::map_write_error(e, &user))?;

        tracing::info!(user_id = model.id, "Created user");
        User::try_from(model)
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let id = user.id.ok_or_else(|| UserError::Internal("User has no id".to_string()))?;
        let model = user::ActiveModel::from(&user)
            .update(&self.db)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => UserError::UserNotFound(id),
                other => Self::map_write_error(other, &user),
            })?;

        tracing::info!(user_id = id, "Updated user");
        User::try_from(model)
    }

    async fn remove(&self, id: i32) -> UserResult<bool> {
        let result = user::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected > 0 {
            tracing::info!(user_id = id, "Deleted user");
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
