use domain_kernel::Description;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{CreateRole, Role, RoleDto, UpdateRole};
use crate::repository::{RoleRepository, UserRepository, UsersUnitOfWork};

/// Service layer for Role business logic
#[derive(Clone)]
pub struct RoleService<U: UsersUnitOfWork> {
    uow: Arc<U>,
}

impl<U: UsersUnitOfWork> RoleService<U> {
    pub fn new(uow: U) -> Self {
        Self { uow: Arc::new(uow) }
    }

    #[instrument(skip(self, input))]
    pub async fn create_role(&self, input: CreateRole) -> UserResult<RoleDto> {
        let description = parse_description(&input.description)?;

        if self
            .uow
            .roles()
            .description_exists(&description, None)
            .await?
        {
            return Err(UserError::DuplicateRole(description.into_inner()));
        }

        let role = self.uow.roles().add(Role::new(description)).await?;
        Ok(RoleDto::new(&role, 0))
    }

    #[instrument(skip(self, input))]
    pub async fn update_role(&self, id: i32, input: UpdateRole) -> UserResult<RoleDto> {
        let mut role = self.find(id).await?;
        let description = parse_description(&input.description)?;

        if self
            .uow
            .roles()
            .description_exists(&description, Some(id))
            .await?
        {
            return Err(UserError::DuplicateRole(description.into_inner()));
        }

        role.update_description(description);
        let role = self.uow.roles().update(role).await?;
        let users = self.uow.users().count_by_role(id).await?;
        Ok(RoleDto::new(&role, users))
    }

    /// Fails with a conflict while any user is assigned to the role.
    #[instrument(skip(self))]
    pub async fn delete_role(&self, id: i32) -> UserResult<()> {
        self.find(id).await?;

        let users = self.uow.users().count_by_role(id).await?;
        if users > 0 {
            return Err(UserError::RoleInUse { role_id: id, users });
        }

        if !self.uow.roles().remove(id).await? {
            return Err(UserError::RoleNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_role(&self, id: i32) -> UserResult<RoleDto> {
        let role = self.find(id).await?;
        let users = self.uow.users().count_by_role(id).await?;
        Ok(RoleDto::new(&role, users))
    }

    /// All roles; user counts come from one grouped query when requested.
    #[instrument(skip(self))]
    pub async fn list_roles(&self, include_user_count: bool) -> UserResult<Vec<RoleDto>> {
        let roles = self.uow.roles().get_all().await?;
        if !include_user_count {
            return Ok(roles.iter().map(|r| RoleDto::new(r, 0)).collect());
        }

        let ids: Vec<i32> = roles.iter().filter_map(Role::id).collect();
        let counts = self.uow.users().count_by_roles(&ids).await?;
        Ok(roles
            .iter()
            .map(|r| {
                let users = r.id().and_then(|id| counts.get(&id).copied()).unwrap_or(0);
                RoleDto::new(r, users)
            })
            .collect())
    }

    /// Roles a new user can be assigned to
    #[instrument(skip(self))]
    pub async fn available_roles(&self) -> UserResult<Vec<RoleDto>> {
        self.list_roles(false).await
    }

    async fn find(&self, id: i32) -> UserResult<Role> {
        self.uow
            .roles()
            .get_by_id(id)
            .await?
            .ok_or(UserError::RoleNotFound(id))
    }
}

fn parse_description(raw: &str) -> UserResult<Description> {
    if raw.trim().is_empty() {
        return Err(UserError::validation(
            "description",
            "Role description is required",
        ));
    }
    Ok(Description::parse(raw)?)
}
