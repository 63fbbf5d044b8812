use domain_kernel::{Email, PageRequest, PagedResult};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{ChangePassword, CreateUser, Role, UpdateUser, User, UserDto};
use crate::password::PasswordHasher;
use crate::repository::{RoleRepository, UserRepository, UsersUnitOfWork};

/// Service layer for User business logic
#[derive(Clone)]
pub struct UserService<U: UsersUnitOfWork, H: PasswordHasher> {
    uow: Arc<U>,
    hasher: Arc<H>,
}

impl<U: UsersUnitOfWork, H: PasswordHasher> UserService<U, H> {
    pub fn new(uow: U, hasher: H) -> Self {
        Self {
            uow: Arc::new(uow),
            hasher: Arc::new(hasher),
        }
    }

    #[instrument(skip(self, input), fields(role_id = input.role_id))]
    pub async fn create_user(&self, input: CreateUser) -> UserResult<UserDto> {
        let email = Email::parse(&input.email)?;

        if self.uow.users().email_exists(&email, None).await? {
            return Err(UserError::DuplicateEmail(email.into_inner()));
        }

        let role = self.find_role(input.role_id).await?;
        let password_hash = self.hash_new_password(&input.password)?;

        let user = self
            .uow
            .users()
            .add(User::new(email, password_hash, input.role_id))
            .await?;

        tracing::info!(user_id = ?user.id(), role_id = input.role_id, "Registered user");
        Ok(UserDto::new(&user, role.description().as_str()))
    }

    #[instrument(skip(self, input))]
    pub async fn update_user(&self, id: i32, input: UpdateUser) -> UserResult<UserDto> {
        let mut user = self.find_user(id).await?;
        let email = Email::parse(&input.email)?;

        if self.uow.users().email_exists(&email, Some(id)).await? {
            return Err(UserError::DuplicateEmail(email.into_inner()));
        }

        let role = self.find_role(input.role_id).await?;

        if user.email() != &email {
            user.change_email(email);
        }
        if user.role_id() != input.role_id {
            user.change_role(input.role_id);
        }

        let user = self.uow.users().update(user).await?;
        Ok(UserDto::new(&user, role.description().as_str()))
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i32) -> UserResult<()> {
        self.find_user(id).await?;

        if !self.uow.users().remove(id).await? {
            return Err(UserError::UserNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i32) -> UserResult<UserDto> {
        let user = self.find_user(id).await?;
        let role_name = self
            .uow
            .roles()
            .get_by_id(user.role_id())
            .await?
            .map(|r| r.description().as_str().to_string())
            .unwrap_or_default();
        Ok(UserDto::new(&user, role_name))
    }

    /// One page of users ordered by id, with role names resolved in a single lookup.
    #[instrument(skip(self))]
    pub async fn list_users(&self, page: u32, page_size: u32) -> UserResult<PagedResult<UserDto>> {
        let request = PageRequest::new(page, page_size)?;

        let total = self.uow.users().count().await?;
        let users = self
            .uow
            .users()
            .list_page(request.offset(), request.limit())
            .await?;

        let role_ids: Vec<i32> = users
            .iter()
            .map(User::role_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let role_names: HashMap<i32, String> = self
            .uow
            .roles()
            .get_by_ids(&role_ids)
            .await?
            .into_iter()
            .filter_map(|r| r.id().map(|id| (id, r.description().as_str().to_string())))
            .collect();

        let items = users
            .iter()
            .map(|u| {
                let role_name = role_names.get(&u.role_id()).cloned().unwrap_or_default();
                UserDto::new(u, role_name)
            })
            .collect();

        Ok(PagedResult::new(items, total, request))
    }

    /// Replace the password after checking the current one.
    #[instrument(skip(self, input))]
    pub async fn change_password(&self, id: i32, input: ChangePassword) -> UserResult<()> {
        let mut user = self.find_user(id).await?;

        if !self
            .hasher
            .verify(&input.current_password, user.password_hash())?
        {
            tracing::warn!(user_id = id, "Password change rejected");
            return Err(UserError::InvalidCredentials);
        }

        let password_hash = self.hash_new_password(&input.new_password)?;
        user.change_password_hash(password_hash);
        self.uow.users().update(user).await?;

        tracing::info!(user_id = id, "Password changed");
        Ok(())
    }

    async fn find_user(&self, id: i32) -> UserResult<User> {
        self.uow
            .users()
            .get_by_id(id)
            .await?
            .ok_or(UserError::UserNotFound(id))
    }

    async fn find_role(&self, id: i32) -> UserResult<Role> {
        self.uow
            .roles()
            .get_by_id(id)
            .await?
            .ok_or(UserError::RoleNotFound(id))
    }

    fn hash_new_password(&self, password: &str) -> UserResult<String> {
        if password.trim().is_empty() {
            return Err(UserError::validation("password", "Password is required"));
        }
        self.hasher.hash(password)
    }
}
