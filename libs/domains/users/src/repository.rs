use async_trait::async_trait;
use domain_kernel::{Description, Email};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{Role, User};

/// Repository trait for Role persistence
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> UserResult<Option<Role>>;

    /// All roles ordered by id
    async fn get_all(&self) -> UserResult<Vec<Role>>;

    async fn get_by_ids(&self, ids: &[i32]) -> UserResult<Vec<Role>>;

    /// Case-insensitive description match, ignoring `exclude_id`
    async fn description_exists(
        &self,
        description: &Description,
        exclude_id: Option<i32>,
    ) -> UserResult<bool>;

    async fn add(&self, role: Role) -> UserResult<Role>;

    async fn update(&self, role: Role) -> UserResult<Role>;

    async fn remove(&self, id: i32) -> UserResult<bool>;
}

/// Repository trait for User persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> UserResult<Option<User>>;

    /// All users ordered by id
    async fn get_all(&self) -> UserResult<Vec<User>>;

    async fn find_by_email(&self, email: &Email) -> UserResult<Option<User>>;

    async fn email_exists(&self, email: &Email, exclude_id: Option<i32>) -> UserResult<bool>;

    async fn count_by_role(&self, role_id: i32) -> UserResult<u64>;

    /// Users per role for every id in `role_ids`; roles without users map to 0
    async fn count_by_roles(&self, role_ids: &[i32]) -> UserResult<HashMap<i32, u64>>;

    /// Users ordered by id
    async fn list_page(&self, offset: u64, limit: u64) -> UserResult<Vec<User>>;

    async fn count(&self) -> UserResult<u64>;

    async fn add(&self, user: User) -> UserResult<User>;

    async fn update(&self, user: User) -> UserResult<User>;

    async fn remove(&self, id: i32) -> UserResult<bool>;
}

/// Typed access to the users-side repositories
pub trait UsersUnitOfWork: Send + Sync {
    type Users: UserRepository;
    type Roles: RoleRepository;

    fn users(&self) -> &Self::Users;
    fn roles(&self) -> &Self::Roles;
}

#[derive(Debug, Default)]
struct Tables {
    roles: BTreeMap<i32, Role>,
    users: BTreeMap<i32, User>,
    last_role_id: i32,
    last_user_id: i32,
}

impl Tables {
    fn users_with_role(&self, role_id: i32) -> u64 {
        self.users.values().filter(|u| u.role_id == role_id).count() as u64
    }
}

/// In-memory unit of work (for development/testing).
///
/// Mirrors the storage constraints of the PostgreSQL schema: unique e-mail
/// and no role removal while users reference it.
#[derive(Debug, Clone)]
pub struct InMemoryUsersUnitOfWork {
    users: InMemoryUserRepository,
    roles: InMemoryRoleRepository,
}

impl InMemoryUsersUnitOfWork {
    pub fn new() -> Self {
        let tables = Arc::new(RwLock::new(Tables::default()));
        Self {
            users: InMemoryUserRepository {
                tables: tables.clone(),
            },
            roles: InMemoryRoleRepository { tables },
        }
    }
}

impl Default for InMemoryUsersUnitOfWork {
    fn default() -> Self {
        Self::new()
    }
}

impl UsersUnitOfWork for InMemoryUsersUnitOfWork {
    type Users = InMemoryUserRepository;
    type Roles = InMemoryRoleRepository;

    fn users(&self) -> &Self::Users {
        &self.users
    }

    fn roles(&self) -> &Self::Roles {
        &self.roles
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryRoleRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn get_by_id(&self, id: i32) -> UserResult<Option<Role>> {
        Ok(self.tables.read().await.roles.get(&id).cloned())
    }

    async fn get_all(&self) -> UserResult<Vec<Role>> {
        Ok(self.tables.read().await.roles.values().cloned().collect())
    }

    async fn get_by_ids(&self, ids: &[i32]) -> UserResult<Vec<Role>> {
        let tables = self.tables.read().await;
        Ok(tables
            .roles
            .values()
            .filter(|r| r.id.is_some_and(|id| ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn description_exists(
        &self,
        description: &Description,
        exclude_id: Option<i32>,
    ) -> UserResult<bool> {
        let folded = description.folded();
        let tables = self.tables.read().await;
        Ok(tables
            .roles
            .values()
            .any(|r| r.id != exclude_id && r.description.folded() == folded))
    }

    async fn add(&self, mut role: Role) -> UserResult<Role> {
        let mut tables = self.tables.write().await;
        tables.last_role_id += 1;
        let id = tables.last_role_id;
        role.id = Some(id);
        tables.roles.insert(id, role.clone());

        tracing::info!(role_id = id, "Created role");
        Ok(role)
    }

    async fn update(&self, role: Role) -> UserResult<Role> {
        let id = role.id.ok_or_else(|| UserError::Internal("Role has no id".to_string()))?;
        let mut tables = self.tables.write().await;
        let slot = tables.roles.get_mut(&id).ok_or(UserError::RoleNotFound(id))?;
        *slot = role.clone();

        tracing::info!(role_id = id, "Updated role");
        Ok(role)
    }

    async fn remove(&self, id: i32) -> UserResult<bool> {
        let mut tables = self.tables.write().await;
        let users = tables.users_with_role(id);
        if users > 0 {
            return Err(UserError::RoleInUse { role_id: id, users });
        }

        let removed = tables.roles.remove(&id).is_some();
        if removed {
            tracing::info!(role_id = id, "Deleted role");
        }
        Ok(removed)
    }
}

#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_by_id(&self, id: i32) -> UserResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_all(&self) -> UserResult<Vec<User>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn find_by_email(&self, email: &Email) -> UserResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| &u.email == email).cloned())
    }

    async fn email_exists(&self, email: &Email, exclude_id: Option<i32>) -> UserResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .any(|u| u.id != exclude_id && &u.email == email))
    }

    async fn count_by_role(&self, role_id: i32) -> UserResult<u64> {
        Ok(self.tables.read().await.users_with_role(role_id))
    }

    async fn count_by_roles(&self, role_ids: &[i32]) -> UserResult<HashMap<i32, u64>> {
        let tables = self.tables.read().await;
        Ok(role_ids
            .iter()
            .map(|&id| (id, tables.users_with_role(id)))
            .collect())
    }

    async fn list_page(&self, offset: u64, limit: u64) -> UserResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> UserResult<u64> {
        Ok(self.tables.read().await.users.len() as u64)
    }

    async fn add(&self, mut user: User) -> UserResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(UserError::DuplicateEmail(user.email.to_string()));
        }

        tables.last_user_id += 1;
        let id = tables.last_user_id;
        user.id = Some(id);
        tables.users.insert(id, user.clone());

        tracing::info!(user_id = id, "Created user");
        Ok(user)
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let id = user.id.ok_or_else(|| UserError::Internal("User has no id".to_string()))?;
        let mut tables = self.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.id != Some(id) && u.email == user.email)
        {
            return Err(UserError::DuplicateEmail(user.email.to_string()));
        }

        let slot = tables.users.get_mut(&id).ok_or(UserError::UserNotFound(id))?;
        *slot = user.clone();

        tracing::info!(user_id = id, "Updated user");
        Ok(user)
    }

    async fn remove(&self, id: i32) -> UserResult<bool> {
        let removed = self.tables.write().await.users.remove(&id).is_some();
        if removed {
            tracing::info!(user_id = id, "Deleted user");
        }
        Ok(removed)
    }
}
