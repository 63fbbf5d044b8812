use chrono::{DateTime, Utc};
use domain_kernel::{Description, Email};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authorization role. The description doubles as the role name.
#[derive(Debug, Clone)]
pub struct Role {
    pub(crate) id: Option<i32>,
    pub(crate) description: Description,
    pub(crate) created_at: DateTime<Utc>,
}

impl Role {
    pub fn new(description: Description) -> Self {
        Self {
            id: None,
            description,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn update_description(&mut self, description: Description) {
        self.description = description;
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

/// Account that can log in. The password is only ever held as a hash.
#[derive(Clone)]
pub struct User {
    pub(crate) id: Option<i32>,
    pub(crate) email: Email,
    pub(crate) password_hash: String,
    pub(crate) role_id: i32,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(email: Email, password_hash: String, role_id: i32) -> Self {
        Self {
            id: None,
            email,
            password_hash,
            role_id,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn id(&self) -> Option<i32> {
        self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role_id(&self) -> i32 {
        self.role_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn change_email(&mut self, email: Email) {
        self.email = email;
        self.touch();
    }

    pub fn change_role(&mut self, role_id: i32) {
        self.role_id = role_id;
        self.touch();
    }

    pub fn change_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role_id", &self.role_id)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}

// Requests

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRole {
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRole {
    pub description: String,
}

#[derive(Clone, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub role_id: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUser {
    pub email: String,
    pub role_id: i32,
}

#[derive(Clone, Deserialize)]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

macro_rules! redacted_debug {
    ($ty:ident { $($field:ident),* }) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty))
                    $(.field(stringify!($field), &self.$field))*
                    .finish_non_exhaustive()
            }
        }
    };
}

redacted_debug!(CreateUser { email, role_id });
redacted_debug!(ChangePassword {});
redacted_debug!(LoginRequest { email });

// Responses

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleDto {
    pub id: i32,
    pub description: String,
    pub user_count: u64,
    pub created_at: DateTime<Utc>,
}

impl RoleDto {
    pub fn new(role: &Role, user_count: u64) -> Self {
        Self {
            id: role.id.unwrap_or_default(),
            description: role.description.to_string(),
            user_count,
            created_at: role.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub role_id: i32,
    pub role_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserDto {
    pub fn new(user: &User, role_name: impl Into<String>) -> Self {
        Self {
            id: user.id.unwrap_or_default(),
            email: user.email.to_string(),
            role_id: user.role_id,
            role_name: role_name.into(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserInfo {
    pub id: i32,
    pub email: String,
    pub role_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserInfo,
}
