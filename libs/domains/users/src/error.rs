use domain_kernel::{ErrorKind, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("User {0} not found")]
    UserNotFound(i32),

    #[error("Role {0} not found")]
    RoleNotFound(i32),

    #[error("A user with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("A role with description '{0}' already exists")]
    DuplicateRole(String),

    #[error("Role {role_id} cannot be deleted because {users} user(s) are assigned to it")]
    RoleInUse { role_id: i32, users: u64 },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User role is not configured")]
    RoleNotConfigured,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UserError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UserError::Validation(_) => ErrorKind::Validation,
            UserError::UserNotFound(_) | UserError::RoleNotFound(_) => ErrorKind::NotFound,
            UserError::DuplicateEmail(_)
            | UserError::DuplicateRole(_)
            | UserError::RoleInUse { .. } => ErrorKind::Conflict,
            UserError::InvalidCredentials => ErrorKind::Unauthorized,
            UserError::RoleNotConfigured
            | UserError::PasswordHash(_)
            | UserError::Token(_)
            | UserError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        UserError::Validation(ValidationError::new(field, message))
    }
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        UserError::Internal(format!("Database error: {}", err))
    }
}

pub type UserResult<T> = Result<T, UserError>;
