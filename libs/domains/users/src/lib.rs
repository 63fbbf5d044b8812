//! Users Domain
//!
//! Roles, users and the password/token login flow.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ RoleService / UserService /  │  ← Business rules, validation order
//! │ AuthService                  │
//! └──────┬───────────────┬───────┘
//!        │               │
//! ┌──────▼──────┐ ┌──────▼──────────────────┐
//! │ UnitOfWork  │ │ PasswordHasher /        │  ← Collaborators
//! │ users/roles │ │ TokenIssuer             │
//! └──────┬──────┘ └─────────────────────────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Role, User, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_users::{Argon2PasswordHasher, InMemoryUsersUnitOfWork, RoleService, UserService};
//!
//! let uow = InMemoryUsersUnitOfWork::new();
//! let roles = RoleService::new(uow.clone());
//! let users = UserService::new(uow, Argon2PasswordHasher::new());
//! ```

pub mod entity;
pub mod error;
pub mod models;
pub mod password;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod token;

pub use error::{UserError, UserResult};
pub use models::{
    ChangePassword, CreateRole, CreateUser, LoginRequest, LoginResponse, Role, RoleDto,
    UpdateRole, UpdateUser, User, UserDto, UserInfo,
};
pub use password::{Argon2PasswordHasher, PasswordHasher};
pub use postgres::PgUsersUnitOfWork;
pub use repository::{InMemoryUsersUnitOfWork, RoleRepository, UserRepository, UsersUnitOfWork};
pub use service::{AuthService, RoleService, UserService};
pub use token::{Claims, JwtTokenIssuer, TokenIssuer};
