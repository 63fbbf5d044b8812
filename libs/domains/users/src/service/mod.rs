//! Use cases for roles, users and login.
//!
//! Each operation checks its preconditions in a fixed order and returns the
//! first failure.

mod auth;
mod roles;
mod users;

pub use auth::AuthService;
pub use roles::RoleService;
pub use users::UserService;
