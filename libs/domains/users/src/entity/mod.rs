//! Sea-ORM entities for the `roles` and `users` tables.
//!
//! Relations are intentionally left empty: cross-table lookups are explicit
//! repository queries.

pub mod role;
pub mod user;

use sea_orm::ActiveValue::{self, NotSet, Set};

pub(crate) fn id_value(id: Option<i32>) -> ActiveValue<i32> {
    match id {
        Some(id) => Set(id),
        None => NotSet,
    }
}
