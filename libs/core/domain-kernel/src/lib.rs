//! Domain kernel
//!
//! Building blocks every domain crate shares:
//!
//! ```text
//! ┌──────────────────┐
//! │  Value objects   │  ← Email, Name, Description, Sku, Url, Money
//! └────────┬─────────┘
//!          │ parse(raw) -> Result<Self, ValidationError>
//! ┌────────▼─────────┐
//! │     Errors       │  ← ValidationError, ErrorKind
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │     Paging       │  ← PageRequest, PagedResult
//! └──────────────────┘
//! ```
//!
//! A value object can only be obtained through its parser, so holding one
//! is proof the canonical form was validated.

pub mod error;
pub mod paging;
pub mod value_objects;

pub use error::{ErrorKind, ValidationError};
pub use paging::{PageRequest, PagedResult, MAX_PAGE_SIZE};
pub use value_objects::{Description, Email, Money, Name, Sku, Url};
pub use rust_decimal::Decimal;
