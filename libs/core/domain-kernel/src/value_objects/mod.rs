//! Self-validating scalars.
//!
//! Every string-backed value object follows the same contract: a private
//! field, `parse(raw)` as the only constructor, and serde routed through
//! `parse` so deserialised values are validated too.

/// Shared conversions for newtypes that wrap a canonical `String` and expose
/// `parse(&str) -> Result<Self, ValidationError>`.
macro_rules! string_value_object {
    ($ty:ident) => {
        impl $ty {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = $crate::ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl TryFrom<&str> for $ty {
            type Error = $crate::ValidationError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }
    };
}

pub(crate) use string_value_object;

mod description;
mod email;
mod money;
mod name;
mod sku;
mod url;

pub use description::Description;
pub use email::Email;
pub use money::Money;
pub use name::Name;
pub use sku::Sku;
pub use url::Url;
