use crate::ValidationError;
use serde::{Deserialize, Serialize};

pub const MIN_NAME_LEN: usize = 2;
pub const MAX_NAME_LEN: usize = 100;

/// Display name for categories and products, trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(String);

impl Name {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::required("name", "Name"));
        }
        let len = trimmed.chars().count();
        if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len) {
            return Err(ValidationError::new(
                "name",
                format!(
                    "Name must be between {} and {} characters",
                    MIN_NAME_LEN, MAX_NAME_LEN
                ),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }
}

super::string_value_object!(Name);
