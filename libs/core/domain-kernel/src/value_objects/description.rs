use crate::ValidationError;
use serde::{Deserialize, Serialize};

pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Free text up to 1000 characters. Blank input yields the empty
/// description; otherwise the text is trimmed and its case preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Description(String);

impl Description {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::new(
                "description",
                format!(
                    "Description cannot exceed {} characters",
                    MAX_DESCRIPTION_LEN
                ),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Case-insensitive comparison key.
    pub fn folded(&self) -> String {
        self.0.to_lowercase()
    }
}

super::string_value_object!(Description);
