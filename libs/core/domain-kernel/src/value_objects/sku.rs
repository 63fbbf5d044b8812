use crate::ValidationError;
use serde::{Deserialize, Serialize};

pub const MIN_SKU_LEN: usize = 3;
pub const MAX_SKU_LEN: usize = 20;

/// Stock keeping unit: 3-20 ASCII letters, digits, `-` or `_`, upper-cased.
///
/// Input is not trimmed; surrounding whitespace is an invalid character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.trim().is_empty() {
            return Err(ValidationError::required("sku", "SKU"));
        }
        let len = raw.chars().count();
        if !(MIN_SKU_LEN..=MAX_SKU_LEN).contains(&len) {
            return Err(ValidationError::new(
                "sku",
                format!(
                    "SKU must be between {} and {} characters",
                    MIN_SKU_LEN, MAX_SKU_LEN
                ),
            ));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::new(
                "sku",
                "SKU may only contain letters, digits, hyphens and underscores",
            ));
        }
        Ok(Self(raw.to_ascii_uppercase()))
    }
}

super::string_value_object!(Sku);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upper_cases() {
        assert_eq!(Sku::parse("abc-1").unwrap().as_str(), "ABC-1");
        assert_eq!(Sku::parse("kb_mech_01").unwrap().as_str(), "KB_MECH_01");
    }

    #[test]
    fn test_length_bounds() {
        assert!(Sku::parse("ab").is_err());
        assert!(Sku::parse("abc").is_ok());
        assert!(Sku::parse(&"A".repeat(20)).is_ok());
        assert!(Sku::parse(&"A".repeat(21)).is_err());
    }

    #[test]
    fn test_rejects_invalid_characters() {
        assert!(Sku::parse("abc 1").is_err());
        assert!(Sku::parse(" abc1").is_err());
        assert!(Sku::parse("abc.1").is_err());
        assert!(Sku::parse("ÁBC1").is_err());
    }

    #[test]
    fn test_blank_is_required() {
        assert_eq!(Sku::parse("  ").unwrap_err().message(), "SKU is required");
    }
}
