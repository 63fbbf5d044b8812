use crate::ValidationError;
use serde::{Deserialize, Serialize};
use validator::ValidateUrl;

/// Absolute `http` or `https` URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Url(String);

impl Url {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::required("url", "URL"));
        }

        let web_scheme = trimmed
            .split_once("://")
            .map(|(scheme, _)| {
                scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
            })
            .unwrap_or(false);

        if !web_scheme || !trimmed.validate_url() {
            return Err(ValidationError::new(
                "url",
                "URL must be an absolute http or https address",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Last path segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        let path = self.0.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/').next().filter(|segment| !segment.is_empty())
    }
}

super::string_value_object!(Url);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(Url::parse("http://cdn.example.com/a.png").is_ok());
        assert!(Url::parse("HTTPS://cdn.example.com/a.png").is_ok());
        assert_eq!(
            Url::parse("  https://x.io/p.jpg ").unwrap().as_str(),
            "https://x.io/p.jpg"
        );
    }

    #[test]
    fn test_rejects_relative_and_other_schemes() {
        for raw in ["", "/images/a.png", "images/a.png", "ftp://x.io/a.png", "mailto:a@b.co"] {
            assert!(Url::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_file_name() {
        let url = Url::parse("http://localhost:8080/images/abc.png?v=2").unwrap();
        assert_eq!(url.file_name(), Some("abc.png"));
        assert_eq!(Url::parse("http://localhost:8080/").unwrap().file_name(), None);
    }
}
