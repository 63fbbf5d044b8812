use crate::{env_or_default, ConfigError, FromEnv};
use std::path::PathBuf;

pub const DEFAULT_IMAGE_DIR: &str = "./images";
pub const DEFAULT_IMAGE_BASE_URL: &str = "http://localhost:8080/images/";

/// Where uploaded product images are written and how they are addressed.
///
/// - `IMAGE_STORAGE_DIR` (default: "./images")
/// - `IMAGE_BASE_URL` (default: "http://localhost:8080/images/"), must be an
///   absolute http(s) URL because stored image URLs are validated as such
#[derive(Clone, Debug)]
pub struct ImageStorageConfig {
    pub directory: PathBuf,
    pub base_url: String,
}

impl ImageStorageConfig {
    pub fn new(directory: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            base_url: normalize_base_url(base_url.into()),
        }
    }
}

fn normalize_base_url(mut base_url: String) -> String {
    if !base_url.ends_with('/') {
        base_url.push('/');
    }
    base_url
}

impl FromEnv for ImageStorageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = env_or_default("IMAGE_BASE_URL", DEFAULT_IMAGE_BASE_URL);
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::ParseError {
                key: "IMAGE_BASE_URL".to_string(),
                details: format!("must be an absolute http(s) URL, got '{}'", base_url),
            });
        }

        Ok(Self::new(
            env_or_default("IMAGE_STORAGE_DIR", DEFAULT_IMAGE_DIR),
            base_url,
        ))
    }
}
