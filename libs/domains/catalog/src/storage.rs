use async_trait::async_trait;
use core_config::ImageStorageConfig;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};

/// Persists uploaded image bytes and hands back the public URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `bytes` under a fresh unique name keeping the extension of
    /// `file_name`; returns the absolute URL of the stored file.
    async fn save(&self, bytes: &[u8], file_name: &str) -> CatalogResult<String>;

    /// Bytes behind a URL previously returned by `save`, `None` when the
    /// file is gone.
    async fn get(&self, url: &str) -> CatalogResult<Option<Vec<u8>>>;

    /// Remove a file previously returned by `save`; `false` when it was
    /// already gone.
    async fn delete(&self, url: &str) -> CatalogResult<bool>;
}

/// Image store backed by a local directory.
#[derive(Clone, Debug)]
pub struct LocalImageStore {
    config: ImageStorageConfig,
}

impl LocalImageStore {
    pub fn new(config: ImageStorageConfig) -> Self {
        Self { config }
    }

    fn stored_name(file_name: &str) -> String {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

        match extension {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_ascii_lowercase()),
            None => Uuid::new_v4().to_string(),
        }
    }

    /// Path of the stored file behind `url`, if it points into this store.
    fn resolve(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(&self.config.base_url)?;
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return None;
        }
        Some(self.config.directory.join(name))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, bytes: &[u8], file_name: &str) -> CatalogResult<String> {
        if bytes.is_empty() {
            return Err(CatalogError::validation("image", "Image file is empty"));
        }

        tokio::fs::create_dir_all(&self.config.directory).await?;
        let name = Self::stored_name(file_name);
        tokio::fs::write(self.config.directory.join(&name), bytes).await?;

        tracing::debug!(file = %name, size = bytes.len(), "Stored image");
        Ok(format!("{}{}", self.config.base_url, name))
    }

    async fn get(&self, url: &str) -> CatalogResult<Option<Vec<u8>>> {
        let Some(path) = self.resolve(url) else {
            return Ok(None);
        };

        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, url: &str) -> CatalogResult<bool> {
        let Some(path) = self.resolve(url) else {
            return Ok(false);
        };

        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!(url, "Deleted image");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> LocalImageStore {
        LocalImageStore::new(ImageStorageConfig::new(dir, "https://cdn.example.com/images"))
    }

    #[tokio::test]
    async fn test_save_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let url = store.save(b"png-bytes", "Front View.PNG").await.unwrap();

        assert!(url.starts_with("https://cdn.example.com/images/"));
        assert!(url.ends_with(".png"));
        assert_eq!(store.get(&url).await.unwrap(), Some(b"png-bytes".to_vec()));
    }

    #[tokio::test]
    async fn test_each_save_gets_a_unique_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let first = store.save(b"a", "photo.jpg").await.unwrap();
        let second = store.save(b"b", "photo.jpg").await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("uploads").join("products");
        let store = store(&nested);

        store.save(b"bytes", "x.webp").await.unwrap();

        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = store(dir.path()).save(b"", "x.png").await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_unknown_or_foreign_urls() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        assert_eq!(store.get("https://cdn.example.com/images/missing.png").await.unwrap(), None);
        assert_eq!(store.get("https://elsewhere.example.com/a.png").await.unwrap(), None);
        assert_eq!(store.get("https://cdn.example.com/images/../secret").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_removes_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let url = store.save(b"bytes", "x.png").await.unwrap();

        assert!(store.delete(&url).await.unwrap());
        assert_eq!(store.get(&url).await.unwrap(), None);
        assert!(!store.delete(&url).await.unwrap());
        assert!(!store.delete("https://elsewhere.example.com/x.png").await.unwrap());
    }

    #[test]
    fn test_stored_name_drops_odd_extensions() {
        assert!(!LocalImageStore::stored_name("archive.tar gz").contains('.'));
        assert!(!LocalImageStore::stored_name("noext").contains('.'));
    }
}
