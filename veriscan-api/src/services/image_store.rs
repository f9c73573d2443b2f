//! Filename-addressed store for uploaded images
//!
//! Uploaded bytes are written under a fresh UUID filename (original
//! extension kept) and referenced everywhere else by the opaque
//! `/uploads/<name>` path the workflow engine consumes. The directory is
//! served statically by the router.

use std::path::{Path, PathBuf};
use uuid::Uuid;
use veriscan_common::{Error, Result};

/// Public path prefix uploaded images are served under
pub const UPLOADS_PREFIX: &str = "/uploads";

#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist uploaded bytes; returns the opaque image ref
    pub async fn save(&self, original_name: Option<&str>, bytes: &[u8]) -> Result<String> {
        if bytes.is_empty() {
            return Err(Error::InvalidInput("Uploaded image is empty".to_string()));
        }

        let filename = Self::storage_name(original_name);
        let path = self.dir.join(&filename);

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(path = %path.display(), "Stored uploaded image");
        Ok(format!("{}/{}", UPLOADS_PREFIX, filename))
    }

    /// UUID filename, keeping a plausible extension from the original name
    fn storage_name(original_name: Option<&str>) -> String {
        let ext = original_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin");

        format!("{}.{}", Uuid::new_v4().simple(), ext.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_name_keeps_extension() {
        let name = ImageStore::storage_name(Some("label-photo.JPG"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), 32 + 4);
    }

    #[test]
    fn test_storage_name_rejects_odd_extensions() {
        assert!(ImageStore::storage_name(Some("x.reallylongext")).ends_with(".bin"));
        assert!(ImageStore::storage_name(Some("no-extension")).ends_with(".bin"));
        assert!(ImageStore::storage_name(None).ends_with(".bin"));
    }

    #[tokio::test]
    async fn test_save_writes_file_and_returns_ref() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let image_ref = store.save(Some("ad.png"), b"fake-png-bytes").await.unwrap();
        assert!(image_ref.starts_with("/uploads/"));
        assert!(image_ref.ends_with(".png"));

        let on_disk = dir.path().join(image_ref.trim_start_matches("/uploads/"));
        assert_eq!(std::fs::read(on_disk).unwrap(), b"fake-png-bytes");
    }

    #[tokio::test]
    async fn test_save_rejects_empty_upload() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        assert!(store.save(Some("ad.png"), b"").await.is_err());
    }
}
