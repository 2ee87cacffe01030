// Stored-image handling for review uploads

use std::path::PathBuf;

use tokio::fs;
use uuid::Uuid;

use crate::validation::validate_image_filename;

/// Errors raised while persisting an uploaded image
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes uploaded review images under a configured directory and hands
/// back the relative path stored on the review record
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Create a store rooted at the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create a store from the UPLOAD_DIR environment variable
    pub fn from_env() -> Self {
        let dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
        Self::new(dir)
    }

    /// Persist an uploaded image and return its stored path
    ///
    /// The original filename only contributes its extension; the stored
    /// name is a fresh uuid so concurrent uploads never collide.
    pub async fn store_image(&self, original_name: &str, data: &[u8]) -> Result<String, UploadError> {
        validate_image_filename(original_name)
            .map_err(|_| UploadError::UnsupportedType(original_name.to_string()))?;

        let extension = original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_else(|| "jpg".to_string());

        fs::create_dir_all(&self.dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.dir.join(&file_name);
        fs::write(&path, data).await?;

        tracing::debug!("Stored review image at {}", path.display());
        Ok(path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> UploadStore {
        let dir = std::env::temp_dir().join(format!("review-uploads-{}", Uuid::new_v4()));
        UploadStore::new(dir)
    }

    #[tokio::test]
    async fn test_store_image_writes_file() {
        let store = temp_store();

        let path = store
            .store_image("photo.png", b"not-really-a-png")
            .await
            .expect("Failed to store image");

        assert!(path.ends_with(".png"));
        let written = tokio::fs::read(&path).await.expect("Stored file missing");
        assert_eq!(written, b"not-really-a-png");
    }

    #[tokio::test]
    async fn test_store_image_generates_unique_names() {
        let store = temp_store();

        let first = store.store_image("a.jpg", b"one").await.unwrap();
        let second = store.store_image("a.jpg", b"two").await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_store_image_rejects_unsupported_type() {
        let store = temp_store();

        let result = store.store_image("malware.exe", b"nope").await;

        assert!(matches!(result, Err(UploadError::UnsupportedType(_))));
    }
}
