use crate::errors::ServiceError;
use crate::models::PhotoRef;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tracing::{debug, warn};

/// Maximum accepted upload size (5 MiB).
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Filesystem-backed store for uploaded order photos.
///
/// Uploaded files are written under the configured uploads directory with a
/// collision-resistant name (epoch millis + random suffix, original extension
/// preserved). Default category images live in a separate bundled directory
/// and are never written or deleted by this store.
#[derive(Debug, Clone)]
pub struct ImageStore {
    upload_dir: PathBuf,
}

impl ImageStore {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    /// Create the uploads directory if it does not exist yet.
    pub async fn ensure_dirs(&self) -> Result<(), ServiceError> {
        fs::create_dir_all(&self.upload_dir).await?;
        Ok(())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Stores an uploaded image and returns the generated file name.
    ///
    /// Rejects non-image content types and files over [`MAX_FILE_SIZE`].
    pub async fn store(
        &self,
        bytes: &[u8],
        original_name: &str,
        content_type: Option<&str>,
    ) -> Result<String, ServiceError> {
        let is_image = content_type
            .map(|ct| ct.starts_with("image/"))
            .unwrap_or(false);
        if !is_image {
            return Err(ServiceError::ValidationError(
                "Not an image! Please upload only images.".to_string(),
            ));
        }

        if bytes.len() > MAX_FILE_SIZE {
            return Err(ServiceError::ValidationError(
                "File too large. Maximum size is 5MB.".to_string(),
            ));
        }

        let stored_name = unique_file_name(original_name);
        let path = self.upload_dir.join(&stored_name);
        fs::write(&path, bytes).await?;

        debug!(stored_name = %stored_name, size = bytes.len(), "stored uploaded photo");
        Ok(stored_name)
    }

    /// Removes a stored file. A missing file is not an error.
    pub async fn delete(&self, stored_name: &str) -> Result<(), ServiceError> {
        let path = self.upload_dir.join(stored_name);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(stored_name = %stored_name, "deleted uploaded photo");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ServiceError::StorageError(e.to_string())),
        }
    }

    /// Best-effort delete used on cleanup paths: failures are logged and
    /// swallowed so the original error (if any) reaches the client unchanged.
    pub async fn delete_best_effort(&self, stored_name: &str) {
        if let Err(e) = self.delete(stored_name).await {
            warn!(stored_name = %stored_name, error = %e, "failed to clean up uploaded photo");
        }
    }

    /// Whether a stored file currently exists on disk.
    pub async fn exists(&self, stored_name: &str) -> bool {
        fs::try_exists(self.upload_dir.join(stored_name))
            .await
            .unwrap_or(false)
    }

    /// Externally reachable URL for a photo reference.
    pub fn url_for(&self, photo: &PhotoRef, base_url: &str) -> String {
        match photo {
            PhotoRef::Owned(name) => format!("{base_url}/uploads/{name}"),
            PhotoRef::Default(category) => {
                format!("{base_url}/images/default/{}.jpg", category.slug())
            }
        }
    }
}

/// Collision-resistant file name: epoch millis, a 9-digit random suffix, and
/// the original extension.
fn unique_file_name(original_name: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!("{millis}-{suffix}{ext}")
}
