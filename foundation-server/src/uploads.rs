//! Registration photo storage
//!
//! Photos are written under `{upload_dir}/photos/{sha256}.{ext}`; the same
//! bytes always land on the same path, so re-uploads are idempotent.

use std::path::Path;

use sha2::{Digest, Sha256};
use shared::error::{AppError, ErrorCode};

/// Maximum photo size (5MB)
pub const MAX_PHOTO_SIZE: usize = 5 * 1024 * 1024;

const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// A photo received in a multipart form
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl PhotoUpload {
    /// Lower-case extension from the file name, else from the content type
    fn extension(&self) -> Option<String> {
        let from_name = self
            .file_name
            .as_deref()
            .and_then(|f| Path::new(f).extension())
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        from_name.or_else(|| {
            let mime = self.content_type.as_deref()?;
            mime_guess::get_mime_extensions_str(mime)?
                .iter()
                .find(|e| SUPPORTED_FORMATS.contains(e))
                .map(|e| e.to_string())
        })
    }

    /// Size and format checks; returns the extension to store under
    pub fn validate(&self) -> Result<String, AppError> {
        if self.data.is_empty() {
            return Err(AppError::new(ErrorCode::EmptyFile));
        }
        if self.data.len() > MAX_PHOTO_SIZE {
            return Err(AppError::with_message(
                ErrorCode::FileTooLarge,
                format!("Photo too large: {} bytes (max {MAX_PHOTO_SIZE})", self.data.len()),
            ));
        }
        let ext = self.extension().unwrap_or_default();
        if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
            return Err(AppError::with_message(
                ErrorCode::UnsupportedFileFormat,
                format!("Unsupported format: {ext}. Supported: png, jpg, jpeg, webp"),
            ));
        }
        Ok(ext)
    }
}

/// A photo on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    /// Path relative to `upload_dir`
    pub path: String,
    /// False when identical bytes were already stored
    pub newly_written: bool,
}

/// Write the photo under its content hash
pub async fn store_photo(upload_dir: &Path, photo: &PhotoUpload) -> Result<StoredPhoto, AppError> {
    let ext = photo.validate()?;
    let hash = hex::encode(Sha256::digest(&photo.data));
    let relative = format!("photos/{hash}.{ext}");
    let full = upload_dir.join(&relative);

    let dir = upload_dir.join("photos");
    let write = async {
        tokio::fs::create_dir_all(&dir).await?;
        let existed = tokio::fs::try_exists(&full).await?;
        if !existed {
            tokio::fs::write(&full, &photo.data).await?;
        }
        std::io::Result::Ok(!existed)
    };
    let newly_written = write.await.map_err(|e| {
        tracing::error!(error = %e, path = %relative, "Photo write failed");
        AppError::new(ErrorCode::FileStorageFailed)
    })?;

    tracing::info!(path = %relative, bytes = photo.data.len(), newly_written, "Photo stored");
    Ok(StoredPhoto {
        path: relative,
        newly_written,
    })
}

/// Delete a photo this request wrote; photos that were already on disk stay
pub async fn discard_photo(upload_dir: &Path, photo: &StoredPhoto) {
    if !photo.newly_written {
        return;
    }
    if let Err(e) = tokio::fs::remove_file(upload_dir.join(&photo.path)).await {
        tracing::warn!(error = %e, path = %photo.path, "Failed to remove orphaned photo");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(name: Option<&str>, mime: Option<&str>, data: &[u8]) -> PhotoUpload {
        PhotoUpload {
            file_name: name.map(String::from),
            content_type: mime.map(String::from),
            data: data.to_vec(),
        }
    }

    #[tokio::test]
    async fn stores_by_content_hash() {
        let dir = tempfile::tempdir().unwrap();
        let p = photo(Some("Me.JPG"), None, b"fake-jpeg-bytes");
        let stored = store_photo(dir.path(), &p).await.unwrap();
        assert!(stored.newly_written);
        assert!(stored.path.starts_with("photos/"));
        assert!(stored.path.ends_with(".jpg"));
        assert_eq!(std::fs::read(dir.path().join(&stored.path)).unwrap(), b"fake-jpeg-bytes");

        let again = store_photo(dir.path(), &p).await.unwrap();
        assert_eq!(again.path, stored.path);
        assert!(!again.newly_written);

        // Only the write that created the file may remove it
        discard_photo(dir.path(), &again).await;
        assert!(dir.path().join(&stored.path).exists());
        discard_photo(dir.path(), &stored).await;
        assert!(!dir.path().join(&stored.path).exists());
    }

    #[test]
    fn extension_falls_back_to_content_type() {
        let p = photo(None, Some("image/png"), b"x");
        assert_eq!(p.validate().unwrap(), "png");
    }

    #[test]
    fn rejects_bad_uploads() {
        assert_eq!(
            photo(Some("a.png"), None, b"").validate().unwrap_err().code,
            ErrorCode::EmptyFile
        );
        assert_eq!(
            photo(Some("a.gif"), None, b"x").validate().unwrap_err().code,
            ErrorCode::UnsupportedFileFormat
        );
        let big = vec![0u8; MAX_PHOTO_SIZE + 1];
        assert_eq!(
            photo(Some("a.png"), None, &big).validate().unwrap_err().code,
            ErrorCode::FileTooLarge
        );
    }
}
