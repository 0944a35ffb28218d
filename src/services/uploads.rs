//! Trainer photo storage on the local filesystem.
//!
//! Files are written to the configured upload directory under a random
//! `<uuid>.<ext>` name and served publicly at `/uploads/<name>`.

use std::path::PathBuf;

use crate::error::AppError;

/// Largest accepted photo.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Public URL prefix the upload directory is mounted at.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Photo store rooted at one directory.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

/// File extension for an accepted image content type.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

impl PhotoStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Store `bytes` and return the public path.
    pub async fn save(&self, content_type: &str, bytes: &[u8]) -> Result<String, AppError> {
        let ext = extension_for(content_type).ok_or_else(|| {
            AppError::Validation(format!("unsupported photo type '{}'", content_type))
        })?;
        if bytes.is_empty() {
            return Err(AppError::Validation("photo is empty".to_string()));
        }
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(AppError::Validation(format!(
                "photo exceeds {} bytes",
                MAX_PHOTO_BYTES
            )));
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create upload dir: {}", e)))?;

        let file_name = format!("{}.{}", uuid::Uuid::new_v4(), ext);
        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to write photo: {}", e)))?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "Photo stored");

        Ok(format!("{}/{}", PUBLIC_PREFIX, file_name))
    }

    /// Best-effort removal of a previously stored photo by its public path.
    pub async fn remove(&self, public_path: &str) {
        let Some(name) = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return;
        };
        // Only names we generated: no separators or parent references.
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return;
        }
        if let Err(e) = tokio::fs::remove_file(self.dir.join(name)).await {
            tracing::warn!(error = %e, path = public_path, "Failed to remove old photo");
        }
    }
}
