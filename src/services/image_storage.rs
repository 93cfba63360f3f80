//! Image storage
//!
//! Item images are written to the upload directory under random names and
//! served back from `/uploads/<name>`.

use crate::config::UploadConfig;
use crate::services::error::{ServiceError, ServiceResult};
use anyhow::Context;
use async_trait::async_trait;
use data_encoding::BASE64;
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

/// URL prefix stored images are served under
pub const UPLOADS_URL_PREFIX: &str = "/uploads/";

/// Storage backend for item images
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Store a `data:<mime>;base64,<payload>` URL and return the public URL
    async fn save_base64(&self, data_url: &str) -> ServiceResult<String>;

    /// Store raw bytes of the given content type and return the public URL
    async fn save_bytes(&self, bytes: &[u8], content_type: &str) -> ServiceResult<String>;

    /// Remove a stored image by its public URL. Returns false on any failure.
    async fn delete(&self, url: &str) -> bool;
}

/// Images on the local filesystem
pub struct LocalImageStorage {
    config: UploadConfig,
}

impl LocalImageStorage {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    pub fn root(&self) -> &PathBuf {
        &self.config.path
    }

    async fn write(&self, bytes: &[u8], content_type: &str) -> ServiceResult<String> {
        if bytes.is_empty() {
            return Err(ServiceError::validation("Image is empty"));
        }
        if bytes.len() as u64 > self.config.max_file_size {
            return Err(ServiceError::validation(format!(
                "Image is too large. Maximum size is {} MB",
                self.config.max_file_size / 1024 / 1024
            )));
        }

        if !self.config.path.exists() {
            fs::create_dir_all(&self.config.path)
                .await
                .context("Failed to create upload directory")?;
        }

        let ext = self.config.get_extension(content_type);
        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        fs::write(self.config.path.join(&filename), bytes)
            .await
            .context("Failed to write image")?;

        tracing::debug!("Stored image {} ({} bytes)", filename, bytes.len());
        Ok(format!("{}{}", UPLOADS_URL_PREFIX, filename))
    }
}

/// Split a data URL into its mime type and decoded payload
fn parse_data_url(data_url: &str) -> ServiceResult<(String, Vec<u8>)> {
    let invalid = || ServiceError::validation("Invalid image data");

    let (header, payload) = data_url.trim().split_once(',').ok_or_else(invalid)?;
    let mime = header
        .strip_prefix("data:")
        .and_then(|rest| rest.split(';').next())
        .map(|m| m.trim().to_lowercase())
        .ok_or_else(invalid)?;

    if !mime.starts_with("image/") || !header.ends_with(";base64") {
        return Err(invalid());
    }

    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64.decode(payload.as_bytes()).map_err(|_| invalid())?;

    Ok((mime, bytes))
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn save_base64(&self, data_url: &str) -> ServiceResult<String> {
        let (mime, bytes) = parse_data_url(data_url)?;
        self.write(&bytes, &mime).await
    }

    async fn save_bytes(&self, bytes: &[u8], content_type: &str) -> ServiceResult<String> {
        if !self.config.is_type_allowed(content_type) {
            return Err(ServiceError::validation(format!(
                "Invalid file type: {}. Only images are allowed",
                content_type
            )));
        }
        self.write(bytes, content_type).await
    }

    async fn delete(&self, url: &str) -> bool {
        let name = match url.strip_prefix(UPLOADS_URL_PREFIX) {
            Some(name) => name,
            None => return false,
        };
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return false;
        }

        match fs::remove_file(self.config.path.join(name)).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to delete image {}: {}", name, e);
                false
            }
        }
    }
}
