//! Presigned S3 URLs for location photos and user avatars

use std::time::Duration;

use aws_config::SdkConfig;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use uuid::Uuid;

use super::with_timeout;
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Folder an image lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFolder {
    Locations,
    Avatars,
}

impl ImageFolder {
    fn as_str(&self) -> &'static str {
        match self {
            ImageFolder::Locations => "locations",
            ImageFolder::Avatars => "avatars",
        }
    }
}

/// Object key for an image owned by `id`
pub fn image_key(folder: ImageFolder, id: Uuid) -> String {
    format!("{}/{}", folder.as_str(), id)
}

/// Signs S3 URLs and checks object existence
#[derive(Clone)]
pub struct ImageSigner {
    client: Client,
    bucket: String,
    expiry: Duration,
    timeout: Duration,
}

impl ImageSigner {
    pub fn new(sdk_config: &SdkConfig, config: &Config) -> Self {
        Self::from_client(
            Client::new(sdk_config),
            config.storage.bucket.clone(),
            Duration::from_secs(config.storage.url_expiry_secs),
            config.external.timeout(),
        )
    }

    fn from_client(client: Client, bucket: String, expiry: Duration, timeout: Duration) -> Self {
        Self {
            client,
            bucket,
            expiry,
            timeout,
        }
    }

    fn presigning(&self) -> AppResult<PresigningConfig> {
        PresigningConfig::expires_in(self.expiry)
            .map_err(|e| AppError::Configuration(format!("Invalid URL expiry: {}", e)))
    }

    /// URL the client uploads the image to
    pub async fn upload_url(&self, folder: ImageFolder, id: Uuid) -> AppResult<String> {
        let key = image_key(folder, id);
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .presigned(self.presigning()?)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to sign upload for {}: {}", key, e)))?;

        Ok(presigned.uri().to_string())
    }

    /// Signed download URL, or `None` when no image has been uploaded
    pub async fn download_url(&self, folder: ImageFolder, id: Uuid) -> AppResult<Option<String>> {
        let key = image_key(folder, id);

        let head = with_timeout("image storage", self.timeout, async {
            match self
                .client
                .head_object()
                .bucket(&self.bucket)
                .key(&key)
                .send()
                .await
            {
                Ok(_) => Ok(true),
                // Without ListBucket permission a missing key answers 403
                Err(e) if matches!(e.raw_response().map(|r| r.status().as_u16()), Some(403 | 404)) => {
                    Ok(false)
                }
                Err(e) => Err(AppError::StorageError(format!("HEAD {} failed: {}", key, e))),
            }
        })
        .await?;

        if !head {
            return Ok(None);
        }

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .presigned(self.presigning()?)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to sign download for {}: {}", key, e)))?;

        Ok(Some(presigned.uri().to_string()))
    }

    /// Like [`ImageSigner::download_url`], but storage trouble degrades to no
    /// image instead of failing the caller
    pub async fn download_url_or_none(&self, folder: ImageFolder, id: Uuid) -> Option<String> {
        match self.download_url(folder, id).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(%id, "Image lookup skipped: {}", e);
                None
            }
        }
    }
}
