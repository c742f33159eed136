//! External API integrations

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub mod aws;
pub mod geocoding;
pub mod image_signer;
pub mod mailer;
pub mod timezone;

pub use geocoding::GeocodingClient;
pub use image_signer::{ImageFolder, ImageSigner};
pub use mailer::Mailer;
pub use timezone::TimezoneClient;

/// Run an outbound call under a deadline
pub async fn with_timeout<T, F>(service: &str, limit: Duration, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(service, timeout_ms = limit.as_millis() as u64, "External call timed out");
            Err(AppError::ExternalTimeout(service.to_string()))
        }
    }
}
