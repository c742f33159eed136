//! Shared AWS SDK configuration for S3 and SES

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::config::Credentials;

use crate::config::AwsConfig;

/// Load the SDK config for the configured region.
///
/// Keys set in `[aws]` take over from the default provider chain; leave them
/// empty to use the environment, profile or instance role.
pub async fn load_sdk_config(aws: &AwsConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(aws.region.clone()));

    if let Some(credentials) = static_credentials(aws) {
        loader = loader.credentials_provider(credentials);
    }

    loader.load().await
}

fn static_credentials(aws: &AwsConfig) -> Option<Credentials> {
    if aws.access_key_id.is_empty() || aws.secret_access_key.is_empty() {
        return None;
    }
    Some(Credentials::new(
        aws.access_key_id.clone(),
        aws.secret_access_key.clone(),
        None,
        None,
        "brewery-config",
    ))
}
