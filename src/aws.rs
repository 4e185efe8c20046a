//! Shared AWS SDK configuration for the queue and object clients

use crate::config::StorageConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::config::Credentials;
use tracing::debug;

/// Resolve SDK settings from the AWS default chain, overridden by whatever the
/// storage section sets explicitly (region, endpoint, static credentials)
pub async fn load_sdk_config(storage: &StorageConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &storage.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &storage.endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    if let (Some(access_key), Some(secret_key)) = (&storage.access_key, &storage.secret_key) {
        loader = loader.credentials_provider(Credentials::new(
            access_key,
            secret_key,
            None,
            None,
            "s3mirror-config",
        ));
    }

    let sdk_config = loader.load().await;
    debug!(region = ?sdk_config.region(), endpoint = ?storage.endpoint, "AWS SDK configured");

    sdk_config
}
