//! S3 presigned GET URLs.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use tracing::info;

use warden_core::config::MediaConfig;
use warden_core::error::{AppError, ErrorKind};
use warden_core::result::AppResult;

use super::signer::{MediaSigner, is_direct_url};

/// Presigns object keys in one bucket.
#[derive(Debug, Clone)]
pub struct S3Signer {
    client: Client,
    bucket: String,
    ttl: Duration,
}

impl S3Signer {
    /// Load credentials from the environment and build a client.
    pub async fn from_config(config: &MediaConfig) -> AppResult<Self> {
        if config.bucket.trim().is_empty() {
            return Err(AppError::configuration("media.bucket must be set for s3"));
        }

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = config.endpoint.as_deref().filter(|e| !e.is_empty()) {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        info!(bucket = %config.bucket, region = %config.region, "S3 media signer ready");
        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            ttl: Duration::from_secs(config.url_ttl_seconds),
        })
    }
}

#[async_trait]
impl MediaSigner for S3Signer {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn sign(&self, storage_ref: &str) -> AppResult<String> {
        if is_direct_url(storage_ref) {
            return Ok(storage_ref.trim().to_string());
        }
        let presigning = PresigningConfig::expires_in(self.ttl).map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid presign lifetime", e)
        })?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(storage_ref.trim_start_matches('/'))
            .presigned(presigning)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::ExternalService, "Presign failed", e))?;
        Ok(request.uri().to_string())
    }
}
