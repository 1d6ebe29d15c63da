//! Profile media configuration.

use serde::{Deserialize, Serialize};

/// How stored media references become fetchable URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaProvider {
    /// Absolute URLs pass through; object keys are joined onto `public_base_url`.
    #[default]
    Passthrough,
    /// Object keys are presigned against an S3-compatible bucket.
    S3,
}

/// Media signer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Selected provider.
    #[serde(default)]
    pub provider: MediaProvider,
    /// Base URL for passthrough object keys.
    #[serde(default)]
    pub public_base_url: Option<String>,
    /// Bucket holding profile media.
    #[serde(default)]
    pub bucket: String,
    /// Bucket region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom S3 endpoint (MinIO and friends).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Lifetime of presigned URLs in seconds.
    #[serde(default = "default_url_ttl")]
    pub url_ttl_seconds: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            provider: MediaProvider::default(),
            public_base_url: None,
            bucket: String::new(),
            region: default_region(),
            endpoint: None,
            url_ttl_seconds: default_url_ttl(),
        }
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_url_ttl() -> u64 {
    300
}
