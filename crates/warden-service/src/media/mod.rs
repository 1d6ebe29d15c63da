//! Turning stored media references into URLs a moderator can open.

#[cfg(feature = "s3")]
pub mod s3;
pub mod signer;

use std::sync::Arc;

use warden_core::config::{MediaConfig, MediaProvider};
#[cfg(not(feature = "s3"))]
use warden_core::error::AppError;
use warden_core::result::AppResult;

pub use signer::{MediaSigner, PassthroughSigner, is_direct_url};

/// Build the signer selected by `media.provider`.
pub async fn build_signer(config: &MediaConfig) -> AppResult<Arc<dyn MediaSigner>> {
    match config.provider {
        MediaProvider::Passthrough => Ok(Arc::new(PassthroughSigner::from_config(config)?)),
        #[cfg(feature = "s3")]
        MediaProvider::S3 => Ok(Arc::new(s3::S3Signer::from_config(config).await?)),
        #[cfg(not(feature = "s3"))]
        MediaProvider::S3 => Err(AppError::configuration(
            "media.provider = \"s3\" requires the `s3` feature",
        )),
    }
}
