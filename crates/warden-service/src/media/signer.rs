//! Media signer trait and the passthrough implementation.

use async_trait::async_trait;
use url::Url;

use warden_core::config::MediaConfig;
use warden_core::error::AppError;
use warden_core::result::AppResult;

/// Produces a short-lived URL for a stored media reference.
#[async_trait]
pub trait MediaSigner: Send + Sync {
    /// Signer name for logs.
    fn name(&self) -> &'static str;

    /// URL for `storage_ref`. `http(s)://` references come back unchanged.
    async fn sign(&self, storage_ref: &str) -> AppResult<String>;
}

/// True for references that already are fetchable URLs.
pub fn is_direct_url(storage_ref: &str) -> bool {
    let lower = storage_ref.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolves object keys against a public base URL without signing.
#[derive(Debug, Clone, Default)]
pub struct PassthroughSigner {
    base: Option<Url>,
}

impl PassthroughSigner {
    /// A signer with an optional public base URL.
    pub fn new(base: Option<Url>) -> Self {
        Self { base }
    }

    /// Build from `media.public_base_url`.
    pub fn from_config(config: &MediaConfig) -> AppResult<Self> {
        let base = config
            .public_base_url
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                let raw = if raw.ends_with('/') {
                    raw.to_string()
                } else {
                    format!("{raw}/")
                };
                Url::parse(&raw).map_err(|e| {
                    AppError::configuration(format!("media.public_base_url is invalid: {e}"))
                })
            })
            .transpose()?;
        Ok(Self { base })
    }
}

#[async_trait]
impl MediaSigner for PassthroughSigner {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    async fn sign(&self, storage_ref: &str) -> AppResult<String> {
        let storage_ref = storage_ref.trim();
        if is_direct_url(storage_ref) {
            return Ok(storage_ref.to_string());
        }
        match &self.base {
            Some(base) => base
                .join(storage_ref.trim_start_matches('/'))
                .map(String::from)
                .map_err(|e| AppError::invalid_input(format!("Bad media key '{storage_ref}': {e}"))),
            None => Ok(storage_ref.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_direct_urls_pass_through() {
        let signer = PassthroughSigner::new(Url::parse("https://cdn.example/media/").ok());
        assert_eq!(
            signer.sign("https://other.example/a.jpg").await.unwrap(),
            "https://other.example/a.jpg"
        );
        assert_eq!(
            signer.sign("HTTP://other.example/b.jpg").await.unwrap(),
            "HTTP://other.example/b.jpg"
        );
    }

    #[tokio::test]
    async fn test_keys_join_base_url() {
        let config = MediaConfig {
            public_base_url: Some("https://cdn.example/media".into()),
            ..MediaConfig::default()
        };
        let signer = PassthroughSigner::from_config(&config).unwrap();
        assert_eq!(
            signer.sign("/users/1/p1.jpg").await.unwrap(),
            "https://cdn.example/media/users/1/p1.jpg"
        );

        let bare = PassthroughSigner::default();
        assert_eq!(bare.sign("users/1/p1.jpg").await.unwrap(), "users/1/p1.jpg");
    }
}
