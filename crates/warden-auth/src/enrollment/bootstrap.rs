//! Static header key guarding the enrollment endpoints.

use sha2::{Digest, Sha256};

use warden_core::error::{AppError, ErrorKind};

/// Compares a presented key against the configured bootstrap key.
///
/// An empty configured key disables enrollment for the life of the process.
#[derive(Clone)]
pub struct BootstrapGuard {
    digest: Option<[u8; 32]>,
}

impl std::fmt::Debug for BootstrapGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapGuard")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl BootstrapGuard {
    /// Build from the configured key.
    pub fn new(key: &str) -> Self {
        let key = key.trim();
        Self {
            digest: (!key.is_empty()).then(|| digest(key)),
        }
    }

    /// Whether enrollment is available at all.
    pub fn is_enabled(&self) -> bool {
        self.digest.is_some()
    }

    /// Admit or refuse a request carrying `presented`.
    pub fn check(&self, presented: Option<&str>) -> Result<(), AppError> {
        let Some(expected) = self.digest else {
            return Err(AppError::new(
                ErrorKind::BootstrapDisabled,
                "TOTP enrollment is disabled",
            ));
        };
        let presented = presented.map(str::trim).unwrap_or_default();
        if presented.is_empty() {
            return Err(AppError::forbidden("Bootstrap key required"));
        }

        // Equal-length digests keep the comparison independent of the key length.
        let actual = digest(presented);
        let diff = expected
            .iter()
            .zip(actual.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        if diff != 0 {
            return Err(AppError::forbidden("Invalid bootstrap key"));
        }
        Ok(())
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}
