//! AES-256-GCM envelope for TOTP secrets at rest.
//!
//! Sealed values look like `enc:v1:<base64(nonce || ciphertext)>`. Values
//! without the prefix are legacy plaintext and are only accepted until the
//! configured cutoff.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;

use warden_core::config::TotpConfig;
use warden_core::error::AppError;

const PREFIX: &str = "enc:v1:";
const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// A secret recovered from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedSecret {
    /// Base32 TOTP secret.
    pub secret: String,
    /// True if the stored value was legacy plaintext and should be re-sealed.
    pub legacy: bool,
}

/// Seals and opens TOTP secrets with a 256-bit key.
#[derive(Clone)]
pub struct SecretEnvelope {
    cipher: Aes256Gcm,
    legacy_until: DateTime<Utc>,
}

impl std::fmt::Debug for SecretEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretEnvelope")
            .field("legacy_until", &self.legacy_until)
            .finish_non_exhaustive()
    }
}

impl SecretEnvelope {
    /// Build from the TOTP settings.
    pub fn from_config(config: &TotpConfig) -> Result<Self, AppError> {
        Self::new(&config.encryption_key, config.legacy_plaintext_until)
    }

    /// Build from an encoded key.
    pub fn new(encoded_key: &str, legacy_until: DateTime<Utc>) -> Result<Self, AppError> {
        let key = decode_key(encoded_key)?;
        Ok(Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)),
            legacy_until,
        })
    }

    /// Encrypt with a fresh random nonce.
    pub fn seal(&self, plaintext: &str) -> Result<String, AppError> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| AppError::internal("Secret encryption failed"))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(format!("{PREFIX}{}", STANDARD.encode(blob)))
    }

    /// Recover a stored secret.
    ///
    /// Sealed values are verified strictly; any tamper is an error. Legacy
    /// plaintext passes through unchanged while `now` is before the cutoff
    /// and reads as "not configured" afterwards.
    pub fn open(&self, stored: &str, now: DateTime<Utc>) -> Result<OpenedSecret, AppError> {
        let Some(body) = stored.strip_prefix(PREFIX) else {
            if now < self.legacy_until {
                return Ok(OpenedSecret {
                    secret: stored.to_string(),
                    legacy: true,
                });
            }
            return Err(AppError::totp_not_configured());
        };

        let blob = STANDARD
            .decode(body)
            .map_err(|_| AppError::internal("Sealed secret is not valid base64"))?;
        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(AppError::internal("Sealed secret is truncated"));
        }
        let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| AppError::internal("Sealed secret failed authentication"))?;
        let secret = String::from_utf8(plaintext)
            .map_err(|_| AppError::internal("Sealed secret is not UTF-8"))?;

        Ok(OpenedSecret {
            secret,
            legacy: false,
        })
    }
}

/// Accepts standard base64, unpadded base64, hex, or a 32-byte literal.
fn decode_key(encoded: &str) -> Result<[u8; KEY_LEN], AppError> {
    let encoded = encoded.trim();
    let candidates = [
        STANDARD.decode(encoded).ok(),
        STANDARD_NO_PAD.decode(encoded).ok(),
        hex::decode(encoded).ok(),
        Some(encoded.as_bytes().to_vec()),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|bytes| <[u8; KEY_LEN]>::try_from(bytes.as_slice()).ok())
        .ok_or_else(|| {
            AppError::configuration("totp.encryption_key must decode to exactly 32 bytes")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use warden_core::error::ErrorKind;

    fn cutoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap()
    }

    fn envelope() -> SecretEnvelope {
        SecretEnvelope::new(&"k".repeat(32), cutoff()).unwrap()
    }

    #[test]
    fn test_key_encodings() {
        let raw = [7u8; 32];
        for encoded in [
            STANDARD.encode(raw),
            STANDARD_NO_PAD.encode(raw),
            hex::encode(raw),
            "0123456789abcdef0123456789abcdef".to_string(),
        ] {
            assert!(SecretEnvelope::new(&encoded, cutoff()).is_ok(), "{encoded}");
        }
        assert!(SecretEnvelope::new("short", cutoff()).is_err());
        assert!(SecretEnvelope::new(&STANDARD.encode([1u8; 16]), cutoff()).is_err());
    }

    #[test]
    fn test_seal_uses_fresh_nonce() {
        let env = envelope();
        let a = env.seal("JBSWY3DPEHPK3PXP").unwrap();
        let b = env.seal("JBSWY3DPEHPK3PXP").unwrap();
        assert!(a.starts_with(PREFIX));
        assert_ne!(a, b);

        let now = cutoff() - Duration::days(1);
        assert_eq!(env.open(&a, now).unwrap().secret, "JBSWY3DPEHPK3PXP");
        assert!(!env.open(&b, now).unwrap().legacy);
    }

    #[test]
    fn test_tamper_detected() {
        let env = envelope();
        let sealed = env.seal("JBSWY3DPEHPK3PXP").unwrap();
        let mut blob = STANDARD.decode(&sealed[PREFIX.len()..]).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        let tampered = format!("{PREFIX}{}", STANDARD.encode(blob));
        assert!(env.open(&tampered, cutoff()).is_err());

        let other = SecretEnvelope::new(&"z".repeat(32), cutoff()).unwrap();
        assert!(other.open(&sealed, cutoff()).is_err());
    }

    #[test]
    fn test_legacy_plaintext_until_cutoff() {
        let env = envelope();
        let before = env.open("JBSWY3DPEHPK3PXP", cutoff() - Duration::seconds(1)).unwrap();
        assert_eq!(before.secret, "JBSWY3DPEHPK3PXP");
        assert!(before.legacy);

        let err = env.open("JBSWY3DPEHPK3PXP", cutoff()).unwrap_err();
        assert!(err.is(ErrorKind::TotpNotConfigured));
    }
}
