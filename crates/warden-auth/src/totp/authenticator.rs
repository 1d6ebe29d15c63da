//! RFC 6238 TOTP generation and validation.

use chrono::{DateTime, Utc};
use totp_rs::{Algorithm, Secret, TOTP};

use warden_core::error::AppError;

const TOTP_DIGITS: usize = 6;
const TOTP_STEP: u64 = 30;
const TOTP_SKEW: u8 = 1;

/// A new secret ready to be shown to the operator.
#[derive(Debug, Clone)]
pub struct TotpProvision {
    /// Base32 secret for manual entry.
    pub secret: String,
    /// `otpauth://totp/...` URI.
    pub otpauth_url: String,
    /// PNG QR code of the URI as a `data:` URL.
    pub qr_code_data_url: String,
}

/// Issues and checks 6-digit, 30-second, HMAC-SHA1 codes.
#[derive(Debug, Clone)]
pub struct TotpAuthenticator {
    issuer: String,
}

impl TotpAuthenticator {
    /// Create an authenticator labelled with `issuer`.
    pub fn new(issuer: &str) -> Self {
        Self {
            issuer: label(issuer),
        }
    }

    /// Generate a fresh secret with its provisioning URI and QR code.
    pub fn generate(&self, account: &str) -> Result<TotpProvision, AppError> {
        let secret = Secret::generate_secret();
        let bytes = secret
            .to_bytes()
            .map_err(|e| AppError::internal(format!("Invalid generated secret: {e}")))?;

        let totp = TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            TOTP_SKEW,
            TOTP_STEP,
            bytes,
            Some(self.issuer.clone()),
            label(account),
        )
        .map_err(|e| AppError::internal(format!("Failed to create TOTP: {e}")))?;

        let qr = totp
            .get_qr_base64()
            .map_err(|e| AppError::internal(format!("Failed to render QR code: {e}")))?;

        Ok(TotpProvision {
            secret: secret.to_encoded().to_string(),
            otpauth_url: totp.get_url(),
            qr_code_data_url: format!("data:image/png;base64,{qr}"),
        })
    }

    /// Check `code` against a base32 secret at `now`, allowing one step of
    /// drift either way. Anything other than exactly six ASCII digits fails
    /// before the secret is touched.
    pub fn validate(&self, secret: &str, code: &str, now: DateTime<Utc>) -> bool {
        if code.len() != TOTP_DIGITS || !code.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        let Some(totp) = checker(secret) else {
            return false;
        };
        let Ok(at) = u64::try_from(now.timestamp()) else {
            return false;
        };
        totp.check(code, at)
    }
}

fn checker(secret: &str) -> Option<TOTP> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let bytes = Secret::Encoded(normalized).to_bytes().ok()?;
    Some(TOTP::new_unchecked(
        Algorithm::SHA1,
        TOTP_DIGITS,
        TOTP_SKEW,
        TOTP_STEP,
        bytes,
        None,
        String::new(),
    ))
}

/// `otpauth` labels may not contain ':'.
fn label(value: &str) -> String {
    let cleaned = value.trim().replace(':', "");
    if cleaned.is_empty() {
        "operator".to_string()
    } else {
        cleaned
    }
}
