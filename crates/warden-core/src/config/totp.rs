//! TOTP and secret envelope configuration.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// TOTP issuer, at-rest key and enrollment gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotpConfig {
    /// Issuer shown by authenticator apps.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// 256-bit envelope key: base64, unpadded base64, hex, or a 32-char literal.
    #[serde(default)]
    pub encryption_key: String,
    /// Stored secrets without the envelope prefix are accepted until this instant.
    #[serde(default = "default_legacy_cutoff")]
    pub legacy_plaintext_until: DateTime<Utc>,
    /// Header key gating the enrollment endpoints. Empty disables them.
    #[serde(default)]
    pub bootstrap_key: String,
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            encryption_key: String::new(),
            legacy_plaintext_until: default_legacy_cutoff(),
            bootstrap_key: String::new(),
        }
    }
}

fn default_issuer() -> String {
    "Warden".to_string()
}

fn default_legacy_cutoff() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}
