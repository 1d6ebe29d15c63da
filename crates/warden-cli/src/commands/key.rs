//! Envelope key generation.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;

/// Random 32-byte key, standard base64.
pub fn generate() -> String {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    STANDARD.encode(key)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use warden_auth::SecretEnvelope;

    use super::*;

    #[test]
    fn test_key_is_accepted_by_envelope() {
        let key = generate();
        assert_eq!(STANDARD.decode(&key).unwrap().len(), 32);

        let envelope = SecretEnvelope::new(&key, Utc::now()).unwrap();
        let sealed = envelope.seal("JBSWY3DPEHPK3PXP").unwrap();
        assert!(sealed.starts_with("enc:v1:"));
        assert_ne!(generate(), key);
    }
}
