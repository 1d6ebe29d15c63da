//! HS256 token minting and signature checks.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use warden_core::config::AuthConfig;
use warden_core::error::AppError;
use warden_entity::operator::Operator;

use super::claims::Claims;

/// Backdating applied to `nbf`.
const NOT_BEFORE_SKEW_SECONDS: i64 = 5;

/// A freshly minted token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact JWS.
    pub token: String,
    /// `exp` claim as a timestamp.
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies bearer tokens with a single shared secret.
///
/// Only HS256 is accepted. Time bounds are evaluated by the session layer
/// against the injected clock, not here.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec from the auth settings.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_required_spec_claims(&["exp", "nbf"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            ttl: Duration::minutes(config.jwt_ttl_minutes as i64),
        }
    }

    /// Mint a token for `operator` bound to `session_id`.
    pub fn issue(
        &self,
        operator: &Operator,
        session_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            jti: Uuid::new_v4(),
            uid: operator.id,
            tid: operator.external_id,
            role: operator.role,
            username: operator.login_handle.clone(),
            sid: session_id,
            iat: now.timestamp(),
            nbf: now.timestamp() - NOT_BEFORE_SKEW_SECONDS,
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at(),
        })
    }

    /// Verify the signature and claim shape.
    pub fn parse(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::unauthorized("Invalid token signature")
                }
                jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => {
                    AppError::unauthorized("Token algorithm not allowed")
                }
                _ => AppError::unauthorized("Invalid token"),
            }
        })?;

        let claims = data.claims;
        if claims.uid <= 0 || claims.sid.is_nil() {
            return Err(AppError::unauthorized("Invalid token"));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use warden_core::error::ErrorKind;
    use warden_entity::operator::Role;

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(&AuthConfig {
            jwt_secret: secret.into(),
            ..AuthConfig::default()
        })
    }

    fn operator(id: i64) -> Operator {
        let now = Utc::now();
        Operator {
            id,
            external_id: 42,
            login_handle: Some("ops".into()),
            display_name: None,
            role: Role::Admin,
            password_hash: String::new(),
            totp_secret: None,
            totp_enabled: true,
            is_active: true,
            failed_attempts: 0,
            locked_until: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_issue_then_parse() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let sid = Uuid::new_v4();
        let issued = codec("s").issue(&operator(7), sid, now).unwrap();
        assert_eq!(issued.expires_at, now + Duration::minutes(720));

        let claims = codec("s").parse(&issued.token).unwrap();
        assert_eq!(claims.uid, 7);
        assert_eq!(claims.tid, 42);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.sid, sid);
        assert_eq!(claims.nbf, now.timestamp() - 5);
        assert!(claims.is_live(now));
        assert!(!claims.is_live(issued.expires_at));
    }

    #[test]
    fn test_wrong_secret_is_unauthorized() {
        let issued = codec("a")
            .issue(&operator(7), Uuid::new_v4(), Utc::now())
            .unwrap();
        let err = codec("b").parse(&issued.token).unwrap_err();
        assert!(err.is(ErrorKind::Unauthorized));
    }

    #[test]
    fn test_non_positive_operator_rejected() {
        let issued = codec("s")
            .issue(&operator(0), Uuid::new_v4(), Utc::now())
            .unwrap();
        assert!(codec("s").parse(&issued.token).is_err());
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let claims = serde_json::json!({
            "jti": Uuid::new_v4(), "uid": 1, "tid": 2, "role": "ADMIN",
            "sid": Uuid::new_v4(), "iat": 0, "nbf": 0, "exp": i64::MAX / 2,
        });
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"s"),
        )
        .unwrap();
        assert!(codec("s").parse(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(codec("s").parse("not.a.token").is_err());
    }
}
