//! Bearer token extractors.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use warden_auth::session::AuthenticatedOperator;
use warden_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// The raw token from `Authorization: Bearer <token>`, unchecked.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthorized("Invalid Authorization header format"))?;

        Ok(Self(token.to_string()))
    }
}

/// An operator whose token verified and whose session was live. Extracting
/// it slides the session's idle window.
#[derive(Debug, Clone)]
pub struct CurrentOperator(pub AuthenticatedOperator);

impl std::ops::Deref for CurrentOperator {
    type Target = AuthenticatedOperator;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for CurrentOperator {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let authenticated = state.auth.sessions.validate(&token).await?;
        Ok(Self(authenticated))
    }
}
