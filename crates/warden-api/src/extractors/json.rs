//! JSON body extractor that validates after deserializing.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use warden_core::error::AppError;

use crate::error::ApiError;

/// Like [`Json`], but parse failures become `invalid_json` and
/// [`Validate`] failures become `invalid_input`.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::InvalidJson(rejection.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::invalid_input(e.to_string()))?;

        Ok(Self(value))
    }
}
