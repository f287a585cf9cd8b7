//! Request extractors that reject with [`AppError`] so every failure body is
//! `{"error": ...}`.

use crate::error::AppError;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use serde::de::DeserializeOwned;

/// JSON body extractor. Malformed or missing bodies become a 400, bodies over
/// the router's size limit a 413.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err: JsonRejection| {
                if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    return AppError::PayloadTooLarge(anyhow::anyhow!(
                        "Request body is too large: {}",
                        err.body_text()
                    ));
                }
                let message = match err {
                    JsonRejection::JsonDataError(e) => format!("Invalid JSON data: {}", e.body_text()),
                    JsonRejection::JsonSyntaxError(e) => format!("JSON syntax error: {}", e.body_text()),
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing Content-Type: application/json header".to_string()
                    }
                    other => format!("Failed to parse JSON: {}", other.body_text()),
                };
                AppError::bad_request(message)
            })?;

        Ok(ApiJson(value))
    }
}
