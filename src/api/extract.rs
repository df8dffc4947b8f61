use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// `Json` whose rejections go through `AppError`, so a bad body is a 400
/// naming the offending field instead of axum's plain-text 422.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let detail = rejection.body_text();
        AppError::validation(&rejection_field(&detail), detail)
    }
}

/// Picks the field a deserialization error points at, or `body` when the
/// payload as a whole is unusable.
fn rejection_field(detail: &str) -> String {
    if let Some((_, rest)) = detail.split_once("missing field `") {
        if let Some((name, _)) = rest.split_once('`') {
            return name.to_string();
        }
    }

    let inner = detail
        .split_once("target type: ")
        .map_or(detail, |(_, inner)| inner);
    match inner.split_once(": ") {
        Some((path, _))
            if !path.is_empty()
                && path
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') =>
        {
            path.to_string()
        }
        _ => "body".to_string(),
    }
}
