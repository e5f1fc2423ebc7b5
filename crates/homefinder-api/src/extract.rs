//! Request extractors. `Json` wraps axum's extractor so body shape errors
//! (malformed JSON, missing fields, out-of-range enum values like an
//! unknown role or property type) surface as 400 field-level validation
//! failures instead of axum's default 422, keeping them on the same wire
//! contract as the handlers' own length checks.

use axum::extract::{FromRequest, Request};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ApiError, FieldError};

pub struct Json<T>(pub T);

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => Err(ApiError::Validation(vec![FieldError::new(
                "body",
                &rejection.body_text(),
            )])),
        }
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}
