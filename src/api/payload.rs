// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request body extractor accepting JSON or form-urlencoded bodies.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, FieldError};

/// Deserialized request body.
///
/// A form body is detected by its content type; anything else is parsed as
/// JSON. An unparseable body is rejected with 422, like a field that fails
/// validation.
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(value) = Form::<T>::from_request(request, state)
                .await
                .map_err(|e| body_error(e.body_text()))?;
            return Ok(Payload(value));
        }

        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|e| body_error(e.body_text()))?;
        let Json(value) = Json::<T>::from_bytes(&bytes).map_err(|e| body_error(e.body_text()))?;
        Ok(Payload(value))
    }
}

fn body_error(message: String) -> ApiError {
    ApiError::validation(vec![FieldError::new("body", message)])
}
