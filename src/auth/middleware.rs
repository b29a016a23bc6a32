// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token gate for protected routes.
//!
//! The token travels in the request body field `token`, as JSON or as a
//! form-urlencoded field. The body is buffered, the token verified, and the
//! request rebuilt with the same bytes for the downstream handler.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/home", post(home))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_token));
//! ```

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::error::AuthError;
use crate::models::TokenBody;
use crate::state::AppState;

/// Upper bound on a buffered protected-route body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Reject the request with 401 unless its body carries a valid token.
///
/// On success the [`VerifiedToken`](super::VerifiedToken) is added to the
/// request extensions.
pub async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "Failed to buffer protected request body");
            return AuthError::Unauthenticated.into_response();
        }
    };

    let token = extract_token(&parts.headers, &bytes);
    match state.verifier.verify(token.as_deref()).await {
        Ok(verified) => {
            let mut request = Request::from_parts(parts, Body::from(bytes));
            request.extensions_mut().insert(verified);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Read the `token` field from a JSON or form-urlencoded body.
fn extract_token(headers: &HeaderMap, body: &Bytes) -> Option<String> {
    let is_form = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        url::form_urlencoded::parse(body)
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
    } else {
        serde_json::from_slice::<TokenBody>(body)
            .ok()
            .and_then(|b| b.token)
    }
}
