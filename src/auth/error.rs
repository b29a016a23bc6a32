// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verification errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Reason a bearer token was rejected.
///
/// The variants are distinguished for diagnostics only. Every variant renders
/// the same 401 response so callers cannot tell which check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No token in the request
    Unauthenticated,
    /// Token is not a structurally valid JWT
    Malformed,
    /// Token `kid` is absent from the current key set
    UnknownKey,
    /// Signature or algorithm check failed
    InvalidSignature,
    /// Token has expired
    Expired,
    /// Token `nbf` is in the future
    NotYetValid,
    /// Token issuer is not the configured user pool
    InvalidIssuer,
    /// Token audience does not match
    InvalidAudience,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
    error_code: &'static str,
}

impl AuthError {
    /// Internal reason code, used in logs.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "missing_token",
            AuthError::Malformed => "malformed_token",
            AuthError::UnknownKey => "unknown_key",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::Expired => "token_expired",
            AuthError::NotYetValid => "token_not_yet_valid",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::InvalidAudience => "invalid_audience",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Unauthenticated => write!(f, "Token is required"),
            AuthError::Malformed => write!(f, "Token is malformed"),
            AuthError::UnknownKey => write!(f, "No matching key found in JWKS"),
            AuthError::InvalidSignature => write!(f, "Token signature is invalid"),
            AuthError::Expired => write!(f, "Token has expired"),
            AuthError::NotYetValid => write!(f, "Token is not yet valid"),
            AuthError::InvalidIssuer => write!(f, "Token issuer is invalid"),
            AuthError::InvalidAudience => write!(f, "Token audience is invalid"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(AuthErrorBody {
            error: "Unauthorized",
            error_code: "unauthorized",
        });
        (self.status_code(), body).into_response()
    }
}
