// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies for the `/auth` routes and the protected
//! routes. Request fields default to empty so a missing field is reported by
//! validation alongside the others instead of failing deserialization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::identity::NewUser;

// =============================================================================
// Auth Requests
// =============================================================================

/// Body of `POST /auth/signup`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SignUpRequest {
    /// At least 5 characters.
    #[serde(default)]
    pub username: String,
    /// At least 8 characters.
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    /// ISO-8601 date, e.g. `1990-04-01`.
    #[serde(default)]
    pub birthdate: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub family_name: String,
}

impl From<SignUpRequest> for NewUser {
    fn from(request: SignUpRequest) -> Self {
        Self {
            username: request.username,
            password: request.password,
            email: request.email.trim().to_lowercase(),
            birthdate: request.birthdate,
            name: request.name,
            family_name: request.family_name,
        }
    }
}

/// Body of `POST /auth/signin`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SignInRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Body of `POST /auth/verify`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, PartialEq, Eq)]
pub struct VerifyRequest {
    #[serde(default)]
    pub username: String,
    /// Six-character confirmation code.
    #[serde(default)]
    pub code: String,
}

/// Body of `POST /auth/forgot-password`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub username: String,
}

/// Body of `POST /auth/confirm-password`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ConfirmPasswordRequest {
    #[serde(default)]
    pub username: String,
    /// The new password.
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub code: String,
}

// =============================================================================
// Protected Routes
// =============================================================================

/// Body carrying a bearer token to a protected route.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TokenBody {
    #[serde(default)]
    pub token: Option<String>,
}

/// Generic status response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let request: SignInRequest = serde_json::from_str(r#"{"username":"alice01"}"#).unwrap();
        assert_eq!(request.username, "alice01");
        assert!(request.password.is_empty());
    }

    #[test]
    fn sign_up_normalizes_email() {
        let request = SignUpRequest {
            username: "alice01".into(),
            password: "password1".into(),
            email: "  Alice@Example.COM ".into(),
            birthdate: "1990-04-01".into(),
            name: "Alice".into(),
            family_name: "Liddell".into(),
        };
        let user = NewUser::from(request);
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.birthdate, "1990-04-01");
    }
}
