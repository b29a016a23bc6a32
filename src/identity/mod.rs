// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity operations delegated to the managed identity provider.
//!
//! Handlers only ever see [`IdentityOperationResult`]; how the provider
//! performs the operation is up to the [`IdentityProvider`] implementation.

pub mod cognito;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use cognito::CognitoClient;

/// Tokens issued on a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionTokens {
    pub id_token: String,
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    pub token_type: String,
}

/// Outcome of a delegated identity operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityOperationResult {
    pub success: bool,
    /// Provider error code (e.g. `UsernameExistsException`); logged only.
    pub error_code: Option<String>,
    /// Present only for a successful `authenticate`.
    pub tokens: Option<SessionTokens>,
}

impl IdentityOperationResult {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failed(error_code: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: Some(error_code.into()),
            tokens: None,
        }
    }

    pub fn with_tokens(mut self, tokens: SessionTokens) -> Self {
        self.tokens = Some(tokens);
        self
    }
}

/// A user registration, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub birthdate: String,
    pub name: String,
    pub family_name: String,
}

/// Identity operations backed by an external provider.
///
/// Implementations never fail with an error: transport problems are folded
/// into an unsuccessful [`IdentityOperationResult`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> IdentityOperationResult;

    async fn authenticate(&self, username: &str, password: &str) -> IdentityOperationResult;

    async fn confirm_sign_up(&self, username: &str, code: &str) -> IdentityOperationResult;

    async fn request_password_reset(&self, username: &str) -> IdentityOperationResult;

    async fn confirm_password_reset(
        &self,
        username: &str,
        code: &str,
        new_password: &str,
    ) -> IdentityOperationResult;
}
