// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test doubles for the HTTP layer.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::{testutil::TEST_ISSUER, KeyRing, TokenVerifier};
use crate::identity::{IdentityOperationResult, IdentityProvider, NewUser, SessionTokens};
use crate::state::AppState;

/// Nothing listens here; fetches fail fast with a connection error.
pub const UNREACHABLE_JWKS_URL: &str = "http://127.0.0.1:9/.well-known/jwks.json";

/// Identity provider that records every call and answers with a fixed outcome.
pub struct RecordingIdentity {
    outcome: IdentityOperationResult,
    calls: Mutex<Vec<String>>,
}

impl RecordingIdentity {
    pub fn succeeding() -> Self {
        Self {
            outcome: IdentityOperationResult::succeeded(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(code: &str) -> Self {
        Self {
            outcome: IdentityOperationResult::failed(code),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> IdentityOperationResult {
        self.calls.lock().unwrap().push(call);
        self.outcome.clone()
    }
}

pub fn session_tokens() -> SessionTokens {
    SessionTokens {
        id_token: "id-token".into(),
        access_token: "access-token".into(),
        refresh_token: Some("refresh-token".into()),
        expires_in: 3600,
        token_type: "Bearer".into(),
    }
}

#[async_trait]
impl IdentityProvider for RecordingIdentity {
    async fn create_user(&self, user: &NewUser) -> IdentityOperationResult {
        self.record(format!("create_user:{}:{}", user.username, user.email))
    }

    async fn authenticate(&self, username: &str, _password: &str) -> IdentityOperationResult {
        let result = self.record(format!("authenticate:{username}"));
        if result.success {
            result.with_tokens(session_tokens())
        } else {
            result
        }
    }

    async fn confirm_sign_up(&self, username: &str, code: &str) -> IdentityOperationResult {
        self.record(format!("confirm_sign_up:{username}:{code}"))
    }

    async fn request_password_reset(&self, username: &str) -> IdentityOperationResult {
        self.record(format!("request_password_reset:{username}"))
    }

    async fn confirm_password_reset(
        &self,
        username: &str,
        code: &str,
        new_password: &str,
    ) -> IdentityOperationResult {
        self.record(format!("confirm_password_reset:{username}:{code}:{new_password}"))
    }
}

/// State whose key ring points at `jwks_url` and has not been refreshed.
pub fn state_with_jwks(jwks_url: &str, identity: Arc<dyn IdentityProvider>) -> AppState {
    let keyring = KeyRing::new(jwks_url, Duration::from_secs(2))
        .unwrap()
        .with_min_refresh_interval(Duration::ZERO);
    let verifier = TokenVerifier::new(Arc::new(keyring)).with_issuer(TEST_ISSUER);
    AppState::new(verifier, identity)
}

/// State with an empty key ring that can never be filled.
pub fn test_state(identity: Arc<dyn IdentityProvider>) -> AppState {
    state_with_jwks(UNREACHABLE_JWKS_URL, identity)
}
