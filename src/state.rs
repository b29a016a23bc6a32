// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{KeyRing, TokenVerifier};
use crate::identity::IdentityProvider;

#[derive(Clone)]
pub struct AppState {
    pub keyring: Arc<KeyRing>,
    pub verifier: Arc<TokenVerifier>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// The key ring shared with the verifier is also exposed for readiness.
    pub fn new(verifier: TokenVerifier, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            keyring: verifier.keyring().clone(),
            verifier: Arc::new(verifier),
            identity,
        }
    }
}
