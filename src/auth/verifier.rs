// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification against the [`KeyRing`].
//!
//! Verification is a linear sequence of checks; the first failing check
//! rejects the token:
//!
//! 1. a token is present
//! 2. it is a three-segment JWT whose header and payload decode
//! 3. its `kid` resolves in the key ring (one throttled refresh on a miss)
//! 4. its `alg` is allow-listed and the signature, `exp`, `nbf`, `iss` and
//!    optionally `aud` check out
//!
//! The header's `alg` is only compared against the allow-list; the
//! [`Validation`] is always built from the allow-list itself.

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;
use tracing::debug;

use super::error::AuthError;
use super::keyring::KeyRing;

/// Algorithms accepted on incoming tokens.
pub const ALLOWED_ALGORITHMS: &[Algorithm] = &[Algorithm::RS256];

/// No clock skew tolerance: a token is expired from its `exp` second on.
const CLOCK_SKEW_LEEWAY: u64 = 0;

/// Claims read after the signature has been verified.
#[derive(Debug, Deserialize)]
struct TokenClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    token_use: Option<String>,
}

/// Marker attached to a request once its token passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub key_id: String,
    pub subject: Option<String>,
    pub token_use: Option<String>,
}

/// Verifies bearer tokens issued by the user pool.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    keyring: Arc<KeyRing>,
    issuer: Option<String>,
    audience: Option<String>,
}

impl TokenVerifier {
    pub fn new(keyring: Arc<KeyRing>) -> Self {
        Self {
            keyring,
            issuer: None,
            audience: None,
        }
    }

    /// Require the `iss` claim to equal `issuer`.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Require the `aud` claim to contain `audience`.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn keyring(&self) -> &Arc<KeyRing> {
        &self.keyring
    }

    /// Verify a token taken from a request.
    pub async fn verify(&self, token: Option<&str>) -> Result<VerifiedToken, AuthError> {
        let result = self.verify_inner(token).await;
        if let Err(e) = &result {
            debug!(reason = e.reason(), "Token rejected");
        }
        result
    }

    async fn verify_inner(&self, token: Option<&str>) -> Result<VerifiedToken, AuthError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthenticated)?;

        if token.split('.').count() != 3 {
            return Err(AuthError::Malformed);
        }
        let header = decode_header(token).map_err(|_| AuthError::Malformed)?;
        jsonwebtoken::dangerous::insecure_decode::<serde_json::Map<String, serde_json::Value>>(
            token,
        )
        .map_err(|_| AuthError::Malformed)?;

        let kid = header.kid.as_deref().ok_or(AuthError::UnknownKey)?;
        let key = match self.keyring.lookup(kid) {
            Some(key) => key,
            None => {
                if let Err(e) = self.keyring.refresh_on_miss().await {
                    debug!(kid = %kid, error = %e, "JWKS refresh after unknown kid failed");
                }
                self.keyring.lookup(kid).ok_or(AuthError::UnknownKey)?
            }
        };

        if !ALLOWED_ALGORITHMS.contains(&header.alg) {
            debug!(kid = %kid, alg = ?header.alg, "Token algorithm not allowed");
            return Err(AuthError::InvalidSignature);
        }
        if let Some(pinned) = key.algorithm() {
            if pinned != header.alg {
                debug!(kid = %kid, alg = ?header.alg, pinned = ?pinned, "Token algorithm does not match key");
                return Err(AuthError::InvalidSignature);
            }
        }

        let token_data = decode::<TokenClaims>(token, key.decoding_key(), &self.validation())
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::ImmatureSignature => AuthError::NotYetValid,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::InvalidSignature
                }
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                ErrorKind::MissingRequiredClaim(claim) if claim == "iss" => {
                    AuthError::InvalidIssuer
                }
                ErrorKind::MissingRequiredClaim(claim) if claim == "aud" => {
                    AuthError::InvalidAudience
                }
                _ => AuthError::Malformed,
            })?;

        Ok(VerifiedToken {
            key_id: kid.to_string(),
            subject: token_data.claims.sub,
            token_use: token_data.claims.token_use,
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(ALLOWED_ALGORITHMS[0]);
        validation.algorithms = ALLOWED_ALGORITHMS.to_vec();
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // `exp` and `nbf` are checked when present but not required.
        validation.required_spec_claims.clear();

        if let Some(ref issuer) = self.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(ref audience) = self.audience {
            validation.set_audience(&[audience]);
        } else {
            validation.validate_aud = false;
        }

        validation
    }
}
