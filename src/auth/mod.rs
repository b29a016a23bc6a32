// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Token Verification
//!
//! Verifies bearer tokens minted by the Cognito user pool.
//!
//! ## Flow
//!
//! 1. At startup the [`KeyRing`] fetches the pool's JWKS
//!    (`https://cognito-idp.<region>.amazonaws.com/<pool-id>/.well-known/jwks.json`)
//! 2. A [`KeyRefresher`] keeps the ring current in the background
//! 3. Protected routes pass through [`middleware::require_token`], which reads
//!    the body field `token` and runs the [`TokenVerifier`]
//!
//! ## Security
//!
//! - Only RS256 is accepted; the header `alg` is never trusted on its own
//! - Every rejection renders the same 401 so the failing check is not leaked
//! - A failed JWKS refresh keeps the previous keys
//! - `exp` and `nbf` are enforced without clock skew tolerance

pub mod error;
pub mod keyring;
pub mod middleware;
pub mod refresher;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::AuthError;
pub use keyring::{FetchError, KeyRing, SigningKeySet, VerificationKey};
pub use refresher::KeyRefresher;
pub use verifier::{TokenVerifier, VerifiedToken};
