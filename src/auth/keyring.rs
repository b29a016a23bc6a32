// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing key cache backed by the user pool's JWKS document.
//!
//! ## Consistency
//!
//! The key set is an immutable [`SigningKeySet`] snapshot held in an
//! [`ArcSwap`]. A refresh builds a complete new snapshot and publishes it with
//! a single pointer swap, so a concurrent [`KeyRing::lookup`] sees either the
//! old set or the new one, never a mix. A failed refresh publishes nothing
//! and the previous snapshot stays in place.
//!
//! ## Startup
//!
//! Until the first successful refresh the ring holds an empty snapshot.
//! Lookups against it simply return `None`, which the verifier reports as an
//! unknown key. [`KeyRing::is_ready`] exposes whether a refresh has ever
//! succeeded.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Default timeout for a single JWKS fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimum spacing between refreshes triggered by unknown key ids.
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Error raised when the key set could not be refreshed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("JWKS request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("HTTP {0} from JWKS endpoint")]
    Status(u16),

    #[error("JWKS document is not valid JSON: {0}")]
    InvalidDocument(#[source] serde_json::Error),

    #[error("JWK `{kid}` is invalid: {reason}")]
    InvalidKey { kid: String, reason: String },

    #[error("JWKS document contains no keys")]
    EmptyKeySet,
}

/// JWKS document as served by the identity provider.
#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<JwkRecord>,
}

/// One JSON Web Key entry. Every field is optional at the serde level so a
/// missing member is reported by name instead of as a generic parse error.
#[derive(Debug, Deserialize)]
struct JwkRecord {
    kty: Option<String>,
    kid: Option<String>,
    n: Option<String>,
    e: Option<String>,
    alg: Option<String>,
    #[serde(rename = "use")]
    key_use: Option<String>,
}

/// Public key usable for signature verification only.
#[derive(Clone)]
pub struct VerificationKey {
    key_id: String,
    algorithm: Option<Algorithm>,
    decoding_key: DecodingKey,
}

impl VerificationKey {
    /// Build a key from the base64url-encoded RSA modulus and exponent.
    pub fn from_rsa_components(
        key_id: impl Into<String>,
        modulus: &str,
        exponent: &str,
        algorithm: Option<Algorithm>,
    ) -> Result<Self, FetchError> {
        let key_id = key_id.into();
        if modulus.is_empty() || exponent.is_empty() {
            return Err(FetchError::InvalidKey {
                kid: key_id,
                reason: "empty modulus or exponent".to_string(),
            });
        }
        let decoding_key =
            DecodingKey::from_rsa_components(modulus, exponent).map_err(|e| {
                FetchError::InvalidKey {
                    kid: key_id.clone(),
                    reason: format!("failed to create RSA key: {e}"),
                }
            })?;

        Ok(Self {
            key_id,
            algorithm,
            decoding_key,
        })
    }

    fn from_jwk(record: JwkRecord) -> Result<Self, FetchError> {
        let kid = record
            .kid
            .filter(|k| !k.is_empty())
            .ok_or_else(|| FetchError::InvalidKey {
                kid: "<none>".to_string(),
                reason: "missing `kid`".to_string(),
            })?;
        let missing = |field: &str| FetchError::InvalidKey {
            kid: kid.clone(),
            reason: format!("missing `{field}`"),
        };

        let kty = record.kty.ok_or_else(|| missing("kty"))?;
        let n = record.n.ok_or_else(|| missing("n"))?;
        let e = record.e.ok_or_else(|| missing("e"))?;

        if kty != "RSA" {
            return Err(FetchError::InvalidKey {
                kid,
                reason: format!("unsupported key type `{kty}`"),
            });
        }

        let algorithm = match record.alg.as_deref() {
            None => None,
            Some(alg) => Some(Algorithm::from_str(alg).map_err(|_| FetchError::InvalidKey {
                kid: kid.clone(),
                reason: format!("unknown algorithm `{alg}`"),
            })?),
        };

        Self::from_rsa_components(kid, &n, &e, algorithm)
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Algorithm pinned by the JWK `alg` member, if the provider published one.
    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationKey")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Immutable snapshot of the provider's signing keys.
#[derive(Debug, Default)]
pub struct SigningKeySet {
    keys: HashMap<String, Arc<VerificationKey>>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl SigningKeySet {
    fn from_document(document: JwksDocument) -> Result<Self, FetchError> {
        let mut keys = HashMap::with_capacity(document.keys.len());

        for record in document.keys {
            if record.key_use.as_deref() == Some("enc") {
                debug!(kid = ?record.kid, "Skipping encryption key in JWKS");
                continue;
            }
            let key = VerificationKey::from_jwk(record)?;
            let kid = key.key_id.clone();
            if keys.insert(kid.clone(), Arc::new(key)).is_some() {
                return Err(FetchError::InvalidKey {
                    kid,
                    reason: "duplicate `kid`".to_string(),
                });
            }
        }

        if keys.is_empty() {
            return Err(FetchError::EmptyKeySet);
        }

        Ok(Self {
            keys,
            refreshed_at: Some(Utc::now()),
        })
    }

    pub fn get(&self, key_id: &str) -> Option<Arc<VerificationKey>> {
        self.keys.get(key_id).cloned()
    }

    pub fn contains(&self, key_id: &str) -> bool {
        self.keys.contains_key(key_id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// When this snapshot was fetched; `None` for the initial empty set.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }
}

#[derive(Debug, Default)]
struct RefreshState {
    last_attempt: Option<Instant>,
}

/// Process-wide cache of the identity provider's public signing keys.
pub struct KeyRing {
    jwks_url: String,
    client: reqwest::Client,
    keys: ArcSwap<SigningKeySet>,
    refresh_state: Mutex<RefreshState>,
    min_refresh_interval: Duration,
}

impl KeyRing {
    /// Create an empty key ring for the given JWKS endpoint.
    ///
    /// No request is made until [`KeyRing::refresh`] is called.
    pub fn new(jwks_url: impl Into<String>, fetch_timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(FetchError::Request)?;

        Ok(Self {
            jwks_url: jwks_url.into(),
            client,
            keys: ArcSwap::from_pointee(SigningKeySet::default()),
            refresh_state: Mutex::new(RefreshState::default()),
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
        })
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Look up a verification key. Never blocks, never fetches.
    pub fn lookup(&self, key_id: &str) -> Option<Arc<VerificationKey>> {
        self.keys.load().get(key_id)
    }

    /// Current snapshot of the whole key set.
    pub fn snapshot(&self) -> Arc<SigningKeySet> {
        self.keys.load_full()
    }

    /// Whether at least one refresh has succeeded.
    pub fn is_ready(&self) -> bool {
        self.keys.load().refreshed_at.is_some()
    }

    pub fn len(&self) -> usize {
        self.keys.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.load().is_empty()
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.keys.load().refreshed_at
    }

    /// Fetch the JWKS document and atomically replace the key set.
    ///
    /// On error the previous key set is retained.
    pub async fn refresh(&self) -> Result<(), FetchError> {
        let mut state = self.refresh_state.lock().await;
        self.refresh_locked(&mut state).await
    }

    /// Refresh in response to an unknown key id, at most once per
    /// `min_refresh_interval`.
    ///
    /// Returns `Ok(false)` when the call was throttled. Callers that queue up
    /// behind an in-flight refresh observe its attempt time and skip.
    pub async fn refresh_on_miss(&self) -> Result<bool, FetchError> {
        let mut state = self.refresh_state.lock().await;
        if let Some(last) = state.last_attempt {
            if last.elapsed() < self.min_refresh_interval {
                debug!("JWKS refresh-on-miss throttled");
                return Ok(false);
            }
        }
        self.refresh_locked(&mut state).await.map(|()| true)
    }

    async fn refresh_locked(&self, state: &mut RefreshState) -> Result<(), FetchError> {
        state.last_attempt = Some(Instant::now());

        match self.fetch().await {
            Ok(set) => {
                info!(
                    jwks_url = %self.jwks_url,
                    keys = set.len(),
                    "JWKS refreshed"
                );
                self.publish(set);
                Ok(())
            }
            Err(e) => {
                warn!(
                    jwks_url = %self.jwks_url,
                    error = %e,
                    retained_keys = self.len(),
                    "JWKS refresh failed; keeping previous key set"
                );
                Err(e)
            }
        }
    }

    async fn fetch(&self) -> Result<SigningKeySet, FetchError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(FetchError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(FetchError::Request)?;
        let document: JwksDocument =
            serde_json::from_slice(&body).map_err(FetchError::InvalidDocument)?;

        SigningKeySet::from_document(document)
    }

    fn publish(&self, set: SigningKeySet) {
        self.keys.store(Arc::new(set));
    }
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing")
            .field("jwks_url", &self.jwks_url)
            .field("keys", &self.len())
            .field("ready", &self.is_ready())
            .finish()
    }
}
