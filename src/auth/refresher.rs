// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # JWKS Refresher
//!
//! Background task that keeps the [`KeyRing`] current so provider-side key
//! rotation is picked up without a restart.
//!
//! Every `interval` (default 1 h) the refresher refetches the JWKS. After a
//! failed fetch it retries sooner, every `retry_interval` (default 30 s), until
//! a fetch succeeds. A failure never clears the ring.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::keyring::KeyRing;

/// Delay before retrying after a failed refresh.
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(30);

pub struct KeyRefresher {
    keyring: Arc<KeyRing>,
    interval: Duration,
    retry_interval: Duration,
}

impl KeyRefresher {
    pub fn new(keyring: Arc<KeyRing>, interval: Duration) -> Self {
        Self {
            keyring,
            interval,
            retry_interval: DEFAULT_RETRY_INTERVAL.min(interval),
        }
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Run until the cancellation token is triggered.
    ///
    /// The first refresh happens one period after start (startup performs its
    /// own initial refresh), or one retry period if the ring is still empty.
    ///
    /// ```rust,ignore
    /// tokio::spawn(refresher.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            jwks_url = %self.keyring.jwks_url(),
            "JWKS refresher starting"
        );

        let mut next = if self.keyring.is_ready() {
            self.interval
        } else {
            self.retry_interval
        };

        loop {
            tokio::select! {
                _ = tokio::time::sleep(next) => {},
                _ = shutdown.cancelled() => {
                    info!("JWKS refresher shutting down");
                    return;
                }
            }

            next = match self.keyring.refresh().await {
                Ok(()) => self.interval,
                Err(e) => {
                    warn!(
                        error = %e,
                        retry_secs = self.retry_interval.as_secs(),
                        "JWKS refresher: refresh failed"
                    );
                    self.retry_interval
                }
            };
        }
    }
}

/// Wait for a spawned refresher to stop. A panicked task is logged and
/// returned as the error.
pub async fn join(task: JoinHandle<()>) -> Result<(), JoinError> {
    task.await.inspect_err(|e| {
        warn!(error = %e, panicked = e.is_panic(), "JWKS refresher task ended abnormally");
    })
}
