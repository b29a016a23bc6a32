// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup. All values
//! are process-wide and immutable afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AWS_REGION` | Region of the Cognito user pool | `us-east-1` |
//! | `AWS_POOL_ID` | Cognito user pool id | Required |
//! | `COGNITO_CLIENT_ID` | App client id used for identity operations | Required |
//! | `COGNITO_CLIENT_SECRET` | App client secret (enables `SecretHash`) | Optional |
//! | `COGNITO_AUDIENCE` | Expected `aud` claim on verified tokens | Optional |
//! | `COGNITO_ENDPOINT` | Override of the Cognito API endpoint | Derived from region |
//! | `JWKS_URL` | Override of the JWKS document URL | Derived from region + pool |
//! | `JWKS_REFRESH_INTERVAL_SECS` | Background key refresh period | `3600` |
//! | `JWKS_FETCH_TIMEOUT_SECS` | Timeout for a single JWKS fetch | `10` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `5000` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::time::Duration;

use url::Url;

pub const AWS_REGION_ENV: &str = "AWS_REGION";
pub const AWS_POOL_ID_ENV: &str = "AWS_POOL_ID";
pub const COGNITO_CLIENT_ID_ENV: &str = "COGNITO_CLIENT_ID";
pub const COGNITO_CLIENT_SECRET_ENV: &str = "COGNITO_CLIENT_SECRET";
pub const COGNITO_AUDIENCE_ENV: &str = "COGNITO_AUDIENCE";
pub const COGNITO_ENDPOINT_ENV: &str = "COGNITO_ENDPOINT";
pub const JWKS_URL_ENV: &str = "JWKS_URL";
pub const JWKS_REFRESH_INTERVAL_ENV: &str = "JWKS_REFRESH_INTERVAL_SECS";
pub const JWKS_FETCH_TIMEOUT_ENV: &str = "JWKS_FETCH_TIMEOUT_SECS";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3600;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Process-wide gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub region: String,
    pub pool_id: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub audience: Option<String>,
    pub cognito_endpoint: String,
    pub jwks_url: String,
    pub refresh_interval: Duration,
    pub fetch_timeout: Duration,
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let region = get(AWS_REGION_ENV).unwrap_or_else(|| DEFAULT_REGION.to_string());
        let pool_id = get(AWS_POOL_ID_ENV).ok_or(ConfigError::Missing(AWS_POOL_ID_ENV))?;
        let client_id =
            get(COGNITO_CLIENT_ID_ENV).ok_or(ConfigError::Missing(COGNITO_CLIENT_ID_ENV))?;

        let cognito_endpoint = match get(COGNITO_ENDPOINT_ENV) {
            Some(url) => parse_url(COGNITO_ENDPOINT_ENV, &url)?,
            None => cognito_endpoint(&region),
        };
        let jwks_url = match get(JWKS_URL_ENV) {
            Some(url) => parse_url(JWKS_URL_ENV, &url)?,
            None => jwks_url(&region, &pool_id),
        };

        let refresh_interval = Duration::from_secs(parse_number(
            JWKS_REFRESH_INTERVAL_ENV,
            get(JWKS_REFRESH_INTERVAL_ENV),
            DEFAULT_REFRESH_INTERVAL_SECS,
        )?);
        let fetch_timeout = Duration::from_secs(parse_number(
            JWKS_FETCH_TIMEOUT_ENV,
            get(JWKS_FETCH_TIMEOUT_ENV),
            DEFAULT_FETCH_TIMEOUT_SECS,
        )?);

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };
        let bind_addr: SocketAddr =
            format!("{host}:{port}")
                .parse()
                .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                    name: HOST_ENV,
                    reason: e.to_string(),
                })?;

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    reason: format!("expected `json` or `pretty`, got `{other}`"),
                })
            }
        };

        Ok(Self {
            region,
            pool_id,
            client_id,
            client_secret: get(COGNITO_CLIENT_SECRET_ENV),
            audience: get(COGNITO_AUDIENCE_ENV),
            cognito_endpoint,
            jwks_url,
            refresh_interval,
            fetch_timeout,
            bind_addr,
            log_format,
        })
    }

    /// Issuer claim carried by tokens minted for this user pool.
    pub fn issuer(&self) -> String {
        issuer(&self.region, &self.pool_id)
    }
}

/// `https://cognito-idp.<region>.amazonaws.com/<pool-id>`
pub fn issuer(region: &str, pool_id: &str) -> String {
    format!("https://cognito-idp.{region}.amazonaws.com/{pool_id}")
}

/// Well-known JWKS location for a user pool.
pub fn jwks_url(region: &str, pool_id: &str) -> String {
    format!("{}/.well-known/jwks.json", issuer(region, pool_id))
}

/// Regional Cognito user-pool API endpoint.
pub fn cognito_endpoint(region: &str) -> String {
    format!("https://cognito-idp.{region}.amazonaws.com/")
}

fn parse_url(name: &'static str, raw: &str) -> Result<String, ConfigError> {
    Url::parse(raw)
        .map(|u| u.to_string())
        .map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })
}

fn parse_number(name: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(value) => Ok(value),
        Err(e) => Err(ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}
