// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cognito Auth Gateway - Credential and Token Gateway
//!
//! Fronts an AWS Cognito user pool. Credential flows (sign-up, sign-in,
//! confirmation, password reset) are delegated to Cognito; bearer tokens on
//! protected routes are verified locally against the pool's JWKS.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - JWKS key ring and token verification
//! - `identity` - Identity provider abstraction and Cognito client
//! - `validation` - Request field rules

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod state;
pub mod validation;
