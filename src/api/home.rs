// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{Extension, Json};
use tracing::debug;

use crate::{auth::VerifiedToken, models::StatusResponse, models::TokenBody};

/// Protected landing route; reachable only with a verified token.
#[utoipa::path(
    post,
    path = "/home",
    request_body = TokenBody,
    tag = "Protected",
    responses(
        (status = 200, description = "Token accepted", body = StatusResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn home(Extension(token): Extension<VerifiedToken>) -> Json<StatusResponse> {
    debug!(sub = token.subject.as_deref().unwrap_or("-"), "Home requested");
    Json(StatusResponse::ok())
}
