// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::middleware::require_token,
    error::{ErrorBody, FieldError},
    identity::SessionTokens,
    models::{
        ConfirmPasswordRequest, ForgotPasswordRequest, SignInRequest, SignUpRequest,
        StatusResponse, TokenBody, VerifyRequest,
    },
    state::AppState,
};

pub mod auth;
pub mod health;
pub mod home;
pub mod payload;

#[cfg(test)]
pub(crate) mod testing;

pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(auth::sign_up))
        .route("/signin", post(auth::sign_in))
        .route("/verify", post(auth::verify))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/confirm-password", post(auth::confirm_password));

    let protected_routes = Router::new()
        .route("/home", post(home::home))
        .route_layer(from_fn_with_state(state.clone(), require_token));

    let app_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(app_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::sign_up,
        auth::sign_in,
        auth::verify,
        auth::forgot_password,
        auth::confirm_password,
        home::home,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            SignUpRequest,
            SignInRequest,
            VerifyRequest,
            ForgotPasswordRequest,
            ConfirmPasswordRequest,
            TokenBody,
            SessionTokens,
            StatusResponse,
            ErrorBody,
            FieldError,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "Sign-up, sign-in and password flows"),
        (name = "Protected", description = "Routes requiring a verified token"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
