// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential endpoints delegated to the identity provider.
//!
//! Every handler validates its body first; the provider is only called once
//! validation has passed. A provider failure becomes a generic 400; the
//! provider's error code is logged, never returned.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use super::payload::Payload;
use crate::{
    error::ApiError,
    identity::{IdentityOperationResult, NewUser, SessionTokens},
    models::{
        ConfirmPasswordRequest, ForgotPasswordRequest, SignInRequest, SignUpRequest,
        VerifyRequest,
    },
    state::AppState,
    validation::Validate,
};

/// Map a provider outcome to the externally visible status.
fn finish(operation: &'static str, result: &IdentityOperationResult) -> Result<(), ApiError> {
    if result.success {
        info!(operation, "Identity operation succeeded");
        Ok(())
    } else {
        info!(
            operation,
            error_code = result.error_code.as_deref().unwrap_or("unknown"),
            "Identity operation failed"
        );
        Err(ApiError::bad_request("Request could not be completed"))
    }
}

#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignUpRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "User created"),
        (status = 400, description = "Identity provider rejected the request", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody)
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Payload(request): Payload<SignUpRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;
    let user = NewUser::from(request);
    let result = state.identity.create_user(&user).await;
    finish("signup", &result)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/auth/signin",
    request_body = SignInRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Signed in", body = SessionTokens),
        (status = 400, description = "Identity provider rejected the request", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody)
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Payload(request): Payload<SignInRequest>,
) -> Result<Response, ApiError> {
    request.validate()?;
    let result = state
        .identity
        .authenticate(&request.username, &request.password)
        .await;
    finish("signin", &result)?;

    Ok(match result.tokens {
        Some(tokens) => Json(tokens).into_response(),
        None => StatusCode::OK.into_response(),
    })
}

#[utoipa::path(
    post,
    path = "/auth/verify",
    request_body = VerifyRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Sign-up confirmed"),
        (status = 400, description = "Identity provider rejected the request", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody)
    )
)]
pub async fn verify(
    State(state): State<AppState>,
    Payload(request): Payload<VerifyRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;
    let result = state
        .identity
        .confirm_sign_up(&request.username, &request.code)
        .await;
    finish("verify", &result)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Reset code sent"),
        (status = 400, description = "Identity provider rejected the request", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody)
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Payload(request): Payload<ForgotPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;
    let result = state.identity.request_password_reset(&request.username).await;
    finish("forgot-password", &result)?;
    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/auth/confirm-password",
    request_body = ConfirmPasswordRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Identity provider rejected the request", body = crate::error::ErrorBody),
        (status = 422, description = "Validation failed", body = crate::error::ErrorBody)
    )
)]
pub async fn confirm_password(
    State(state): State<AppState>,
    Payload(request): Payload<ConfirmPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;
    let result = state
        .identity
        .confirm_password_reset(&request.username, &request.code, &request.password)
        .await;
    finish("confirm-password", &result)?;
    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{test_state, RecordingIdentity};
    use std::sync::Arc;

    #[tokio::test]
    async fn sign_in_validation_failure_skips_provider() {
        let identity = Arc::new(RecordingIdentity::succeeding());
        let state = test_state(identity.clone());

        let err = sign_in(
            State(state),
            Payload(SignInRequest {
                username: "ab".into(),
                password: "short".into(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(identity.calls().is_empty());
    }

    #[tokio::test]
    async fn sign_in_returns_tokens() {
        let identity = Arc::new(RecordingIdentity::succeeding());
        let state = test_state(identity.clone());

        let response = sign_in(
            State(state),
            Payload(SignInRequest {
                username: "alice01".into(),
                password: "password1".into(),
            }),
        )
        .await
        .expect("sign in succeeds");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(identity.calls(), ["authenticate:alice01"]);
    }

    #[tokio::test]
    async fn provider_failure_is_generic_400() {
        let identity = Arc::new(RecordingIdentity::failing("UsernameExistsException"));
        let state = test_state(identity.clone());

        let err = sign_up(
            State(state),
            Payload(SignUpRequest {
                username: "alice01".into(),
                password: "password1".into(),
                email: "Alice@Example.com".into(),
                birthdate: "1990-04-01".into(),
                name: "Alice".into(),
                family_name: "Liddell".into(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(!err.message.contains("UsernameExists"));
        assert_eq!(identity.calls(), ["create_user:alice01:alice@example.com"]);
    }

    #[tokio::test]
    async fn confirm_password_passes_code_and_password() {
        let identity = Arc::new(RecordingIdentity::succeeding());
        let state = test_state(identity.clone());

        let status = confirm_password(
            State(state),
            Payload(ConfirmPasswordRequest {
                username: "alice01".into(),
                password: "new password".into(),
                code: "123456".into(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            identity.calls(),
            ["confirm_password_reset:alice01:123456:new password"]
        );
    }
}
