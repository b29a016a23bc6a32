// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cognito user-pool client for the public (client-id authenticated) actions.
//!
//! Requests use the AWS JSON 1.1 protocol: a POST to the regional endpoint
//! with the action named in `X-Amz-Target`. None of these actions need SigV4;
//! when the app client has a secret, each call carries a `SecretHash`.

use std::time::Duration;

use async_trait::async_trait;
use base64ct::{Base64, Encoding};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::{info, warn};

use super::{IdentityOperationResult, IdentityProvider, NewUser, SessionTokens};
use crate::config::Config;

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Error code reported when Cognito could not be reached or answered garbage.
pub const REQUEST_FAILED_CODE: &str = "RequestFailed";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum CognitoError {
    #[error("Cognito request failed: {0}")]
    Request(String),

    #[error("Cognito rejected {action}: {code}")]
    Rejected { action: &'static str, code: String },

    #[error("Cognito response was invalid: {0}")]
    InvalidResponse(String),
}

impl CognitoError {
    /// Code surfaced in [`IdentityOperationResult::error_code`].
    pub fn code(&self) -> &str {
        match self {
            CognitoError::Rejected { code, .. } => code,
            CognitoError::Request(_) | CognitoError::InvalidResponse(_) => REQUEST_FAILED_CODE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CognitoClient {
    endpoint: String,
    client_id: String,
    client_secret: Option<String>,
    http: Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    #[serde(default)]
    authentication_result: Option<AuthenticationResult>,
    #[serde(default)]
    challenge_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    id_token: String,
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
    token_type: String,
}

impl CognitoClient {
    pub fn new(
        endpoint: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: Option<String>,
    ) -> Result<Self, CognitoError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CognitoError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client_id: client_id.into(),
            client_secret,
            http,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, CognitoError> {
        Self::new(
            config.cognito_endpoint.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
        )
    }

    /// Base64 HMAC-SHA256 of `username + client_id`, keyed by the client secret.
    fn secret_hash(&self, username: &str) -> Option<String> {
        let secret = self.client_secret.as_deref()?;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
        mac.update(username.as_bytes());
        mac.update(self.client_id.as_bytes());
        Some(Base64::encode_string(&mac.finalize().into_bytes()))
    }

    /// Payload fields shared by every action.
    fn base_payload(&self, username: &str) -> serde_json::Map<String, Value> {
        let mut payload = serde_json::Map::new();
        payload.insert("ClientId".to_string(), json!(self.client_id));
        payload.insert("Username".to_string(), json!(username));
        if let Some(hash) = self.secret_hash(username) {
            payload.insert("SecretHash".to_string(), json!(hash));
        }
        payload
    }

    async fn call(
        &self,
        action: &'static str,
        payload: serde_json::Map<String, Value>,
    ) -> Result<Value, CognitoError> {
        let body = serde_json::to_vec(&payload)
            .map_err(|e| CognitoError::InvalidResponse(format!("serialize body failed: {e}")))?;

        let response = self
            .http
            .post(&self.endpoint)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{action}"))
            .header("Content-Type", AMZ_JSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| CognitoError::Request(format!("{action} failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CognitoError::Request(format!("{action} response body unreadable: {e}")))?;

        if !status.is_success() {
            return Err(CognitoError::Rejected {
                action,
                code: error_code(&text).unwrap_or_else(|| format!("HTTP{}", status.as_u16())),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(&text)
            .map_err(|e| CognitoError::InvalidResponse(format!("{action} invalid JSON: {e}")))
    }

    async fn run(
        &self,
        action: &'static str,
        payload: serde_json::Map<String, Value>,
    ) -> IdentityOperationResult {
        match self.call(action, payload).await {
            Ok(_) => {
                info!(action, "Cognito action succeeded");
                IdentityOperationResult::succeeded()
            }
            Err(e) => failure(action, e),
        }
    }
}

#[async_trait]
impl IdentityProvider for CognitoClient {
    async fn create_user(&self, user: &NewUser) -> IdentityOperationResult {
        let mut payload = self.base_payload(&user.username);
        payload.insert("Password".to_string(), json!(user.password));
        payload.insert(
            "UserAttributes".to_string(),
            json!([
                { "Name": "email", "Value": user.email },
                { "Name": "birthdate", "Value": user.birthdate },
                { "Name": "name", "Value": user.name },
                { "Name": "family_name", "Value": user.family_name },
            ]),
        );
        self.run("SignUp", payload).await
    }

    async fn authenticate(&self, username: &str, password: &str) -> IdentityOperationResult {
        let mut parameters = serde_json::Map::new();
        parameters.insert("USERNAME".to_string(), json!(username));
        parameters.insert("PASSWORD".to_string(), json!(password));
        if let Some(hash) = self.secret_hash(username) {
            parameters.insert("SECRET_HASH".to_string(), json!(hash));
        }

        let mut payload = serde_json::Map::new();
        payload.insert("ClientId".to_string(), json!(self.client_id));
        payload.insert("AuthFlow".to_string(), json!("USER_PASSWORD_AUTH"));
        payload.insert("AuthParameters".to_string(), Value::Object(parameters));

        const ACTION: &str = "InitiateAuth";
        let value = match self.call(ACTION, payload).await {
            Ok(value) => value,
            Err(e) => return failure(ACTION, e),
        };

        let response: InitiateAuthResponse = match serde_json::from_value(value) {
            Ok(response) => response,
            Err(e) => {
                return failure(
                    ACTION,
                    CognitoError::InvalidResponse(format!("{ACTION} unexpected shape: {e}")),
                )
            }
        };

        match (response.authentication_result, response.challenge_name) {
            (Some(result), _) => {
                info!(action = ACTION, "Cognito action succeeded");
                IdentityOperationResult::succeeded().with_tokens(SessionTokens {
                    id_token: result.id_token,
                    access_token: result.access_token,
                    refresh_token: result.refresh_token,
                    expires_in: result.expires_in,
                    token_type: result.token_type,
                })
            }
            (None, Some(challenge)) => {
                warn!(action = ACTION, challenge = %challenge, "Cognito requires an auth challenge");
                IdentityOperationResult::failed(challenge)
            }
            (None, None) => failure(
                ACTION,
                CognitoError::InvalidResponse("no AuthenticationResult".to_string()),
            ),
        }
    }

    async fn confirm_sign_up(&self, username: &str, code: &str) -> IdentityOperationResult {
        let mut payload = self.base_payload(username);
        payload.insert("ConfirmationCode".to_string(), json!(code));
        self.run("ConfirmSignUp", payload).await
    }

    async fn request_password_reset(&self, username: &str) -> IdentityOperationResult {
        self.run("ForgotPassword", self.base_payload(username)).await
    }

    async fn confirm_password_reset(
        &self,
        username: &str,
        code: &str,
        new_password: &str,
    ) -> IdentityOperationResult {
        let mut payload = self.base_payload(username);
        payload.insert("ConfirmationCode".to_string(), json!(code));
        payload.insert("Password".to_string(), json!(new_password));
        self.run("ConfirmForgotPassword", payload).await
    }
}

fn failure(action: &'static str, error: CognitoError) -> IdentityOperationResult {
    warn!(action, error = %error, "Cognito action failed");
    IdentityOperationResult::failed(error.code())
}

/// Extract the exception name from a Cognito error body.
///
/// `__type` is either a bare name or a namespaced `prefix#Name`.
fn error_code(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let raw = value.get("__type").and_then(Value::as_str)?;
    let code = raw.rsplit('#').next().unwrap_or(raw).trim();
    (!code.is_empty()).then(|| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    /// Answers one request with a 200 whose body is cut short.
    async fn truncated_body_endpoint() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\n{}")
                .await;
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn unreadable_success_body_is_a_failed_result() {
        let endpoint = truncated_body_endpoint().await;
        let client = CognitoClient::new(endpoint, "client-id", None).unwrap();

        let result = client.request_password_reset("alice01").await;

        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some(REQUEST_FAILED_CODE));
    }

    fn target(action: &str) -> String {
        format!("{TARGET_PREFIX}.{action}")
    }

    fn sample_user() -> NewUser {
        NewUser {
            username: "alice01".to_string(),
            password: "correct horse".to_string(),
            email: "alice@example.com".to_string(),
            birthdate: "1990-04-01".to_string(),
            name: "Alice".to_string(),
            family_name: "Liddell".to_string(),
        }
    }

    #[test]
    fn error_code_strips_namespace() {
        assert_eq!(
            error_code(r#"{"__type":"UsernameExistsException","message":"exists"}"#).as_deref(),
            Some("UsernameExistsException")
        );
        assert_eq!(
            error_code(r#"{"__type":"com.amazonaws.cognito#CodeMismatchException"}"#).as_deref(),
            Some("CodeMismatchException")
        );
        assert!(error_code("not json").is_none());
        assert!(error_code(r#"{"message":"no type"}"#).is_none());
    }

    #[test]
    fn secret_hash_only_with_secret() {
        let public = CognitoClient::new("http://localhost", "client", None).unwrap();
        assert!(public.secret_hash("alice01").is_none());
        assert!(!public.base_payload("alice01").contains_key("SecretHash"));

        let confidential =
            CognitoClient::new("http://localhost", "client", Some("s3cret".to_string())).unwrap();
        let hash = confidential.secret_hash("alice01").unwrap();
        // 32-byte digest, standard base64 with padding.
        assert_eq!(hash.len(), 44);
        assert_eq!(confidential.secret_hash("alice01").unwrap(), hash);
        assert_ne!(confidential.secret_hash("bob0001").unwrap(), hash);
        assert_eq!(confidential.base_payload("alice01")["SecretHash"], json!(hash));
    }

    #[tokio::test]
    async fn sign_up_sends_attributes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", target("SignUp").as_str()))
            .and(header("content-type", AMZ_JSON_CONTENT_TYPE))
            .and(body_partial_json(json!({
                "ClientId": "client",
                "Username": "alice01",
                "Password": "correct horse",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "UserConfirmed": false,
                "UserSub": "5f1c7c2e-0000-4000-8000-000000000001"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CognitoClient::new(server.uri(), "client", None).unwrap();
        let result = client.create_user(&sample_user()).await;
        assert_eq!(result, IdentityOperationResult::succeeded());

        let requests: Vec<Request> = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let attributes = body["UserAttributes"].as_array().unwrap();
        assert_eq!(attributes.len(), 4);
        assert!(attributes.contains(&json!({ "Name": "birthdate", "Value": "1990-04-01" })));
    }

    #[tokio::test]
    async fn rejection_carries_exception_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "__type": "UsernameExistsException",
                "message": "User already exists"
            })))
            .mount(&server)
            .await;

        let client = CognitoClient::new(server.uri(), "client", None).unwrap();
        let result = client.create_user(&sample_user()).await;
        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some("UsernameExistsException"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_failed_result() {
        // Port 9 (discard) on localhost is not listening in test environments.
        let client = CognitoClient::new("http://127.0.0.1:9/", "client", None).unwrap();
        let result = client.request_password_reset("alice01").await;
        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some(REQUEST_FAILED_CODE));
    }

    #[tokio::test]
    async fn authenticate_returns_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", target("InitiateAuth").as_str()))
            .and(body_partial_json(json!({
                "AuthFlow": "USER_PASSWORD_AUTH",
                "AuthParameters": { "USERNAME": "alice01", "PASSWORD": "correct horse" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "AuthenticationResult": {
                    "AccessToken": "access",
                    "ExpiresIn": 3600,
                    "IdToken": "id",
                    "RefreshToken": "refresh",
                    "TokenType": "Bearer"
                },
                "ChallengeParameters": {}
            })))
            .mount(&server)
            .await;

        let client = CognitoClient::new(server.uri(), "client", None).unwrap();
        let result = client.authenticate("alice01", "correct horse").await;
        assert!(result.success);
        let tokens = result.tokens.unwrap();
        assert_eq!(tokens.id_token, "id");
        assert_eq!(tokens.access_token, "access");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(tokens.expires_in, 3600);
    }

    #[tokio::test]
    async fn authenticate_challenge_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ChallengeName": "NEW_PASSWORD_REQUIRED",
                "Session": "opaque"
            })))
            .mount(&server)
            .await;

        let client = CognitoClient::new(server.uri(), "client", None).unwrap();
        let result = client.authenticate("alice01", "correct horse").await;
        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some("NEW_PASSWORD_REQUIRED"));
        assert!(result.tokens.is_none());
    }

    #[tokio::test]
    async fn confirmation_actions_send_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", target("ConfirmSignUp").as_str()))
            .and(body_partial_json(json!({ "Username": "alice01", "ConfirmationCode": "123456" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", target("ConfirmForgotPassword").as_str()))
            .and(body_partial_json(json!({
                "Username": "alice01",
                "ConfirmationCode": "654321",
                "Password": "new password"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = CognitoClient::new(server.uri(), "client", None).unwrap();
        assert!(client.confirm_sign_up("alice01", "123456").await.success);
        assert!(
            client
                .confirm_password_reset("alice01", "654321", "new password")
                .await
                .success
        );
    }
}
