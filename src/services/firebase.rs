// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Authentication client (Identity Toolkit REST API).
//!
//! Handles:
//! - Account creation and lookup (admin API, service-account bearer)
//! - Email/password sign-in (client API, web API key)
//! - ID token verification against the securetoken key set

use crate::config::Config;
use crate::services::identity::{
    IdentityError, IdentityProvider, NewUser, SignInResult, TokenClaims, UserRecord,
};
use crate::services::jwks::{JwksSource, JwksVerifier, TokenError};
use anyhow::Context;
use async_trait::async_trait;
use gcloud_sdk::{GoogleAuthTokenGenerator, TokenSourceType};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURETOKEN_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const SECURETOKEN_ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const MAX_UID_LEN: usize = 128;

/// OAuth2 scopes required by the Identity Toolkit admin API.
pub const IDENTITY_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/identitytoolkit",
    "https://www.googleapis.com/auth/cloud-platform",
];

/// Firebase Authentication backed by the Identity Toolkit API.
pub struct FirebaseAuth {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    api_key: String,
    access_tokens: GoogleAuthTokenGenerator,
    id_token_verifier: JwksVerifier,
}

impl FirebaseAuth {
    /// Create a client for the project and credentials in `config`.
    ///
    /// Uses the inline service account key when configured, otherwise
    /// application default credentials (key file or metadata server).
    pub async fn new(config: &Config, http: reqwest::Client) -> anyhow::Result<Self> {
        let token_source = match &config.service_account_json {
            Some(json) => TokenSourceType::Json(json.clone()),
            None => TokenSourceType::Default,
        };

        Self::with_token_source(config, http, token_source).await
    }

    /// Create a client that authenticates admin calls with `token_source`.
    pub async fn with_token_source(
        config: &Config,
        http: reqwest::Client,
        token_source: TokenSourceType,
    ) -> anyhow::Result<Self> {
        tracing::info!(
            project = %config.firebase_project_id,
            credentials = ?token_source,
            "Initializing Firebase Authentication client"
        );

        let access_tokens = GoogleAuthTokenGenerator::new(
            token_source,
            IDENTITY_SCOPES.iter().map(|scope| scope.to_string()).collect(),
        )
        .await
        .context("Failed to create service account token source")?;

        let id_token_verifier = JwksVerifier::new(
            http.clone(),
            id_token_source(&config.firebase_project_id),
        );

        Ok(Self {
            http,
            base_url: IDENTITY_TOOLKIT_URL.to_string(),
            project_id: config.firebase_project_id.clone(),
            api_key: config.firebase_api_key.clone(),
            access_tokens,
            id_token_verifier,
        })
    }

    /// Send Identity Toolkit requests to `base_url` instead of the public endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the ID token verifier (e.g. with a static-key verifier).
    pub fn with_id_token_verifier(mut self, verifier: JwksVerifier) -> Self {
        self.id_token_verifier = verifier;
        self
    }

    fn admin_url(&self, method: &str) -> String {
        format!("{}/projects/{}/{}", self.base_url, self.project_id, method)
    }

    /// POST an admin request with a service-account bearer token.
    async fn admin_post<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, IdentityError> {
        let access_token = self.access_tokens.create_token().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to obtain service account access token");
            IdentityError::Transport(format!("access token unavailable: {e}"))
        })?;

        let response = self
            .http
            .post(self.admin_url(method))
            .header(AUTHORIZATION, access_token.header_value())
            .json(body)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        check_response_json(response).await
    }
}

/// Key set and claim expectations for Firebase ID tokens of `project_id`.
pub fn id_token_source(project_id: &str) -> JwksSource {
    JwksSource {
        discovery_url: None,
        jwks_url: SECURETOKEN_JWKS_URL.to_string(),
        issuers: vec![format!("{SECURETOKEN_ISSUER_PREFIX}{project_id}")],
        audience: project_id.to_string(),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateAccountRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    local_id: Option<&'a str>,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    local_id: [&'a str; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
}

impl From<AccountInfo> for UserRecord {
    fn from(info: AccountInfo) -> Self {
        Self {
            uid: info.local_id,
            email: info.email,
            display_name: info.display_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    local_id: String,
    email: String,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Claims carried by a Firebase ID token.
#[derive(Debug, Deserialize)]
struct FirebaseIdTokenClaims {
    sub: String,
    user_id: Option<String>,
    exp: u64,
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, IdentityError> {
        let request = CreateAccountRequest {
            local_id: user.uid.as_deref(),
            email: &user.email,
            password: user.password.as_deref(),
            display_name: user.display_name.as_deref(),
        };

        let created: AccountInfo = self
            .admin_post("accounts", &request)
            .await
            .map_err(|e| match e {
                IdentityError::EmailAlreadyExists(_) => {
                    IdentityError::EmailAlreadyExists(user.email.clone())
                }
                IdentityError::UidAlreadyExists(_) => {
                    IdentityError::UidAlreadyExists(user.uid.clone().unwrap_or_default())
                }
                other => other,
            })?;

        tracing::info!(uid = %created.local_id, "Created Firebase user");

        // The create response omits fields that were not set explicitly.
        Ok(UserRecord {
            uid: created.local_id,
            email: created.email.or(Some(user.email)),
            display_name: created.display_name.or(user.display_name),
        })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignInResult, IdentityError> {
        let url = format!("{}/accounts:signInWithPassword", self.base_url);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let signed_in: SignInResponse = check_response_json(response).await?;

        Ok(SignInResult {
            id_token: signed_in.id_token,
            uid: signed_in.local_id,
            email: signed_in.email,
            display_name: signed_in.display_name.filter(|name| !name.is_empty()),
        })
    }

    async fn get_user(&self, uid: &str) -> Result<UserRecord, IdentityError> {
        let found: LookupResponse = self
            .admin_post("accounts:lookup", &LookupRequest { local_id: [uid] })
            .await?;

        found
            .users
            .into_iter()
            .next()
            .map(UserRecord::from)
            .ok_or_else(|| IdentityError::UserNotFound(uid.to_string()))
    }

    async fn verify_id_token(&self, token: &str) -> Result<TokenClaims, IdentityError> {
        let claims: FirebaseIdTokenClaims = self
            .id_token_verifier
            .verify(token)
            .await
            .map_err(|e| match e {
                TokenError::Expired => IdentityError::ExpiredIdToken,
                TokenError::Invalid(msg) => IdentityError::InvalidIdToken(msg),
                TokenError::Transient(msg) => IdentityError::Transport(msg),
            })?;

        token_claims(claims)
    }
}

fn token_claims(claims: FirebaseIdTokenClaims) -> Result<TokenClaims, IdentityError> {
    if claims.sub.is_empty() || claims.sub.len() > MAX_UID_LEN {
        return Err(IdentityError::InvalidIdToken(
            "ID token has an invalid subject".to_string(),
        ));
    }

    if claims.user_id.as_deref().is_some_and(|uid| uid != claims.sub) {
        return Err(IdentityError::InvalidIdToken(
            "ID token user_id does not match subject".to_string(),
        ));
    }

    Ok(TokenClaims {
        uid: claims.sub,
        expires_at: claims.exp,
    })
}

/// Check the response status and parse the JSON body.
async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, IdentityError> {
    let status = response.status();

    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| IdentityError::Transport(format!("invalid response JSON: {e}")));
    }

    let body = response.text().await.unwrap_or_default();

    if status.is_server_error() || status.as_u16() == 429 {
        tracing::warn!(%status, "Identity Toolkit request failed");
        return Err(IdentityError::Transport(format!("HTTP {status}")));
    }

    Err(classify_error(&body))
}

/// Map an Identity Toolkit error body onto a typed error.
///
/// Messages look like `EMAIL_EXISTS` or `WEAK_PASSWORD : Password should be at least 6 characters`.
fn classify_error(body: &str) -> IdentityError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| "UNKNOWN_ERROR".to_string());

    let code = message
        .split(" : ")
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    match code.as_str() {
        "EMAIL_EXISTS" => IdentityError::EmailAlreadyExists(String::new()),
        "DUPLICATE_LOCAL_ID" => IdentityError::UidAlreadyExists(String::new()),
        "USER_NOT_FOUND" => IdentityError::UserNotFound(String::new()),
        _ => IdentityError::Provider(message),
    }
}
