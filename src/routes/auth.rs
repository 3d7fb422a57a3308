// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and credential routes.
//!
//! Each handler validates the request shape, makes one or two provider
//! calls and maps the outcome onto a response. Nothing is kept between
//! requests.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::AuthorizationToken;
use crate::models::UserProfile;
use crate::routes::extract::ValidatedJson;
use crate::routes::users::UserResponse;
use crate::services::{GoogleIdentity, IdentityError, NewUser, TokenError};
use crate::AppState;

const INVALID_CREDENTIALS: &str = "Invalid Credentials";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/login_google", post(login_google))
        .route("/logout", post(logout))
        .route("/ping", post(ping))
}

// ─── Request bodies ──────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "is required"),
        email(message = "must be a valid email address")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GoogleLoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub id_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LogoutRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "is required"))]
    pub token: String,
}

// ─── Responses ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PingResponse {
    pub user_id: String,
    pub token: String,
}

// ─── Handlers ────────────────────────────────────────────────

/// Create an account, then mirror its profile.
async fn signup(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<SignUpRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let user = state
        .identity
        .create_user(NewUser {
            uid: None,
            email: req.email.clone(),
            password: Some(req.password),
            display_name: Some(req.name.clone()),
        })
        .await
        .map_err(|e| match e {
            IdentityError::EmailAlreadyExists(_) => AppError::BadRequest(format!(
                "Account already created for the email {}",
                req.email
            )),
            other => other.into(),
        })?;

    // No compensation: if this write fails the account exists without a profile.
    if let Err(e) = state
        .profiles
        .upsert_profile(&UserProfile::new(&user.uid, &req.name, &req.email))
        .await
    {
        tracing::error!(uid = %user.uid, error = %e, "Account created but profile write failed");
        return Err(e);
    }

    tracing::info!(uid = %user.uid, "User account created");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("User account created successfully for user {}", user.uid),
        }),
    ))
}

/// Exchange email and password for an ID token.
///
/// Every provider failure (wrong password, unknown or disabled account,
/// provider outage) collapses into the same 400 response.
async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let signed_in = state
        .identity
        .sign_in_with_password(&req.email, &req.password)
        .await
        .map_err(invalid_credentials)?;

    let user = state
        .identity
        .get_user(&signed_in.uid)
        .await
        .map_err(invalid_credentials)?;

    tracing::info!(uid = %user.uid, "Password login succeeded");

    Ok(Json(LoginResponse {
        token: signed_in.id_token,
        user: UserResponse {
            uid: user.uid,
            email: user.email.or(Some(signed_in.email)),
            display_name: user.display_name.or(signed_in.display_name),
        },
    }))
}

fn invalid_credentials(err: IdentityError) -> AppError {
    tracing::warn!(error = %err, "Password login rejected");
    AppError::BadRequest(INVALID_CREDENTIALS.to_string())
}

/// Verify a Google identity token, creating the account on first use.
///
/// The uid is the token subject, so a concurrent first login that loses the
/// create race sees `UidAlreadyExists` and is treated as an existing user.
/// Every path that ends with an existing account also repairs a missing
/// profile document.
async fn login_google(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<GoogleLoginRequest>,
) -> Result<Json<TokenResponse>> {
    let identity = state
        .google_verifier
        .verify(&req.id_token)
        .await
        .map_err(|e| match e {
            TokenError::Transient(msg) => AppError::Upstream(msg),
            other => AppError::BadRequest(other.to_string()),
        })?;

    let profile = GoogleProfile::from(&identity);

    match state.identity.get_user(&identity.subject).await {
        Ok(_) => {
            tracing::debug!(uid = %identity.subject, "Google user already registered");
            ensure_profile(&state, &profile).await?;
        }
        Err(IdentityError::UserNotFound(_)) => {
            register_google_user(&state, &identity, &profile).await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Json(TokenResponse {
        token: req.id_token,
    }))
}

/// Profile fields taken from a verified Google identity.
struct GoogleProfile {
    uid: String,
    name: String,
    email: String,
}

impl From<&GoogleIdentity> for GoogleProfile {
    fn from(identity: &GoogleIdentity) -> Self {
        let email = identity.email.clone().unwrap_or_default();
        Self {
            uid: identity.subject.clone(),
            name: identity.name.clone().unwrap_or_else(|| email.clone()),
            email,
        }
    }
}

async fn register_google_user(
    state: &AppState,
    identity: &GoogleIdentity,
    profile: &GoogleProfile,
) -> Result<()> {
    if !identity.email_verified {
        tracing::warn!(uid = %identity.subject, "Refusing account for unverified Google email");
        return Err(AppError::BadRequest(
            "Google account email is not verified".to_string(),
        ));
    }

    let created = state
        .identity
        .create_user(NewUser {
            uid: Some(profile.uid.clone()),
            email: profile.email.clone(),
            password: None,
            display_name: Some(profile.name.clone()),
        })
        .await;

    match created {
        Ok(user) => {
            state
                .profiles
                .upsert_profile(&UserProfile::new(&user.uid, &profile.name, &profile.email))
                .await?;
            tracing::info!(uid = %user.uid, "Google user registered");
            Ok(())
        }
        Err(IdentityError::UidAlreadyExists(_)) => {
            tracing::info!(uid = %profile.uid, "Google user registered concurrently");
            ensure_profile(state, profile).await
        }
        Err(IdentityError::EmailAlreadyExists(_)) => {
            // Either a concurrent login for this subject won the race, or a
            // password account already owns the address.
            match state.identity.get_user(&profile.uid).await {
                Ok(_) => ensure_profile(state, profile).await,
                Err(IdentityError::UserNotFound(_)) => Err(AppError::BadRequest(format!(
                    "Account already created for the email {}",
                    profile.email
                ))),
                Err(e) => Err(e.into()),
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// Write the profile document if the account exists without one.
async fn ensure_profile(state: &AppState, profile: &GoogleProfile) -> Result<()> {
    if state.profiles.get_profile(&profile.uid).await?.is_some() {
        return Ok(());
    }

    state
        .profiles
        .upsert_profile(&UserProfile::new(&profile.uid, &profile.name, &profile.email))
        .await?;
    tracing::warn!(uid = %profile.uid, "Restored missing profile for Google user");
    Ok(())
}

/// Check that the token is currently valid.
///
/// The token is not revoked: it stays usable until it expires. Clients
/// must discard it themselves.
async fn logout(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LogoutRequest>,
) -> Result<Json<MessageResponse>> {
    let claims = state
        .identity
        .verify_id_token(&req.token)
        .await
        .map_err(|e| match e {
            IdentityError::Transport(msg) => AppError::Upstream(msg),
            other => AppError::BadRequest(other.to_string()),
        })?;

    tracing::info!(
        uid = %claims.uid,
        expires_at = claims.expires_at,
        "Logout acknowledged; token not revoked server-side"
    );

    Ok(Json(MessageResponse {
        message: "Logout successful".to_string(),
    }))
}

/// Verify the token in the Authorization header and echo its user id.
async fn ping(
    State(state): State<Arc<AppState>>,
    AuthorizationToken(token): AuthorizationToken,
) -> Result<Json<PingResponse>> {
    let claims = state.identity.verify_id_token(&token).await?;

    Ok(Json(PingResponse {
        user_id: claims.uid,
        token,
    }))
}
