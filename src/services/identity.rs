// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider capabilities consumed by the HTTP handlers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identity provider failures, typed the way handlers branch on them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("User id already exists: {0}")]
    UidAlreadyExists(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Token expired")]
    ExpiredIdToken,

    #[error("{0}")]
    InvalidIdToken(String),

    /// The provider rejected the request; carries its error code.
    #[error("{0}")]
    Provider(String),

    /// The provider could not be reached or answered with a server error.
    #[error("Identity provider unavailable: {0}")]
    Transport(String),
}

/// A user account as held by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Parameters for account creation.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    /// Fixed user id; the provider assigns one when `None`.
    pub uid: Option<String>,
    pub email: String,
    /// Federated accounts have no password.
    pub password: Option<String>,
    pub display_name: Option<String>,
}

/// Result of a successful password sign-in.
#[derive(Debug, Clone)]
pub struct SignInResult {
    pub id_token: String,
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Claims of a verified provider-issued ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub uid: String,
    /// Expiry as Unix seconds.
    pub expires_at: u64,
}

/// Account and credential operations delegated to the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Create a user account.
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, IdentityError>;

    /// Exchange an email and password for an ID token.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignInResult, IdentityError>;

    /// Look up a user by id.
    async fn get_user(&self, uid: &str) -> Result<UserRecord, IdentityError>;

    /// Check an ID token's signature and expiry.
    async fn verify_id_token(&self, token: &str) -> Result<TokenClaims, IdentityError>;
}
