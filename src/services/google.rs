// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Sign-In identity token verification.

use crate::services::jwks::{JwksSource, JwksVerifier, TokenError};
use async_trait::async_trait;
use serde::Deserialize;

const DISCOVERY_URL: &str = "https://accounts.google.com/.well-known/openid-configuration";
const DEFAULT_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];

/// Identity asserted by a verified Google identity token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub subject: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub name: Option<String>,
}

/// Verifies identity tokens issued by Google for this application's client id.
#[async_trait]
pub trait GoogleTokenVerifier: Send + Sync + 'static {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, TokenError>;
}

#[derive(Debug, Deserialize)]
struct GoogleIdTokenClaims {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
}

/// Key set and claim expectations for Google identity tokens.
pub fn google_token_source(client_id: &str) -> JwksSource {
    JwksSource {
        discovery_url: Some(DISCOVERY_URL.to_string()),
        jwks_url: DEFAULT_JWKS_URL.to_string(),
        issuers: GOOGLE_ISSUERS.iter().map(|iss| iss.to_string()).collect(),
        audience: client_id.to_string(),
    }
}

/// Google identity token verifier backed by Google's published keys.
pub struct GoogleIdTokenVerifier {
    jwks: JwksVerifier,
}

impl GoogleIdTokenVerifier {
    pub fn new(http_client: reqwest::Client, client_id: &str) -> Self {
        Self {
            jwks: JwksVerifier::new(http_client, google_token_source(client_id)),
        }
    }

    /// Wrap an existing key verifier (static-key verifiers in tests).
    pub fn from_jwks(jwks: JwksVerifier) -> Self {
        Self { jwks }
    }
}

#[async_trait]
impl GoogleTokenVerifier for GoogleIdTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, TokenError> {
        let claims: GoogleIdTokenClaims = self.jwks.verify(id_token).await?;

        tracing::debug!(
            subject = %claims.sub,
            email_verified = ?claims.email_verified,
            audience = %self.jwks.audience(),
            "Google identity token verified"
        );

        if claims.email.is_none() {
            return Err(TokenError::Invalid(
                "Google token does not carry an email claim".to_string(),
            ));
        }

        Ok(GoogleIdentity {
            subject: claims.sub,
            email: claims.email,
            email_verified: claims.email_verified.unwrap_or(false),
            name: claims.name,
        })
    }
}
