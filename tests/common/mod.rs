// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use auth_gateway::config::Config;
use auth_gateway::db::{FirestoreDb, InMemoryProfileStore};
use auth_gateway::routes::create_router;
use auth_gateway::services::google::google_token_source;
use auth_gateway::services::firebase::id_token_source;
use auth_gateway::services::{
    FirebaseAuth, GoogleIdTokenVerifier, InMemoryIdentityProvider, JwksVerifier,
};
use auth_gateway::AppState;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

pub const TEST_KID: &str = "test-kid";
pub const TEST_ACCESS_TOKEN: &str = "test-access-token";
pub const TEST_PRIVATE_KEY: &str = include_str!("../fixtures/test_rsa_private.pem");
pub const TEST_PUBLIC_KEY: &str = include_str!("../fixtures/test_rsa_public.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Router plus handles on the in-memory collaborators behind it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub config: Config,
    pub identity: Arc<InMemoryIdentityProvider>,
    pub profiles: Arc<InMemoryProfileStore>,
}

/// Create a test app backed by in-memory fakes and a static-key Google verifier.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let config = Config::test_default();
    let identity = Arc::new(InMemoryIdentityProvider::default());
    let profiles = Arc::new(InMemoryProfileStore::new());

    let jwks = JwksVerifier::new_with_static_key(
        google_token_source(&config.google_client_id),
        TEST_KID,
        DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap(),
    )
    .unwrap();

    let state = Arc::new(AppState {
        config: config.clone(),
        identity: identity.clone(),
        profiles: profiles.clone(),
        google_verifier: Arc::new(GoogleIdTokenVerifier::from_jwks(jwks)),
    });

    TestApp {
        router: create_router(state),
        config,
        identity,
        profiles,
    }
}

/// Token source that always hands out `TEST_ACCESS_TOKEN`.
#[allow(dead_code)]
pub fn static_token_source() -> gcloud_sdk::TokenSourceType {
    let source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
        Ok(gcloud_sdk::Token {
            token_type: "Bearer".to_string(),
            token: gcloud_sdk::SecretValue::new(TEST_ACCESS_TOKEN.to_string().into()),
            expiry: chrono::Utc::now() + chrono::Duration::hours(1),
        })
    });
    gcloud_sdk::TokenSourceType::ExternalSource(Box::new(source))
}

/// Firebase client with a static access token and fixture ID token key,
/// talking to `base_url` (a mock server in tests).
#[allow(dead_code)]
pub async fn firebase_auth(base_url: &str) -> FirebaseAuth {
    let config = Config::test_default();
    let verifier = JwksVerifier::new_with_static_key(
        id_token_source(&config.firebase_project_id),
        TEST_KID,
        DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap(),
    )
    .unwrap();

    FirebaseAuth::with_token_source(&config, reqwest::Client::new(), static_token_source())
        .await
        .unwrap()
        .with_base_url(base_url)
        .with_id_token_verifier(verifier)
}

#[allow(dead_code)]
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Claims of a Google-style identity token.
#[derive(Debug, Clone, Serialize)]
pub struct GoogleClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub name: Option<String>,
    pub iat: u64,
    pub exp: u64,
}

impl GoogleClaims {
    #[allow(dead_code)]
    pub fn new(audience: &str, sub: &str, email: &str) -> Self {
        let now = now_secs();
        Self {
            iss: "https://accounts.google.com".to_string(),
            aud: audience.to_string(),
            sub: sub.to_string(),
            email: Some(email.to_string()),
            email_verified: true,
            name: Some("Google User".to_string()),
            iat: now,
            exp: now + 3600,
        }
    }
}

/// Sign claims with the fixture RSA key.
#[allow(dead_code)]
pub fn sign_rs256<T: Serialize>(claims: &T, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    encode(
        &header,
        claims,
        &EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY.as_bytes()).unwrap(),
    )
    .unwrap()
}

/// Send a request and return the status with the parsed JSON body.
#[allow(dead_code)]
pub async fn send(router: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, body)
}

/// Build a JSON POST request.
#[allow(dead_code)]
pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a GET request.
#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Sign up a user through the API and return its uid.
#[allow(dead_code)]
pub async fn signup(router: &axum::Router, name: &str, email: &str, password: &str) -> String {
    let (status, body) = send(
        router,
        post_json(
            "/signup",
            serde_json::json!({ "name": name, "email": email, "password": password }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");

    body["message"]
        .as_str()
        .and_then(|m| m.rsplit(' ').next())
        .unwrap()
        .to_string()
}
