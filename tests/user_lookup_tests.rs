// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User lookup, health and cross-origin tests.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};

mod common;
use common::{create_test_app, get, send, signup};

#[tokio::test]
async fn test_lookup_unknown_user_is_404() {
    let app = create_test_app();

    let (status, body) = send(&app.router, get("/user/nobody")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "User not found");
}

#[tokio::test]
async fn test_lookup_known_user() {
    let app = create_test_app();
    let uid = signup(&app.router, "Jane", "jane@x.com", "secret123").await;

    let (status, body) = send(&app.router, get(&format!("/user/{uid}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uid"], uid.as_str());
    assert_eq!(body["email"], "jane@x.com");
    assert_eq!(body["display_name"], "Jane");
}

#[tokio::test]
async fn test_lookup_provider_outage_is_502() {
    let app = create_test_app();
    app.identity.set_unavailable(true);

    let (status, _) = send(&app.router, get("/user/anyone")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();

    let (status, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_responses_carry_security_headers() {
    let app = create_test_app();

    let response = tower::ServiceExt::oneshot(app.router.clone(), get("/user/nobody"))
        .await
        .unwrap();
    let headers = response.headers();
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
}

#[tokio::test]
async fn test_cors_preflight_from_dev_origin() {
    let app = create_test_app();

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/login")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn test_cors_rejects_foreign_origin() {
    let app = create_test_app();

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
