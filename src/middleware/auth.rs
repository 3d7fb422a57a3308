// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token extraction from the Authorization header.

use crate::error::AppError;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

/// Raw credential taken from the `Authorization` header.
///
/// Accepts either the bare token or `Bearer <token>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationToken(pub String);

impl<S> FromRequestParts<S> for AuthorizationToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_token(&parts.headers).map(AuthorizationToken)
    }
}

fn extract_token(headers: &HeaderMap) -> Result<String, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::BadRequest("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::InvalidToken("Invalid authorization header".to_string()))?
        .trim();

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .unwrap_or(value)
        .trim();

    if token.is_empty() {
        return Err(AppError::InvalidToken("Token is empty".to_string()));
    }

    Ok(token.to_string())
}
