// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware and extractors (authorization header, security headers).

pub mod auth;
pub mod security;

pub use auth::AuthorizationToken;
