// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Auth Gateway: a thin HTTP façade over Firebase Authentication
//!
//! This crate forwards signup, login and token checks to the identity
//! provider and mirrors minimal profile data into Firestore.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::ProfileStore;
use services::{GoogleTokenVerifier, IdentityProvider};
use std::sync::Arc;

/// Shared application state.
///
/// Client handles are built once at startup and injected here.
pub struct AppState {
    pub config: Config,
    pub identity: Arc<dyn IdentityProvider>,
    pub profiles: Arc<dyn ProfileStore>,
    pub google_verifier: Arc<dyn GoogleTokenVerifier>,
}
