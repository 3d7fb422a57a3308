// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User lookup routes.

use crate::error::Result;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/user/{uid}", get(get_user))
}

/// Public view of a provider user record.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// Look up a user by id (404 if the provider has no such user).
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<Json<UserResponse>> {
    let user = state.identity.get_user(&uid).await?;

    Ok(Json(UserResponse {
        uid: user.uid,
        email: user.email,
        display_name: user.display_name,
    }))
}
