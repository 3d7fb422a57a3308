// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth Gateway API Server
//!
//! Forwards account and credential requests to Firebase Authentication and
//! mirrors user profiles into Firestore.

use anyhow::Context;
use auth_gateway::{
    config::Config,
    db::FirestoreDb,
    services::{FirebaseAuth, GoogleIdTokenVerifier},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting Auth Gateway");

    // One HTTP client (and connection pool) for every upstream call
    let http = reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let identity = FirebaseAuth::new(&config, http.clone())
        .await
        .context("Failed to initialize Firebase Authentication client")?;

    let google_verifier = GoogleIdTokenVerifier::new(http, &config.google_client_id);

    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .context("Failed to connect to Firestore")?;

    let state = Arc::new(AppState {
        config: config.clone(),
        identity: Arc::new(identity),
        profiles: Arc::new(db),
        google_verifier: Arc::new(google_verifier),
    });

    let app = auth_gateway::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("auth_gateway=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();

    Ok(())
}
