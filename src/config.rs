//! Application configuration loaded from environment variables.
//!
//! Secrets (web API key, service account) are injected as environment
//! variables by the deployment's secret bindings and read once at startup.

use std::env;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Application configuration, loaded once at startup.
#[derive(Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Firebase project that owns the user accounts
    pub firebase_project_id: String,
    /// GCP project hosting Firestore
    pub gcp_project_id: String,
    /// OAuth2 client id that Google identity tokens must be issued for
    pub google_client_id: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Timeout applied to every outbound HTTP call
    pub upstream_timeout: Duration,

    // --- Secrets ---
    /// Firebase web API key (password sign-in endpoint)
    pub firebase_api_key: String,
    /// Service account key JSON for the admin API; application default
    /// credentials are used when unset
    pub service_account_json: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("firebase_project_id", &self.firebase_project_id)
            .field("gcp_project_id", &self.gcp_project_id)
            .field("google_client_id", &self.google_client_id)
            .field("frontend_url", &self.frontend_url)
            .field("port", &self.port)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            firebase_project_id: "test-project".to_string(),
            gcp_project_id: "test-project".to_string(),
            google_client_id: "test-client.apps.googleusercontent.com".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: DEFAULT_PORT,
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            firebase_api_key: "test_api_key".to_string(),
            service_account_json: None,
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let firebase_project_id = required("FIREBASE_PROJECT_ID")?;

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID")
                .unwrap_or_else(|_| firebase_project_id.clone()),
            firebase_project_id,
            google_client_id: required("GOOGLE_CLIENT_ID")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            upstream_timeout: Duration::from_secs(
                env::var("UPSTREAM_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            ),
            firebase_api_key: required("FIREBASE_API_KEY")?,
            service_account_json: env::var("FIREBASE_SERVICE_ACCOUNT")
                .ok()
                .filter(|json| !json.trim().is_empty()),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn set_required_env() {
        env::set_var("FIREBASE_PROJECT_ID", "demo-project");
        env::set_var("GOOGLE_CLIENT_ID", "client.apps.googleusercontent.com");
        env::set_var("FIREBASE_API_KEY", "api-key");
        env::set_var("FIREBASE_SERVICE_ACCOUNT", r#"{"client_email":"x","private_key":"y"}"#);
    }

    fn clear_env() {
        for name in [
            "FIREBASE_PROJECT_ID",
            "GOOGLE_CLIENT_ID",
            "FIREBASE_API_KEY",
            "FIREBASE_SERVICE_ACCOUNT",
            "GOOGLE_APPLICATION_CREDENTIALS",
            "GCP_PROJECT_ID",
            "PORT",
            "UPSTREAM_TIMEOUT_SECS",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        clear_env();
        set_required_env();

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.firebase_project_id, "demo-project");
        assert_eq!(config.gcp_project_id, "demo-project");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.upstream_timeout, Duration::from_secs(10));
        assert!(config.service_account_json.is_some());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_overrides() {
        clear_env();
        set_required_env();
        env::set_var("GCP_PROJECT_ID", "firestore-project");
        env::set_var("PORT", "9090");
        env::set_var("UPSTREAM_TIMEOUT_SECS", "3");

        let config = Config::from_env().unwrap();

        assert_eq!(config.gcp_project_id, "firestore-project");
        assert_eq!(config.port, 9090);
        assert_eq!(config.upstream_timeout, Duration::from_secs(3));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_project_is_reported() {
        clear_env();
        set_required_env();
        env::remove_var("FIREBASE_PROJECT_ID");

        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("FIREBASE_PROJECT_ID"))
        ));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_service_account_is_optional() {
        clear_env();
        set_required_env();
        env::set_var("FIREBASE_SERVICE_ACCOUNT", "  ");

        let config = Config::from_env().unwrap();
        assert!(config.service_account_json.is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_debug_hides_secrets() {
        let config = Config::test_default();
        let debug = format!("{config:?}");
        assert!(!debug.contains("test_api_key"));
    }
}
