//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup into an immutable [`Config`] that is
//! carried in the shared application state. Secrets have no fallback values:
//! a missing secret aborts startup.

use std::env;
use std::path::PathBuf;

/// Minimum accepted length of the JWT signing key, in bytes.
pub const MIN_SIGNING_KEY_LEN: usize = 32;

/// Configured back-office administrator (never persisted).
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID holding the Firestore database
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Directory for uploaded trainer photos (served at `/uploads`)
    pub upload_dir: PathBuf,
    /// Payment gateway REST base URL
    pub razorpay_api_url: String,
    /// Payment gateway public key id
    pub razorpay_key_id: String,

    // --- Secrets ---
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Payment gateway secret (order API auth and signature HMAC key)
    pub razorpay_key_secret: String,
    /// Back-office admin; admin login is disabled when unset
    pub admin: Option<AdminCredentials>,
}

impl Config {
    /// Config with fixed, non-secret values for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            upload_dir: env::temp_dir().join("gym-portal-test-uploads"),
            razorpay_api_url: "http://127.0.0.1:9/v1".to_string(),
            razorpay_key_id: "rzp_test_key".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            razorpay_key_secret: "test_gateway_secret".to_string(),
            admin: Some(AdminCredentials {
                username: "admin".to_string(),
                password: "test_admin_password".to_string(),
            }),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let jwt_signing_key = required("JWT_SIGNING_KEY")?.into_bytes();
        if jwt_signing_key.len() < MIN_SIGNING_KEY_LEN {
            return Err(ConfigError::Invalid {
                name: "JWT_SIGNING_KEY",
                reason: format!("must be at least {} bytes", MIN_SIGNING_KEY_LEN),
            });
        }

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                reason: format!("'{}' is not a valid port", raw),
            })?,
            Err(_) => 8080,
        };

        let admin = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                Some(AdminCredentials {
                    username: username.trim().to_string(),
                    password,
                })
            }
            _ => None,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port,
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            razorpay_api_url: env::var("RAZORPAY_API_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string()),
            razorpay_key_id: required("RAZORPAY_KEY_ID")?,
            jwt_signing_key,
            razorpay_key_secret: required("RAZORPAY_KEY_SECRET")?,
            admin,
        })
    }
}

/// Read a required, non-empty variable, trimming surrounding whitespace.
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

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment is process-global, so every env-mutating assertion lives
    // in this single test.
    #[test]
    fn test_config_from_env() {
        env::set_var("RAZORPAY_KEY_ID", "rzp_test_id");
        env::set_var("RAZORPAY_KEY_SECRET", "gateway_secret");
        env::set_var("JWT_SIGNING_KEY", "short");
        env::remove_var("PORT");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "JWT_SIGNING_KEY",
                ..
            }
        ));

        env::set_var("JWT_SIGNING_KEY", "test_jwt_key_32_bytes_minimum!!!");
        let config = Config::from_env().expect("Config should load");
        assert_eq!(config.razorpay_key_id, "rzp_test_id");
        assert_eq!(config.razorpay_key_secret, "gateway_secret");
        assert_eq!(config.port, 8080);

        env::remove_var("RAZORPAY_KEY_SECRET");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("RAZORPAY_KEY_SECRET")));
    }

    #[test]
    fn test_admin_debug_redacts_password() {
        let admin = AdminCredentials {
            username: "root".to_string(),
            password: "hunter2hunter2".to_string(),
        };
        let rendered = format!("{:?}", admin);
        assert!(rendered.contains("root"));
        assert!(!rendered.contains("hunter2"));
    }
}
