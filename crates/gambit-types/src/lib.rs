//! Gambit Types - Pure type definitions
//!
//! Data types shared by the core library and the CLI. This crate carries no
//! async runtime or I/O so it can be reused by any front end.

pub mod lesson;
pub mod storage;
pub mod user;

pub use lesson::*;
pub use storage::*;
pub use user::*;

use serde::{Deserialize, Serialize};

/// Local backend address used by a freshly created settings file
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:54321";

/// Settings persisted to disk by the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub version: String,
    pub backend_url: String,
    #[serde(default)]
    pub anon_key: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            anon_key: None,
            access_token: None,
            refresh_token: None,
            user_id: None,
            email: None,
        }
    }
}

impl Settings {
    /// Whether a session token has been stored
    pub fn is_logged_in(&self) -> bool {
        self.access_token.is_some()
    }

    /// Forget the stored session
    pub fn clear_session(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.user_id = None;
        self.email = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_tolerates_missing_optional_fields() {
        let settings: Settings =
            serde_json::from_str(r#"{"version":"1.0.0","backend_url":"https://db.example.com"}"#)
                .unwrap();
        assert_eq!(settings.backend_url, "https://db.example.com");
        assert!(!settings.is_logged_in());
    }

    #[test]
    fn test_clear_session() {
        let mut settings = Settings {
            access_token: Some("token".to_string()),
            refresh_token: Some("refresh".to_string()),
            user_id: Some("u1".to_string()),
            email: Some("mod@example.com".to_string()),
            anon_key: Some("anon".to_string()),
            ..Settings::default()
        };

        settings.clear_session();

        assert!(!settings.is_logged_in());
        assert!(settings.user_id.is_none());
        assert!(settings.email.is_none());
        // The project key is not part of the session
        assert_eq!(settings.anon_key.as_deref(), Some("anon"));
    }
}
