//! Configuration management

use crate::api::Client;
use anyhow::{Context, Result};
use gambit_core::{Config, ConfigIssue, ConfigManager, GambitError, SessionState, Settings};
use std::path::{Path, PathBuf};

pub struct SettingsManager;

impl SettingsManager {
    /// Get the gambit home directory (~/.gambit)
    pub fn gambit_home() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("GAMBIT_HOME") {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".gambit"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::gambit_home()?.join("settings.json"))
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Result<Settings> {
        Self::load_from(&Self::settings_path()?)
    }

    /// Save settings to disk
    pub fn save(settings: &Settings) -> Result<()> {
        Self::save_to(settings, &Self::settings_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Settings> {
        if !path.exists() {
            return Ok(Settings::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {:?}", path))
    }

    pub fn save_to(settings: &Settings, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let content =
            serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {:?}", path))?;

        // Tokens live in this file, keep it private
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }
}

/// Stored settings combined with the project configuration of the working directory
pub struct Workspace {
    pub settings: Settings,
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl Workspace {
    pub fn load() -> Result<Self> {
        let settings = SettingsManager::load()?;
        let cwd = std::env::current_dir().context("Could not read working directory")?;

        let (config, config_path) = match ConfigManager::new().load_from_directory(&cwd) {
            Ok((config, path)) => (config, Some(path)),
            Err(GambitError::ConfigNotFound(_)) => (Config::default(), None),
            Err(e) => return Err(e).context("Failed to load project configuration"),
        };

        Ok(Self {
            settings,
            config,
            config_path,
        })
    }

    /// Backend URL, preferring the project configuration
    pub fn backend_url(&self) -> &str {
        if self.config_path.is_some() {
            &self.config.backend.url
        } else {
            &self.settings.backend_url
        }
    }

    pub fn anon_key(&self) -> Option<&str> {
        self.config
            .backend
            .anon_key
            .as_deref()
            .or(self.settings.anon_key.as_deref())
    }

    /// Client using only the project's anonymous key
    pub fn anonymous_client(&self) -> Result<Client> {
        let anon_key = self.anon_key().context(
            "No backend key configured. Run: gambit config set-backend <url> --anon-key <key>",
        )?;
        Ok(Client::new(self.backend_url(), anon_key))
    }

    /// Client acting for the stored session, if any
    pub fn client(&self) -> Result<Client> {
        Ok(self
            .anonymous_client()?
            .with_access_token(self.settings.access_token.clone()))
    }

    /// Client for read-only calls: the stored token only while the session is live
    pub fn client_for(&self, session: &SessionState) -> Result<Client> {
        match session {
            SessionState::SignedIn(_) => self.client(),
            _ => self.anonymous_client(),
        }
    }

    /// Check the stored token against the backend
    pub async fn session(&self, client: &Client) -> SessionState {
        SessionState::initialize(
            client,
            self.settings.access_token.as_deref(),
            self.config.session.timeout(),
        )
        .await
    }

    /// Like [`Workspace::session`], but failures and timeouts are errors
    pub async fn check_session(&self, client: &Client) -> gambit_core::Result<SessionState> {
        SessionState::check(
            client,
            self.settings.access_token.as_deref(),
            self.config.session.timeout(),
        )
        .await
    }

    /// Reject an invalid project configuration, returning its warnings
    pub fn checked_config(&self) -> gambit_core::Result<Vec<ConfigIssue>> {
        ConfigManager::new().validate(&self.config)?.into_result()
    }

    /// Explicit bucket, or the configured default
    pub fn bucket(&self, explicit: Option<String>) -> Result<String> {
        explicit
            .or_else(|| self.config.gallery.default_bucket.clone())
            .context("No bucket given and no gallery.default_bucket configured")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gambit_core::{SessionUser, UserRole};

    fn workspace(config_path: Option<PathBuf>) -> Workspace {
        let mut config = Config::default();
        config.backend.url = "https://project.example.com".to_string();
        config.gallery.default_bucket = Some("lesson-media".to_string());

        Workspace {
            settings: Settings {
                backend_url: "https://saved.example.com".to_string(),
                anon_key: Some("saved-key".to_string()),
                ..Settings::default()
            },
            config,
            config_path,
        }
    }

    #[test]
    fn test_project_config_wins_when_present() {
        let ws = workspace(Some(PathBuf::from("gambit.config.yaml")));
        assert_eq!(ws.backend_url(), "https://project.example.com");

        let ws = workspace(None);
        assert_eq!(ws.backend_url(), "https://saved.example.com");
        assert_eq!(ws.anon_key(), Some("saved-key"));
    }

    #[test]
    fn test_settings_round_trip_on_disk() -> Result<()> {
        let home = tempfile::tempdir()?;
        let path = home.path().join("nested").join("settings.json");

        assert!(!SettingsManager::load_from(&path)?.is_logged_in());

        let settings = Settings {
            access_token: Some("token".to_string()),
            ..Settings::default()
        };
        SettingsManager::save_to(&settings, &path)?;

        assert!(path.exists());
        assert_eq!(
            SettingsManager::load_from(&path)?.access_token.as_deref(),
            Some("token")
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path)?.permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
        Ok(())
    }

    #[test]
    fn test_expired_session_lists_anonymously() -> Result<()> {
        let mut ws = workspace(None);
        ws.settings.access_token = Some("stale-token".to_string());

        let client = ws.client_for(&SessionState::SignedOut)?;
        assert_eq!(client.bearer(None), "saved-key");

        let client = ws.client_for(&SessionState::SignedIn(SessionUser {
            id: "u-1".to_string(),
            email: None,
            role: UserRole::User,
        }))?;
        assert_eq!(client.bearer(None), "stale-token");
        Ok(())
    }

    #[test]
    fn test_checked_config_rejects_invalid_values() {
        let mut ws = workspace(None);
        assert!(ws.checked_config().is_ok());

        ws.config.gallery.list_limit = 0;
        assert!(matches!(
            ws.checked_config(),
            Err(GambitError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bucket_falls_back_to_default() {
        let ws = workspace(None);
        assert_eq!(ws.bucket(None).unwrap(), "lesson-media");
        assert_eq!(ws.bucket(Some("avatars".to_string())).unwrap(), "avatars");
    }
}
