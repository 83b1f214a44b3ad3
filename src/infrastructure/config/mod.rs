//! Layered settings and stored credentials.
//!
//! Precedence: defaults < config file < environment (`PORTAL_UPLOADER_`, `__` nesting).

use crate::domain::error::{AppError, Result};
use crate::domain::portal_config::{TestTextConfig, TouchstoneConfig};
use crate::infrastructure::security::keyring::KeyringManager;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "PORTAL_UPLOADER_";
const DEFAULT_CONFIG_FILE: &str = "portal-uploader.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalSettings {
    pub testtext: TestTextConfig,
    pub touchstone: TouchstoneConfig,
}

impl PortalSettings {
    pub fn validate(&self) -> Result<()> {
        if self.testtext.max_bytes == 0 {
            return Err(AppError::ConfigurationError(
                "testtext.max_bytes must be > 0".to_string(),
            ));
        }
        if self.testtext.timeout_secs == 0 || self.touchstone.timeout_secs == 0 {
            return Err(AppError::ConfigurationError(
                "timeout_secs must be > 0".to_string(),
            ));
        }
        for (name, value) in [
            ("testtext.url", &self.testtext.url),
            ("touchstone.uri", &self.touchstone.uri),
        ] {
            url::Url::parse(value).map_err(|e| {
                AppError::ConfigurationError(format!("{} is not a valid URL: {}", name, e))
            })?;
        }
        Ok(())
    }
}

pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PortalSettings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Loads settings from `path`, or `portal-uploader.toml` in the working directory.
/// A missing file is not an error.
pub fn load_settings(path: Option<&Path>) -> Result<PortalSettings> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let settings: PortalSettings = figment(&path)
        .extract()
        .map_err(|e| AppError::ConfigurationError(format!("Failed to load configuration: {}", e)))?;

    settings.validate()?;
    Ok(settings)
}

pub struct ConfigService {
    keyring: KeyringManager,
}

impl ConfigService {
    pub fn new() -> Self {
        Self {
            keyring: KeyringManager::new("portal-uploader"),
        }
    }

    pub fn save_password(&self, portal: &str, username: &str, password: &str) -> Result<()> {
        self.keyring.set_password(portal, username, password)
    }

    pub fn get_password(&self, portal: &str, username: &str) -> Result<Option<String>> {
        self.keyring.get_password(portal, username)
    }

    pub fn delete_password(&self, portal: &str, username: &str) -> Result<()> {
        self.keyring.delete_password(portal, username)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(settings.testtext.url, "https://testtext.com");
        assert_eq!(settings.testtext.login_check, "Start Your Test");
        assert_eq!(settings.touchstone.final_upload_url, "ajax-review-columns");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [testtext]
            url = "https://staging.testtext.com"
            max_bytes = 2048

            [testtext.headers]
            X-Team = "qa"

            [touchstone]
            timeout_secs = 5
            "#
        )
        .unwrap();

        let settings = load_settings(Some(file.path())).unwrap();
        assert_eq!(settings.testtext.url, "https://staging.testtext.com");
        assert_eq!(settings.testtext.max_bytes, 2048);
        assert_eq!(settings.testtext.upload_check, "ROLL BACK");
        assert_eq!(
            settings.testtext.headers.get("X-Team").map(String::as_str),
            Some("qa")
        );
        assert_eq!(settings.touchstone.timeout_secs, 5);
        assert_eq!(settings.touchstone.uri, "https://touchstonetests.io");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[testtext]\nmax_bytes = 0").unwrap();
        let err = load_settings(Some(file.path())).unwrap_err();
        assert!(matches!(err, AppError::ConfigurationError(_)));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[touchstone]\nuri = \"not a url\"").unwrap();
        assert!(load_settings(Some(file.path())).is_err());
    }
}
