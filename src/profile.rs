//! Persistence of the single active server connection profile.
//!
//! The profile lives in `<home>/config.toml` under an `[artifactory]` table.
//! Saving always replaces the whole file: the last save wins and nothing is merged.

use crate::constants::{DEFAULT_HOME_DIR, HOME_ENV_VAR, PROFILE_FILE_NAME, PROFILE_FILE_VERSION};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

/// Server connection details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionProfile {
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_passphrase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_path: Option<PathBuf>,
    /// Extra headers sent when authenticating over SSH
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_auth_headers: Option<BTreeMap<String, String>>,
}

impl ConnectionProfile {
    /// Checks that the URL is present and parses.
    pub fn validate(&self) -> AppResult<()> {
        if self.url.trim().is_empty() {
            return Err(AppError::InvalidInput("Server URL is required".into()));
        }
        Url::parse(&self.url)?;
        Ok(())
    }

    /// Returns a copy whose URL ends with a single `/`.
    pub fn normalized(mut self) -> Self {
        if !self.url.ends_with('/') {
            self.url.push('/');
        }
        self
    }
}

/// Display form with secrets masked.
impl fmt::Display for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(secret: &str) -> &'static str {
            if secret.is_empty() {
                ""
            } else {
                "***"
            }
        }

        writeln!(f, "Url: {}", self.url)?;
        writeln!(f, "User: {}", self.user)?;
        writeln!(f, "Password: {}", mask(&self.password))?;
        if let Some(api_key) = &self.api_key {
            writeln!(f, "API key: {}", mask(api_key))?;
        }
        if let Some(path) = &self.ssh_key_path {
            writeln!(f, "SSH key file: {}", path.display())?;
        }
        if let Some(passphrase) = &self.ssh_passphrase {
            writeln!(f, "SSH passphrase: {}", mask(passphrase))?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileFile {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    artifactory: Option<ConnectionProfile>,
}

/// File-backed store for the active [`ConnectionProfile`].
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    /// Store rooted at `home`; the file is `<home>/config.toml`.
    pub fn new(home: impl AsRef<Path>) -> Self {
        Self {
            path: home.as_ref().join(PROFILE_FILE_NAME),
        }
    }

    /// Resolves the home directory: explicit value, then `XRAY_OFFLINE_HOME`,
    /// then `$HOME/.xray-offline`, then `.xray-offline` in the working directory.
    pub fn from_home(home: Option<&Path>) -> Self {
        let home = match home {
            Some(dir) => dir.to_path_buf(),
            None => std::env::var_os(HOME_ENV_VAR)
                .map(PathBuf::from)
                .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(DEFAULT_HOME_DIR)))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HOME_DIR)),
        };
        Self::new(home)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `profile`, replacing whatever was saved before.
    ///
    /// # Arguments
    ///
    /// * `profile` - Connection to save, stored as given
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be created or the file
    /// cannot be written.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use xray_offline::profile::{ConnectionProfile, ProfileStore};
    ///
    /// # fn main() -> Result<(), xray_offline::errors::AppError> {
    /// let store = ProfileStore::new(Path::new("/home/me/.xray-offline"));
    /// let profile = ConnectionProfile {
    ///     url: "http://localhost:8080/artifactory/".into(),
    ///     user: "admin".into(),
    ///     ..ConnectionProfile::default()
    /// };
    /// store.save(&profile)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn save(&self, profile: &ConnectionProfile) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::IoError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let file = ProfileFile {
            version: PROFILE_FILE_VERSION,
            artifactory: Some(profile.clone()),
        };
        let contents = toml::to_string(&file)
            .map_err(|e| AppError::InvalidInput(format!("Failed to serialize config: {e}")))?;
        fs::write(&self.path, contents).map_err(|e| {
            AppError::IoError(format!(
                "Failed to write config {}: {}",
                self.path.display(),
                e
            ))
        })?;

        info!(config_file = %self.path.display(), url = %profile.url, "Configuration saved");
        Ok(())
    }

    /// Reads the saved profile. A missing file yields `None`.
    ///
    /// # Returns
    ///
    /// Returns the profile exactly as it was saved, or `None` if nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, contains
    /// unknown keys or carries an unsupported version.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use xray_offline::profile::ProfileStore;
    ///
    /// # fn main() -> Result<(), xray_offline::errors::AppError> {
    /// let store = ProfileStore::new(Path::new("/home/me/.xray-offline"));
    /// if let Some(profile) = store.load()? {
    ///     print!("{profile}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(&self) -> AppResult<Option<ConnectionProfile>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(config_file = %self.path.display(), "No configuration saved");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let file: ProfileFile = toml::from_str(&contents).map_err(|e| {
            AppError::InvalidInput(format!(
                "Failed to parse config {}: {e}",
                self.path.display()
            ))
        })?;
        if file.version != PROFILE_FILE_VERSION {
            return Err(AppError::InvalidInput(format!(
                "Unsupported config version {} in {}",
                file.version,
                self.path.display()
            )));
        }

        Ok(file.artifactory)
    }

    /// Deletes the saved profile. Clearing an empty store is not an error.
    pub fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(config_file = %self.path.display(), "Configuration cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
