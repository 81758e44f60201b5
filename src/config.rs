use crate::constants::SCRATCH_SUBDIR;
use crate::errors::{AppError, AppResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved offline-update settings with all values filled in (no Options).
///
/// Deserializable from the TOML run file; every field falls back to its default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OfflineUpdateConfig {
    /// Root under which per-bucket scratch directories are created
    pub scratch_root: PathBuf,
    /// Directory receiving `vuln.zip` and `comp.zip`.
    /// Empty means "same as `scratch_root`".
    pub output_dir: PathBuf,
    /// Per-request HTTP timeout in seconds. 0 keeps the client default.
    pub timeout_secs: u64,
    /// Fail a bucket when any of its downloads failed instead of archiving what arrived.
    pub fail_on_download_error: bool,
}

impl Default for OfflineUpdateConfig {
    fn default() -> Self {
        Self {
            scratch_root: std::env::temp_dir().join(SCRATCH_SUBDIR),
            output_dir: PathBuf::new(),
            timeout_secs: 0,
            fail_on_download_error: false,
        }
    }
}

impl OfflineUpdateConfig {
    /// Directory where archives are written.
    pub fn archive_dir(&self) -> &Path {
        if self.output_dir.as_os_str().is_empty() {
            &self.scratch_root
        } else {
            &self.output_dir
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Builds the HTTP client used for the list request and the downloads.
    pub fn http_client(&self) -> AppResult<reqwest::Client> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = self.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

/// Offline-update run loaded from a TOML file.
///
/// Requires the license token and list URL; the remaining keys are the
/// flattened [`OfflineUpdateConfig`]. Unknown keys are rejected to catch typos.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OfflineUpdateConfigFile {
    /// License token sent with the list request
    pub license_id: String,
    /// List endpoint URL
    pub url: String,
    #[serde(flatten)]
    pub resolved: OfflineUpdateConfig,
}

impl OfflineUpdateConfigFile {
    /// Loads and validates a run file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the TOML is malformed, required fields are missing
    /// or empty, or unknown keys are present. Returns `IoError` if the file cannot be read.
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: OfflineUpdateConfigFile = toml::from_str(&contents)
            .map_err(|e| AppError::InvalidInput(format!("Failed to parse config: {e}")))?;

        if config.license_id.trim().is_empty() {
            return Err(AppError::InvalidInput("license_id must not be empty".into()));
        }
        if config.url.trim().is_empty() {
            return Err(AppError::InvalidInput("url must not be empty".into()));
        }

        Ok(config)
    }
}
