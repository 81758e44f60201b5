// Manifest URL markers
pub const VULNERABILITY_MARKER: &str = "__vuln";
pub const COMPONENT_MARKER: &str = "__comp";

// Downloaded file and archive prefixes
pub const VULNERABILITY_PREFIX: &str = "vuln";
pub const COMPONENT_PREFIX: &str = "comp";

// Header carrying the license token on the list request
pub const LICENSE_HEADER: &str = "X-Xray-License";

// Scratch root, relative to the system temp directory
pub const SCRATCH_SUBDIR: &str = "jfrog/xray";

// Profile store
pub const HOME_ENV_VAR: &str = "XRAY_OFFLINE_HOME";
pub const DEFAULT_HOME_DIR: &str = ".xray-offline";
pub const PROFILE_FILE_NAME: &str = "config.toml";
pub const PROFILE_FILE_VERSION: u32 = 1;
