//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `SIFT_*` environment variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::collections::HashSet;
use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::staging::UploadLimits;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `SIFT_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `5000`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Root directory for per-request staging directories.
    /// Default: the OS temp directory.
    pub staging_root: Option<PathBuf>,

    /// Maximum size of a single uploaded file, in bytes. Default: 50 MiB.
    pub max_file_size_bytes: u64,

    /// Maximum number of candidate CV files per request. Default: `100`.
    pub max_candidate_files: usize,

    /// Lower-cased extensions accepted for upload. Default: `{"pdf"}`.
    pub allowed_extensions: HashSet<String>,

    /// Upper bound on one upstream generation call, in seconds.
    /// Default: `300`.
    pub provider_timeout_secs: u64,
}

/// Default per-file upload cap.
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Default candidate-file count cap.
pub const DEFAULT_MAX_CANDIDATE_FILES: usize = 100;

/// Default upstream call timeout.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 300;

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            staging_root: None,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            max_candidate_files: DEFAULT_MAX_CANDIDATE_FILES,
            allowed_extensions: HashSet::from(["pdf".to_string()]),
            provider_timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "SIFT_PORT";
    const ENV_BIND_ADDR: &'static str = "SIFT_BIND_ADDR";
    const ENV_STAGING_ROOT: &'static str = "SIFT_STAGING_ROOT";
    const ENV_MAX_FILE_SIZE: &'static str = "SIFT_MAX_FILE_SIZE_BYTES";
    const ENV_MAX_CANDIDATES: &'static str = "SIFT_MAX_CANDIDATE_FILES";
    const ENV_ALLOWED_EXTENSIONS: &'static str = "SIFT_ALLOWED_EXTENSIONS";
    const ENV_PROVIDER_TIMEOUT: &'static str = "SIFT_PROVIDER_TIMEOUT_SECS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let staging_root = Self::parse_optional_path_from_env(Self::ENV_STAGING_ROOT);
        let max_file_size_bytes =
            Self::parse_u64_from_env(Self::ENV_MAX_FILE_SIZE, defaults.max_file_size_bytes)?;
        let max_candidate_files =
            Self::parse_usize_from_env(Self::ENV_MAX_CANDIDATES, defaults.max_candidate_files)?;
        let allowed_extensions =
            Self::parse_extensions_from_env(Self::ENV_ALLOWED_EXTENSIONS, defaults.allowed_extensions);
        let provider_timeout_secs =
            Self::parse_u64_from_env(Self::ENV_PROVIDER_TIMEOUT, defaults.provider_timeout_secs)?;

        Ok(Self {
            port,
            bind_addr,
            staging_root,
            max_file_size_bytes,
            max_candidate_files,
            allowed_extensions,
            provider_timeout_secs,
        })
    }

    /// Validates paths and basic invariants (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.staging_root {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if self.max_file_size_bytes == 0 {
            return Err(ConfigError::InvalidLimit {
                name: "max file size",
                value: "0".to_string(),
            });
        }
        if self.max_candidate_files == 0 {
            return Err(ConfigError::InvalidLimit {
                name: "max candidate files",
                value: "0".to_string(),
            });
        }
        if self.provider_timeout_secs == 0 {
            return Err(ConfigError::InvalidLimit {
                name: "provider timeout",
                value: "0".to_string(),
            });
        }
        if self.allowed_extensions.is_empty() {
            return Err(ConfigError::EmptyExtensionList);
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Admission limits handed to the upload stager.
    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_file_size_bytes: self.max_file_size_bytes,
            max_candidate_files: self.max_candidate_files,
            allowed_extensions: self.allowed_extensions.clone(),
            staging_root: self.staging_root.clone(),
        }
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_u64_from_env(var_name: &'static str, default: u64) -> Result<u64, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value.parse().map_err(|_| ConfigError::InvalidLimit {
                name: var_name,
                value,
            }),
            Err(_) => Ok(default),
        }
    }

    fn parse_usize_from_env(var_name: &'static str, default: usize) -> Result<usize, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value.parse().map_err(|_| ConfigError::InvalidLimit {
                name: var_name,
                value,
            }),
            Err(_) => Ok(default),
        }
    }

    fn parse_extensions_from_env(var_name: &str, default: HashSet<String>) -> HashSet<String> {
        match env::var(var_name) {
            Ok(value) => {
                let parsed: HashSet<String> = value
                    .split(',')
                    .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect();
                if parsed.is_empty() { default } else { parsed }
            }
            Err(_) => default,
        }
    }
}
