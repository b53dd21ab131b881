//! Configuration management for the Policy Reporter CLI

mod reporter;
pub mod serde_utils;

pub use reporter::{ConfigFile, ReporterConfig, NAMESPACE_ENV, PORT_ENV, SERVICE_ENV};

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("policy-reporter-cli")
}

/// Get the default configuration file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load configuration from a file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Resolve the effective reporter configuration
///
/// An explicit `path` must exist. Without one, the default config file is
/// read when present and the built-in defaults are used otherwise.
/// Environment overrides are applied on top in both cases.
pub fn resolve(path: Option<&Path>) -> Result<ReporterConfig, ConfigError> {
    let file: ConfigFile = match path {
        Some(path) => load_config(path)?,
        None => {
            let default_path = default_config_path();
            if default_path.exists() {
                load_config(&default_path)?
            } else {
                tracing::debug!("No config file at {:?}, using defaults", default_path);
                ConfigFile::default()
            }
        }
    };

    let mut config = file.policyreporter;
    config.apply_env();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[policyreporter]\nnamespace = \"monitoring\"\nforward_timeout = \"1m\"\n",
        )
        .unwrap();

        let loaded: ConfigFile = load_config(&path).unwrap();
        assert_eq!(loaded.policyreporter.namespace, "monitoring");
        assert_eq!(loaded.policyreporter.port, 8080);
        assert_eq!(loaded.policyreporter.forward_timeout.as_secs(), 60);
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");

        match resolve(Some(&missing)) {
            Err(ConfigError::NotFound(p)) => assert_eq!(p, missing),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[policyreporter\nport = ").unwrap();

        let result: Result<ConfigFile, _> = load_config(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
