//! Configuration loading
//!
//! YAML configuration files with `${VAR:-default}` environment variable
//! substitution.

use regex::{Captures, Regex};
use schemasheets_core::{Result, SchemaSheetsError};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming a configuration file
pub const CONFIG_ENV_VAR: &str = "SCHEMASHEETS_CONFIG";

/// Load configuration from a `YAML` file with environment variable
/// substitution
///
/// # Errors
///
/// Returns `SchemaSheetsError::Io` if the file cannot be read
/// Returns `SchemaSheetsError::Config` if the YAML cannot be parsed
pub fn load_config<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)?;
    let substituted = substitute_env_vars(&contents)?;
    serde_yaml::from_str(&substituted).map_err(|e| {
        SchemaSheetsError::config(format!(
            "Failed to parse YAML config {}: {e}",
            path.display()
        ))
    })
}

/// Configuration file to use: an explicit path, else `SCHEMASHEETS_CONFIG`
#[must_use]
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
}

/// Substitute environment variables in the format `${VAR:-default}`
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}:]+)(?::(-)?([^}]*))?\}")?;
    Ok(re
        .replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(3).map_or("", |m| m.as_str());
            env::var(var_name).unwrap_or_else(|_| default_value.to_string())
        })
        .to_string())
}
