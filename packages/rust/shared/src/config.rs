//! Application configuration for listing-rewriter.
//!
//! User config lives at `~/.listing-rewriter/listing-rewriter.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ListingError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "listing-rewriter.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".listing-rewriter";

// ---------------------------------------------------------------------------
// Config structs (matching listing-rewriter.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Property database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Generation backend settings.
    #[serde(default)]
    pub inference: InferenceConfig,
}

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the libSQL database file holding the property tables.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "listing-rewriter.db".into()
}

/// `[inference]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Streaming generate endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound on a whole generation call, including streaming the body.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Upper bound on establishing the TCP connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:11434/api/generate".into()
}
fn default_model() -> String {
    "gemma2:2b".into()
}
fn default_request_timeout() -> u64 {
    300
}
fn default_connect_timeout() -> u64 {
    10
}

impl InferenceConfig {
    /// Parse and check the endpoint URL.
    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(&self.endpoint).map_err(|e| {
            ListingError::config(format!("invalid inference endpoint '{}': {e}", self.endpoint))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ListingError::config(format!(
                "inference endpoint must use http or https, got '{other}'"
            ))),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validate every field, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;
        if self.model.trim().is_empty() {
            return Err(ListingError::config("inference model must not be empty"));
        }
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(ListingError::config("inference timeouts must be greater than zero"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.listing-rewriter/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ListingError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.listing-rewriter/listing-rewriter.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ListingError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        ListingError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.inference.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ListingError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ListingError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ListingError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("gemma2:2b"));
        assert!(toml_str.contains("http://localhost:11434/api/generate"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[inference]
model = "llama3.2:3b"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.inference.model, "llama3.2:3b");
        assert_eq!(config.inference.request_timeout_secs, 300);
        assert_eq!(config.database.path, "listing-rewriter.db");
    }

    #[test]
    fn endpoint_validation() {
        let mut inference = InferenceConfig::default();
        assert!(inference.validate().is_ok());

        inference.endpoint = "not a url".into();
        assert!(inference.validate().is_err());

        inference.endpoint = "ftp://localhost/api/generate".into();
        let err = inference.validate().unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn empty_model_and_zero_timeout_rejected() {
        let mut inference = InferenceConfig::default();
        inference.model = "  ".into();
        assert!(inference.validate().is_err());

        let mut inference = InferenceConfig::default();
        inference.request_timeout_secs = 0;
        assert!(inference.validate().is_err());
    }

    #[test]
    fn load_from_file_validates() {
        let path = std::env::temp_dir().join(format!("lr_cfg_{}.toml", uuid::Uuid::now_v7()));
        std::fs::write(&path, "[inference]\nendpoint = \"file:///tmp/x\"\n").expect("write");
        let result = load_config_from(&path);
        assert!(result.is_err());

        std::fs::write(&path, "[database]\npath = \"/tmp/props.db\"\n").expect("write");
        let config = load_config_from(&path).expect("load");
        assert_eq!(config.database.path, "/tmp/props.db");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config_from(Path::new("/nonexistent/listing-rewriter.toml")).unwrap_err();
        assert!(matches!(err, ListingError::Io { .. }));
    }
}
