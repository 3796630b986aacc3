//! Configuration.
//!
//! Loaded from a TOML file at:
//! 1. `$MAILDOC_CONFIG` (environment variable)
//! 2. `~/.config/maildoc/config.toml` (Linux/macOS)
//!    `%APPDATA%\maildoc\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{MaildocError, Result};
use crate::index::builder::{parse_zone, IndexAttachments, DEFAULT_MAX_ATTACHMENT_SIZE};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub indexing: IndexingConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override the directory used for log files.
    pub cache_dir: Option<PathBuf>,
}

/// Document construction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// IANA zone used for the document dates.
    pub time_zone: String,
    /// Whether attachment text is extracted: "yes" or "no".
    pub index_attachments: IndexAttachments,
    /// Attachments larger than this (bytes) are not handed to the extractor.
    pub max_attachment_size: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            cache_dir: None,
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            time_zone: "UTC".to_string(),
            index_attachments: IndexAttachments::No,
            max_attachment_size: DEFAULT_MAX_ATTACHMENT_SIZE,
        }
    }
}

impl IndexingConfig {
    /// Resolve the configured time zone.
    pub fn zone(&self) -> Result<Tz> {
        parse_zone(&self.time_zone)
    }
}

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    let Some(path) = config_file_path() else {
        return Config::default();
    };
    if !path.exists() {
        return Config::default();
    }
    match load_config_from(&path) {
        Ok(cfg) => {
            tracing::info!(path = %path.display(), "Loaded config");
            cfg
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    }
}

/// Load configuration from an explicit file.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path).map_err(|e| MaildocError::io(path, e))?;
    toml::from_str(&contents).map_err(|e| MaildocError::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<()> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(&path, toml::to_string_pretty(config)?)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(())
}

/// Determine the config file path (env var first, then the standard dir).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MAILDOC_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("maildoc").join("config.toml"))
}

/// Directory for log files.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("maildoc")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.indexing.time_zone, "UTC");
        assert_eq!(cfg.indexing.index_attachments, IndexAttachments::No);
        assert_eq!(cfg.indexing.zone().unwrap(), chrono_tz::UTC);
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let mut cfg = Config::default();
        cfg.indexing.index_attachments = IndexAttachments::Yes;
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        assert!(toml_str.contains("index_attachments = \"yes\""));
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.indexing.index_attachments, IndexAttachments::Yes);
        assert_eq!(parsed.indexing.max_attachment_size, DEFAULT_MAX_ATTACHMENT_SIZE);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[indexing]
time_zone = "Europe/Paris"
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.indexing.zone().unwrap(), chrono_tz::Europe::Paris);
        assert_eq!(cfg.indexing.index_attachments, IndexAttachments::No);
        assert_eq!(cfg.general.log_level, "warn");
    }

    #[test]
    fn test_bad_zone_is_an_error() {
        let cfg: Config = toml::from_str("[indexing]\ntime_zone = \"Nowhere/Land\"").unwrap();
        assert!(matches!(
            cfg.indexing.zone(),
            Err(MaildocError::InvalidTimeZone(_))
        ));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\nlog_level = \"debug\"\n").unwrap();
        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.general.log_level, "debug");

        std::fs::write(&path, "[general\n").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(MaildocError::Config { .. })
        ));

        assert!(matches!(
            load_config_from(&dir.path().join("missing.toml")),
            Err(MaildocError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_save_then_load_via_env_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        std::env::set_var("MAILDOC_CONFIG", &path);

        let mut cfg = Config::default();
        cfg.indexing.time_zone = "Asia/Tokyo".to_string();
        save_config(&cfg).unwrap();
        let loaded = load_config();
        std::env::remove_var("MAILDOC_CONFIG");

        assert_eq!(config_file_path(), dirs::config_dir().map(|d| d.join("maildoc").join("config.toml")));
        assert_eq!(loaded.indexing.zone().unwrap(), chrono_tz::Asia::Tokyo);
    }
}
