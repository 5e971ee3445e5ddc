//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - pgschema.toml (default configuration)
//! - pgschema.local.toml (git-ignored local overrides)
//! - Environment variables (PGSCHEMA_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # pgschema.toml
//! [templates]
//! root = "/usr/share/pgschema/templates"
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! PGSCHEMA_TEMPLATES__ROOT=/custom/templates
//! PGSCHEMA_LOGGING__LEVEL=trace
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::template::SqlTemplates;

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub templates: TemplateConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// SQL template location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Directory holding the versioned template tree
    #[serde(default = "default_template_root")]
    pub root: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Append logs to this file instead of stderr
    #[serde(default)]
    pub file: Option<PathBuf>,
}

// Default value functions
fn default_template_root() -> PathBuf {
    PathBuf::from("./templates")
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Merges in order:
    /// 1. built-in defaults
    /// 2. pgschema.toml (base configuration)
    /// 3. pgschema.local.toml (local overrides, git-ignored)
    /// 4. Environment variables (PGSCHEMA_* prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("pgschema.toml"))
            .merge(Toml::file("pgschema.local.toml"))
            .merge(Env::prefixed("PGSCHEMA_").split("__"))
            .extract()
    }

    /// Load configuration from specific file path
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("PGSCHEMA_").split("__"))
            .extract()
    }

    /// Template loader for the configured root
    pub fn templates(&self) -> SqlTemplates {
        SqlTemplates::new(self.templates.root.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            templates: TemplateConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for TemplateConfig {
    fn default() -> Self {
        TemplateConfig {
            root: default_template_root(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.templates.root, PathBuf::from("./templates"));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "text");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();

        assert!(toml_str.contains("[templates]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let back: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.templates.root, PathBuf::from("./templates"));
        assert_eq!(back.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let back: Config = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(back.logging.level, "debug");
        assert_eq!(back.logging.format, "text");
        assert_eq!(back.templates.root, PathBuf::from("./templates"));
    }

    #[test]
    fn test_templates_use_root() {
        let mut config = Config::default();
        config.templates.root = PathBuf::from("/srv/templates");
        assert_eq!(config.templates().root(), std::path::Path::new("/srv/templates"));
    }
}
