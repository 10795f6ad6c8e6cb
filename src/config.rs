//! Configuration management for scheme models
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (scheme-model.toml)
//! - Environment variables (SCHEME_MODEL__*)
//!
//! ## Example config file (scheme-model.toml):
//! ```toml
//! [model]
//! validate_scheme = true
//! zero_fill = false
//!
//! [output]
//! format = "pretty"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model behavior
    #[serde(default)]
    pub model: ModelSettings,

    /// Output settings for rendered values
    #[serde(default)]
    pub output: OutputConfig,
}

/// Settings applied to every model built from this configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Fail reads whose coerced value is invalid for its scheme
    #[serde(default = "default_true")]
    pub validate_scheme: bool,

    /// Pre-fill declared fields with zero values on construction
    #[serde(default)]
    pub zero_fill: bool,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

fn default_true() -> bool {
    true
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            validate_scheme: true,
            zero_fill: false,
        }
    }
}

impl ModelConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering a specific file over the default locations
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "scheme-model.toml",
            ".scheme-model.toml",
            "config/scheme-model.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        let project_dirs = directories::ProjectDirs::from("dev", "scheme-model", "scheme-model");
        if let Some(config_dir) = project_dirs {
            let xdg_config = config_dir.config_dir().join("scheme-model.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SCHEME_MODEL__MODEL__VALIDATE_SCHEME=false
        builder = builder.add_source(
            Environment::with_prefix("SCHEME_MODEL")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}
