use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{EngineConfig, MAX_CHANNELS};

/// Console settings persisted in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub channel_count: usize,
    pub frame_period_ms: u64,
    pub device_path: PathBuf,
    pub show_directory: PathBuf,
    pub default_up_time: f64,
    pub default_down_time: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            channel_count: 150,
            frame_period_ms: 50,
            device_path: PathBuf::from("/dev/ttyACM0"),
            show_directory: PathBuf::from("."),
            default_up_time: 1.0,
            default_down_time: 1.0,
        }
    }
}

impl Settings {
    /// The fixed rig configuration, after validating the settings it is
    /// built from.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        ConfigManager::validate_settings(self).map_err(ConfigError::ValidationError)?;
        Ok(EngineConfig {
            channel_count: self.channel_count,
            frame_period: Duration::from_millis(self.frame_period_ms),
        })
    }
}

/// Configuration manager for console settings.
/// Settings live in a JSON file, `config.json` in the working directory by
/// default.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

/// Available configuration options with validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSchema {
    pub engine: EngineConfigSchema,
    pub output: OutputConfigSchema,
    pub show: ShowConfigSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfigSchema {
    pub channel_count: ConfigOption<usize>,
    pub frame_period_ms: ConfigOption<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfigSchema {
    pub device_path: ConfigOption<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowConfigSchema {
    pub show_directory: ConfigOption<PathBuf>,
    pub default_up_time: ConfigOption<f64>,
    pub default_down_time: ConfigOption<f64>,
}

/// Configuration option with validation and available choices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigOption<T> {
    pub default: T,
    pub valid_range: Option<(T, T)>,
    pub description: String,
    pub requires_restart: bool,
}

/// Persisted configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    pub settings: Settings,
    pub created_at: String,
    pub modified_at: String,
}

impl ConfigManager {
    /// Create a new configuration manager
    /// If no path is provided, defaults to 'config.json' in the current working directory
    pub fn new(config_path: Option<PathBuf>) -> Self {
        let config_path = config_path.unwrap_or_else(|| PathBuf::from("config.json"));

        Self {
            config_path,
            settings: Settings::default(),
        }
    }

    /// Load settings from configuration file.
    /// A missing file is created with default settings.
    pub fn load(&mut self) -> Result<Settings, ConfigError> {
        if !self.config_path.exists() {
            log::info!(
                "No config at {}, writing defaults",
                self.config_path.display()
            );
            self.save()?;
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        let config_file: ConfigFile =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if config_file.version != env!("CARGO_PKG_VERSION") {
            log::warn!(
                "Config file version {} doesn't match application version {}. Using defaults for new settings.",
                config_file.version,
                env!("CARGO_PKG_VERSION")
            );
        }

        self.settings = config_file.settings;
        Ok(self.settings.clone())
    }

    /// Save current settings to configuration file
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            if parent != Path::new("") && parent != Path::new(".") {
                fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
            }
        }

        let now = chrono::Utc::now().to_rfc3339();
        let config_file = ConfigFile {
            version: env!("CARGO_PKG_VERSION").to_string(),
            settings: self.settings.clone(),
            created_at: now.clone(),
            modified_at: now,
        };

        let content = serde_json::to_string_pretty(&config_file)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        fs::write(&self.config_path, content)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Validate, then update settings and save to file
    pub fn update_settings(&mut self, settings: Settings) -> Result<(), ConfigError> {
        Self::validate_settings(&settings).map_err(ConfigError::ValidationError)?;
        self.settings = settings;
        self.save()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get configuration schema with available options
    pub fn schema() -> ConfigSchema {
        let defaults = Settings::default();
        ConfigSchema {
            engine: EngineConfigSchema {
                channel_count: ConfigOption {
                    default: defaults.channel_count,
                    valid_range: Some((1, MAX_CHANNELS)),
                    description: "Number of DMX channels driven by the console".to_string(),
                    requires_restart: true,
                },
                frame_period_ms: ConfigOption {
                    default: defaults.frame_period_ms,
                    valid_range: Some((10, 1000)),
                    description: "Milliseconds between transmitted DMX frames".to_string(),
                    requires_restart: true,
                },
            },
            output: OutputConfigSchema {
                device_path: ConfigOption {
                    default: defaults.device_path,
                    valid_range: None,
                    description: "Serial device of the DMX transmitter".to_string(),
                    requires_restart: true,
                },
            },
            show: ShowConfigSchema {
                show_directory: ConfigOption {
                    default: defaults.show_directory,
                    valid_range: None,
                    description: "Directory for show files".to_string(),
                    requires_restart: false,
                },
                default_up_time: ConfigOption {
                    default: defaults.default_up_time,
                    valid_range: Some((0.0, 99.9)),
                    description: "Up time offered when recording a cue, in seconds".to_string(),
                    requires_restart: false,
                },
                default_down_time: ConfigOption {
                    default: defaults.default_down_time,
                    valid_range: Some((0.0, 99.9)),
                    description: "Down time offered when recording a cue, in seconds".to_string(),
                    requires_restart: false,
                },
            },
        }
    }

    /// Validate settings against schema, collecting every violation
    pub fn validate_settings(settings: &Settings) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let schema = Self::schema();

        check_range(
            &mut errors,
            "channel_count",
            settings.channel_count,
            schema.engine.channel_count.valid_range,
        );
        check_range(
            &mut errors,
            "frame_period_ms",
            settings.frame_period_ms,
            schema.engine.frame_period_ms.valid_range,
        );
        check_range(
            &mut errors,
            "default_up_time",
            settings.default_up_time,
            schema.show.default_up_time.valid_range,
        );
        check_range(
            &mut errors,
            "default_down_time",
            settings.default_down_time,
            schema.show.default_down_time.valid_range,
        );

        if settings.device_path.as_os_str().is_empty() {
            errors.push("device_path must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Reset settings to defaults
    pub fn reset_to_defaults(&mut self) -> Result<(), ConfigError> {
        self.settings = Settings::default();
        self.save()
    }
}

fn check_range<T>(errors: &mut Vec<String>, name: &str, value: T, range: Option<(T, T)>)
where
    T: PartialOrd + std::fmt::Display,
{
    if let Some((min, max)) = range {
        // Written so that NaN fails the check.
        if !(value >= min && value <= max) {
            errors.push(format!("{} must be between {} and {}", name, min, max));
        }
    }
}

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Failed to parse config file: {0}")]
    ParseError(String),
    #[error("Failed to serialize config: {0}")]
    SerializeError(String),
    #[error("Config validation errors: {}", .0.join(", "))]
    ValidationError(Vec<String>),
}
