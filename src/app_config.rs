use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Application configuration module
/// This module handles loading and validating the voice table, provider
/// credentials and timeline settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Synthesis service settings
    pub provider: ProviderConfig,

    /// Voice used by cues without an explicit speaker
    pub default: VoiceEntry,

    /// Named voices, in channel order
    #[serde(default)]
    pub voices: Vec<NamedVoice>,

    /// Merge same-speaker cues separated by at most this gap; 0 disables merging
    #[serde(default)]
    pub merge_lines_threshold_ms: i64,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Synthesis service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    // @field: Engine model used for every voice
    #[serde(default = "default_model_id")]
    pub model_id: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_endpoint(),
            model_id: default_model_id(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// One voice: synthesis model, display name and speech rate
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct VoiceEntry {
    /// Voice model id at the synthesis service
    #[serde(default)]
    pub model: String,

    /// Display name, used in clip filenames and reports
    #[serde(default)]
    pub name: String,

    /// Speech rate multiplier
    #[serde(default = "default_speed")]
    pub speed: f32,
}

/// A voice registered under the speaker identity used in scripts
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NamedVoice {
    /// Speaker identity as written in the script
    pub key: String,

    /// Voice model id at the synthesis service
    #[serde(default)]
    pub model: String,

    /// Display name, used in clip filenames and reports
    #[serde(default)]
    pub name: String,

    /// Speech rate multiplier
    #[serde(default = "default_speed")]
    pub speed: f32,
}

impl NamedVoice {
    pub fn new(key: impl Into<String>, model: impl Into<String>, name: impl Into<String>, speed: f32) -> Self {
        Self {
            key: key.into(),
            model: model.into(),
            name: name.into(),
            speed,
        }
    }
}

/// Log level configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_endpoint() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_speed() -> f32 {
    1.0
}

impl Config {
    /// Load a configuration file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let config = Self::from_reader(BufReader::new(file)).map_err(|e| match e {
            ConfigError::Malformed { message, .. } => ConfigError::Malformed {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        Ok(config)
    }

    /// Parse and validate a configuration from any reader
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_reader(reader).map_err(|e| ConfigError::Malformed {
            path: Default::default(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.api_key is required".to_string()));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Invalid("provider.timeout_secs must be greater than 0".to_string()));
        }
        if self.default.model.trim().is_empty() {
            return Err(ConfigError::Invalid("default.model is required".to_string()));
        }
        if self.default.name.trim().is_empty() {
            return Err(ConfigError::Invalid("default.name is required".to_string()));
        }
        validate_speed("default", self.default.speed)?;

        let mut keys = HashSet::new();
        for named in &self.voices {
            let key = named.key.trim();
            if key.is_empty() {
                return Err(ConfigError::Invalid("voice key must not be empty".to_string()));
            }
            if !keys.insert(key) {
                return Err(ConfigError::Invalid(format!("voice '{}' is defined more than once", key)));
            }
            if named.model.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("voice '{}' has no model", key)));
            }
            if named.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("voice '{}' has no name", key)));
            }
            if named.name == self.default.name {
                return Err(ConfigError::Invalid(format!(
                    "voice '{}' uses the default voice name '{}'",
                    key, self.default.name
                )));
            }
            validate_speed(key, named.speed)?;
        }

        Ok(())
    }

    /// Effective merge threshold: a positive CLI value wins over the config file
    pub fn merge_threshold_ms(&self, cli_override: Option<i64>) -> i64 {
        match cli_override {
            Some(ms) if ms > 0 => ms,
            _ => self.merge_lines_threshold_ms,
        }
    }
}

fn validate_speed(owner: &str, speed: f32) -> Result<(), ConfigError> {
    if !speed.is_finite() || speed <= 0.0 || speed > 4.0 {
        return Err(ConfigError::Invalid(format!(
            "voice '{}' has invalid speed {}",
            owner, speed
        )));
    }
    Ok(())
}
