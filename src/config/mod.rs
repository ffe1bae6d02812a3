//! Configuration System for fuzzy-anemia
//!
//! Provides:
//! - TOML configuration files
//! - Environment variable overrides
//! - Multiple config file locations
//!
//! The clinical definitions (universes, terms, rules) are fixed and are not
//! configurable. Only how the engine combines and reads them, plus the output
//! of the command-line tool, can be changed.
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./fuzzy-anemia.toml` - Project-local configuration
//! 2. `~/.config/fuzzy-anemia/config.toml` - User configuration (XDG)
//! 3. `~/.fuzzy-anemia/config.toml` - User configuration (legacy)
//! 4. `/etc/fuzzy-anemia/config.toml` - System-wide configuration
//!
//! # Environment Variables
//!
//! - `ANEMIA_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//! - `ANEMIA_FORMAT` - Output format (text, json)
//! - `ANEMIA_DEFUZZ` - Defuzzification method (centroid, bisector, mom, som, lom)
//! - `ANEMIA_IMPLICATION` - Implication operator (minimum, product)
//! - `ANEMIA_DOWNSAMPLE` - Default number of points per exported curve
//!
//! # Example Configuration
//!
//! ```toml
//! [general]
//! log_level = "normal"
//! format = "text"
//!
//! [inference]
//! defuzzification = "centroid"
//! implication = "minimum"
//!
//! [curves]
//! downsample = 200
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fuzzy::{DefuzzificationMethod, Implication};

const FILE_NAME: &str = "fuzzy-anemia.toml";
const APP_DIR: &str = "fuzzy-anemia";

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnemiaConfig {
    pub general: GeneralConfig,
    pub inference: InferenceConfig,
    pub curves: CurveConfig,
}

/// General configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Logging level
    pub log_level: LogLevel,
    /// Output format of the command-line tool
    pub format: OutputFormat,
}

/// How the fuzzy engine combines rule outputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InferenceConfig {
    pub implication: Implication,
    pub defuzzification: DefuzzificationMethod,
}

/// Membership curve export options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CurveConfig {
    /// Points per curve; unset exports the full universe resolution
    pub downsample: Option<usize>,
}

// ============================================================================
// Enums
// ============================================================================

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "plain" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Log level options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// `tracing` filter directive for this level
    pub fn filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "error",
            LogLevel::Normal => "warn",
            LogLevel::Verbose => "info",
            LogLevel::Debug => "debug",
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl AnemiaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the first config file found, then apply environment
    /// overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = Self::config_paths().into_iter().find(|p| p.exists()) {
            config = Self::load_from_file(&path)?;
        }

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(PathBuf::from("<string>"), e.to_string()))
    }

    /// Get the list of config file search paths
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".").join(FILE_NAME)];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_DIR).join("config.toml"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(format!(".{}", APP_DIR)).join("config.toml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc").join(APP_DIR).join("config.toml"));

        paths
    }

    /// Apply `ANEMIA_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup. Unparseable values are errors
    /// rather than silently ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("ANEMIA_LOG_LEVEL") {
            self.general.log_level = LogLevel::from_str(&val)
                .ok_or_else(|| ConfigError::invalid("ANEMIA_LOG_LEVEL", &val))?;
        }

        if let Some(val) = lookup("ANEMIA_FORMAT") {
            self.general.format = OutputFormat::from_str(&val)
                .ok_or_else(|| ConfigError::invalid("ANEMIA_FORMAT", &val))?;
        }

        if let Some(val) = lookup("ANEMIA_DEFUZZ") {
            self.inference.defuzzification = DefuzzificationMethod::from_str(&val)
                .ok_or_else(|| ConfigError::invalid("ANEMIA_DEFUZZ", &val))?;
        }

        if let Some(val) = lookup("ANEMIA_IMPLICATION") {
            self.inference.implication = Implication::from_str(&val)
                .ok_or_else(|| ConfigError::invalid("ANEMIA_IMPLICATION", &val))?;
        }

        if let Some(val) = lookup("ANEMIA_DOWNSAMPLE") {
            let points = val
                .parse::<usize>()
                .ok()
                .filter(|&n| n >= 2)
                .ok_or_else(|| ConfigError::invalid("ANEMIA_DOWNSAMPLE", &val))?;
            self.curves.downsample = Some(points);
        }

        Ok(())
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Write configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        fs::write(path, content).map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))
    }

    /// Commented default configuration file
    pub fn default_config_content() -> &'static str {
        r#"# fuzzy-anemia configuration

[general]
# Logging level: quiet, normal, verbose, debug
log_level = "normal"
# Output format: text, json
format = "text"

[inference]
# Implication operator: minimum (Mamdani), product (Larsen)
implication = "minimum"
# Defuzzification: centroid, bisector, mean_of_maximum,
# smallest_of_maximum, largest_of_maximum
defuzzification = "centroid"

[curves]
# Points per exported membership curve (omit for full resolution)
# downsample = 200
"#
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("IO error reading {}: {1}", .0.display())]
    IoError(PathBuf, String),
    #[error("Parse error in {}: {1}", .0.display())]
    ParseError(PathBuf, String),
    #[error("Serialization error: {0}")]
    SerializeError(String),
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

impl ConfigError {
    fn invalid(key: &str, value: &str) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AnemiaConfig::new();
        assert_eq!(config.general.log_level, LogLevel::Normal);
        assert_eq!(config.general.format, OutputFormat::Text);
        assert_eq!(config.inference.defuzzification, DefuzzificationMethod::Centroid);
        assert_eq!(config.inference.implication, Implication::Minimum);
        assert_eq!(config.curves.downsample, None);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [general]
            format = "json"
            log_level = "verbose"

            [inference]
            defuzzification = "mean_of_maximum"
            implication = "product"

            [curves]
            downsample = 120
        "#;

        let config = AnemiaConfig::load_from_str(toml).unwrap();
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.general.log_level, LogLevel::Verbose);
        assert_eq!(config.inference.defuzzification, DefuzzificationMethod::MeanOfMaximum);
        assert_eq!(config.inference.implication, Implication::Product);
        assert_eq!(config.curves.downsample, Some(120));
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = AnemiaConfig::load_from_str("[general]\nformat = \"json\"\n").unwrap();
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.inference, InferenceConfig::default());
    }

    #[test]
    fn test_bad_config_is_parse_error() {
        let err = AnemiaConfig::load_from_str("[inference]\ndefuzzification = \"median\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(..)));
    }

    #[test]
    fn test_default_content_parses() {
        let config = AnemiaConfig::load_from_str(AnemiaConfig::default_config_content()).unwrap();
        assert_eq!(config, AnemiaConfig::default());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ANEMIA_LOG_LEVEL", "debug"),
            ("ANEMIA_FORMAT", "json"),
            ("ANEMIA_DEFUZZ", "lom"),
            ("ANEMIA_IMPLICATION", "larsen"),
            ("ANEMIA_DOWNSAMPLE", "64"),
        ]
        .into_iter()
        .collect();

        let mut config = AnemiaConfig::new();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.general.log_level, LogLevel::Debug);
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.inference.defuzzification, DefuzzificationMethod::LargestOfMaximum);
        assert_eq!(config.inference.implication, Implication::Product);
        assert_eq!(config.curves.downsample, Some(64));
    }

    #[test]
    fn test_invalid_override() {
        let mut config = AnemiaConfig::new();
        let err = config
            .apply_overrides(|key| (key == "ANEMIA_DOWNSAMPLE").then(|| "1".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "ANEMIA_DOWNSAMPLE"));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);

        let mut config = AnemiaConfig::new();
        config.general.format = OutputFormat::Json;
        config.curves.downsample = Some(32);
        config.save_to_file(&path).unwrap();

        let loaded = AnemiaConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AnemiaConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_config_paths() {
        let paths = AnemiaConfig::config_paths();
        assert!(!paths.is_empty());
        assert!(paths[0].ends_with(FILE_NAME));
    }

    #[test]
    fn test_log_level_directives() {
        assert_eq!(LogLevel::from_str("v"), Some(LogLevel::Verbose));
        assert_eq!(LogLevel::Quiet.filter_directive(), "error");
        assert_eq!(LogLevel::Debug.filter_directive(), "debug");
    }
}
