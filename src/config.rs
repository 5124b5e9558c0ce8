//! Engine configuration module.
//!
//! Handles loading, validating, and merging `rasterscript.toml`. Stock
//! defaults are serialized to a TOML table, the user file is merged on top,
//! and the result is deserialized and validated.
//!
//! ## Config File Location
//!
//! `rasterscript.toml` in the working directory, or any file passed with
//! `--config`. The default location is optional; an explicit path must exist.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [interpreter]
//! on_error = "skip"         # "skip" continues after a failing line, "abort" stops
//! max_script_depth = 8      # Deepest chain of nested `run` commands
//!
//! [color_correct]
//! clip = 10                 # Values within `clip` of 0 or the ceiling are ignored
//!
//! [processing]
//! max_processes = 4         # Scripts run in parallel (omit for auto = CPU cores)
//!
//! [logging]
//! level = "info"            # error | warn | info | debug | trace
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [interpreter]
//! on_error = "abort"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::error::ErrorKind;
use crate::interpreter::{ErrorPolicy, InterpreterSettings};
use crate::ops::ColorCorrection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "rasterscript.toml";

pub const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::Io(_) => ErrorKind::Io,
            ConfigError::Toml(_) | ConfigError::Serialize(_) | ConfigError::Validation(_) => {
                ErrorKind::InvalidArgument
            }
        }
    }
}

/// Engine configuration loaded from `rasterscript.toml`.
///
/// All fields have defaults; a user file only lists what it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub interpreter: InterpreterConfig,
    pub color_correct: ColorCorrectConfig,
    pub processing: ProcessingConfig,
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interpreter.max_script_depth == 0 {
            return Err(ConfigError::Validation(
                "interpreter.max_script_depth must be at least 1".into(),
            ));
        }
        if self.color_correct.clip > 127 {
            return Err(ConfigError::Validation(
                "color_correct.clip must be 0-127".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// Interpreter settings derived from this config.
    pub fn to_settings(&self) -> InterpreterSettings {
        InterpreterSettings {
            on_error: self.interpreter.on_error,
            max_script_depth: self.interpreter.max_script_depth,
            color_correction: ColorCorrection::new(self.color_correct.clip),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterpreterConfig {
    pub on_error: ErrorPolicy,
    pub max_script_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            on_error: ErrorPolicy::Skip,
            max_script_depth: InterpreterSettings::DEFAULT_MAX_SCRIPT_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorCorrectConfig {
    pub clip: u32,
}

impl Default for ColorCorrectConfig {
    fn default() -> Self {
        Self {
            clip: ColorCorrection::DEFAULT_CLIP,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of scripts run at once.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(EngineConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EngineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EngineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the engine config.
///
/// With `Some(path)` the file must exist. With `None`,
/// [`DEFAULT_CONFIG_FILE`] is read if present and stock defaults are used
/// otherwise.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    let overlay = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str(&content)?)
        }
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    resolve_config(stock_defaults_value()?, overlay)
}

/// Returns a fully-commented stock `rasterscript.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# rasterscript configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Interpreter
# ---------------------------------------------------------------------------
[interpreter]
# What a script does after a failing line:
#   "skip"  - report the failure and continue with the next line
#   "abort" - stop the script at the first failure
on_error = "skip"

# Deepest chain of nested `run <script>` commands, counting the outer script.
max_script_depth = 8

# ---------------------------------------------------------------------------
# Colour correction
# ---------------------------------------------------------------------------
[color_correct]
# Channel values within `clip` of 0 or of the ceiling are left out of the
# histogram when finding each channel's peak.
clip = 10

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of scripts run in parallel by `rasterscript run`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# Log filter used when RUST_LOG is not set: error, warn, info, debug, trace.
level = "info"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.interpreter.on_error, ErrorPolicy::Skip);
        assert_eq!(config.interpreter.max_script_depth, 8);
        assert_eq!(config.color_correct.clip, 10);
        assert_eq!(config.processing.max_processes, None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[interpreter]
on_error = "abort"
"#;
        let config: EngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.interpreter.on_error, ErrorPolicy::Abort);
        // Unspecified defaults preserved
        assert_eq!(config.interpreter.max_script_depth, 8);
        assert_eq!(config.color_correct.clip, 10);
    }

    #[test]
    fn to_settings_carries_every_field() {
        let toml = r#"
[interpreter]
on_error = "abort"
max_script_depth = 3

[color_correct]
clip = 4
"#;
        let config: EngineConfig = toml::from_str(toml).unwrap();
        let settings = config.to_settings();
        assert_eq!(settings.on_error, ErrorPolicy::Abort);
        assert_eq!(settings.max_script_depth, 3);
        assert_eq!(settings.color_correction, ColorCorrection::new(4));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_reads_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(
            &path,
            r#"
[logging]
level = "debug"
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.interpreter.on_error, ErrorPolicy::Skip);
    }

    #[test]
    fn load_config_explicit_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Io);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        fs::write(
            &path,
            r#"
[color_correct]
clip = 200
"#,
        )
        .unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    // =========================================================================
    // Processing config tests
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let config = ProcessingConfig {
            max_processes: None,
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"clip = 10"#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"clip = 3"#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("clip").unwrap().as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_preserves_base_keys() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[interpreter]
on_error = "abort"
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let interpreter = merged.get("interpreter").unwrap();
        assert_eq!(interpreter.get("on_error").unwrap().as_str(), Some("abort"));
        assert_eq!(
            interpreter.get("max_script_depth").unwrap().as_integer(),
            Some(8)
        );
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[interpreter]
on_eror = "skip"
"#;
        let result: Result<EngineConfig, _> = toml::from_str(toml_str);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<EngineConfig, _> = toml::from_str("[interpretter]\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_policy_rejected() {
        let toml_str = r#"
[interpreter]
on_error = "retry"
"#;
        let result: Result<EngineConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_zero_depth() {
        let mut config = EngineConfig::default();
        config.interpreter.max_script_depth = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_zero_processes() {
        let mut config = EngineConfig::default();
        config.processing.max_processes = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_log_level() {
        let mut config = EngineConfig::default();
        config.logging.level = "loud".into();
        assert!(config.validate().is_err());
        config.logging.level = "trace".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let overlay: toml::Value = toml::from_str("[interpreter]\nmax_script_depth = 0\n").unwrap();
        let result = resolve_config(stock_defaults_value().unwrap(), Some(overlay));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: EngineConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        for section in ["[interpreter]", "[color_correct]", "[processing]", "[logging]"] {
            assert!(content.contains(section), "missing {section}");
        }
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        assert!(val.is_table());
        for section in ["interpreter", "color_correct", "processing", "logging"] {
            assert!(val.get(section).is_some(), "missing {section}");
        }
    }
}
