//! TOML-based settings for simplereports.
//!
//! Settings are optional; every field has a default. Example:
//! ```toml
//! [logging]
//! level = "info"
//!
//! [output]
//! csv_line_ending = "lf"
//! json_indent = 4
//! xml_indent = 2
//!
//! [connections]
//! expand_env = true   # expand ${VAR} in connect blocks (off by default)
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::connection::ResolveOptions;
use crate::output::{CsvLineEnding, OutputOptions};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Root settings structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Logging configuration.
    pub logging: LoggingSettings,

    /// Output file configuration.
    pub output: OutputSettings,

    /// Connection resolution configuration.
    pub connections: ConnectionSettings,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level (debug, info, warning, error, critical) when `-v` is not given.
    pub level: Option<String>,
}

/// Output file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    /// CSV record terminator.
    pub csv_line_ending: CsvLineEnding,

    /// Spaces per JSON indentation level.
    pub json_indent: usize,

    /// Spaces per XML indentation level.
    pub xml_indent: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            csv_line_ending: CsvLineEnding::Crlf,
            json_indent: 2,
            xml_indent: 2,
        }
    }
}

/// Connection resolution configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Expand `${VAR}` references in `connect` blocks.
    pub expand_env: bool,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SIMPLEREPORTS_CONFIG`
    /// 2. `./simplereports.toml`
    /// 3. `<config dir>/simplereports/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SIMPLEREPORTS_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("simplereports.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("simplereports").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Options for the output writers.
    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            csv_line_ending: self.output.csv_line_ending.clone(),
            json_indent: self.output.json_indent,
            xml_indent: self.output.xml_indent,
        }
    }

    /// Options for connection resolution.
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            expand_env: self.connections.expand_env,
        }
    }
}

/// Expand environment variables in a string.
///
/// Only `${VAR}` is recognized. Any other `$`, including an unterminated
/// `${`, is kept as written.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + 2 + len];
        let value =
            env::var(var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.to_string()))?;
        result.push_str(&rest[..start]);
        result.push_str(&value);
        rest = &rest[start + 3 + len..];
    }

    result.push_str(rest);
    Ok(result)
}
