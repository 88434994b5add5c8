//! TOML-based configuration for recordmodel.
//!
//! Supports a config file (recordmodel.toml) with environment variable
//! expansion in string values.
//!
//! Example configuration:
//! ```toml
//! [model]
//! strict_mode = false
//! enforce_permissions = false
//! dialect = "postgres"
//!
//! [control]
//! header_table = "models"
//! columns_table = "models_det"
//! schema = "${CONTROL_SCHEMA}"
//!
//! [cache]
//! backend = "sqlite"
//! path = "~/.recordmodel/cache.db"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::metadata::ControlSchema;
use crate::sql::Dialect;

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

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Defaults for model handles.
    pub model: ModelSettings,

    /// Control table naming.
    pub control: ControlSettings,

    /// Metadata cache store.
    pub cache: CacheSettings,
}

/// Defaults for model handles.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Pass field maps through without translation.
    pub strict_mode: bool,

    /// Fail operations whose permission flag is off.
    pub enforce_permissions: bool,

    /// Dialect the configured executor is expected to speak.
    pub dialect: Dialect,
}

/// Control table naming.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlSettings {
    /// Model-header table.
    pub header_table: String,

    /// Model-columns table.
    pub columns_table: String,

    /// Schema of both tables (supports ${ENV_VAR} expansion).
    pub schema: Option<String>,
}

impl Default for ControlSettings {
    fn default() -> Self {
        let control = ControlSchema::default();
        Self {
            header_table: control.header_table,
            columns_table: control.columns_table,
            schema: control.schema,
        }
    }
}

impl ControlSettings {
    /// Resolve into a [`ControlSchema`], expanding environment variables.
    pub fn control_schema(&self) -> Result<ControlSchema, SettingsError> {
        let header_table = expand_env_vars(&self.header_table)?;
        let columns_table = expand_env_vars(&self.columns_table)?;
        if header_table.is_empty() || columns_table.is_empty() {
            return Err(SettingsError::InvalidConfig(
                "control table names must not be empty".into(),
            ));
        }
        let schema = match &self.schema {
            Some(s) => Some(expand_env_vars(s)?).filter(|s| !s.is_empty()),
            None => None,
        };
        Ok(ControlSchema {
            schema,
            header_table,
            columns_table,
        })
    }
}

/// Cache backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Metadata cache store.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    pub backend: CacheBackend,

    /// Database file for the sqlite backend. Defaults to
    /// `~/.recordmodel/cache.db`. A leading `~/` expands to the home directory.
    pub path: Option<String>,
}

impl CacheSettings {
    /// Resolved database path for the sqlite backend, if configured.
    pub fn resolved_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        let Some(raw) = &self.path else {
            return Ok(None);
        };
        let expanded = expand_env_vars(raw)?;
        match expanded.strip_prefix("~/") {
            Some(rest) => {
                let home = dirs::home_dir().ok_or_else(|| {
                    SettingsError::InvalidConfig("cannot resolve home directory".into())
                })?;
                Ok(Some(home.join(rest)))
            }
            None => Ok(Some(PathBuf::from(expanded))),
        }
    }
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

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `RECORDMODEL_CONFIG`
    /// 2. `./recordmodel.toml`
    /// 3. `~/.config/recordmodel/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("RECORDMODEL_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("recordmodel.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("recordmodel").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // Return defaults if no config file found
        Ok(Settings::default())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            // $VAR ends at non-alphanumeric/underscore
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
        }

        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
