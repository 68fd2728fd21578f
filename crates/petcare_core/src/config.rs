//! Application configuration.
//!
//! # Responsibility
//! - Load `petcare.toml`, falling back to defaults for missing fields.
//! - Apply `PETCARE_*` environment overrides on top of file values.
//!
//! # Invariants
//! - A missing config file is not an error.
//! - An unreadable or malformed file is reported, never silently replaced.

use crate::logging::default_log_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "petcare.toml";
const DEFAULT_PET_NAME: &str = "Jojo";
const DEFAULT_DB_FILE: &str = "petcare.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pet_name: String,
    pub db_path: PathBuf,
    /// Absolute directory for rolling log files; logging is off when unset.
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pet_name: DEFAULT_PET_NAME.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            log_dir: None,
            log_level: default_log_level().to_string(),
        }
    }
}

impl AppConfig {
    /// Loads config from `path`, then applies environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Same as `load`, with an injectable environment lookup.
    pub fn load_with_env(
        path: impl AsRef<Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => Self::default(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        config.apply_env_overrides(env);
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn apply_env_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(value) = non_blank(env("PETCARE_PET_NAME")) {
            self.pet_name = value;
        }
        if let Some(value) = non_blank(env("PETCARE_DB_PATH")) {
            self.db_path = PathBuf::from(value);
        }
        if let Some(value) = non_blank(env("PETCARE_LOG_DIR")) {
            self.log_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = non_blank(env("PETCARE_LOG_LEVEL")) {
            self.log_level = value;
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
