//! Process settings
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `SAVERESTORE_*` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::errors::{ExError, ExErrorKind};
use crate::logging_facility::Profile;

const ENV_PREFIX: &str = "SAVERESTORE";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_path: PathBuf,
    /// Per-PV read timeout
    pub pv_read_timeout_ms: u64,
    /// Upper bound on in-flight reads within one take-snapshot request
    pub max_concurrent_reads: usize,
    /// How long a writer waits for the SQLite write lock
    pub storage_busy_timeout_ms: u64,
    pub log_profile: Profile,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("saverestore.db"),
            pv_read_timeout_ms: 2000,
            max_concurrent_reads: 32,
            storage_busy_timeout_ms: 5000,
            log_profile: Profile::Development,
        }
    }
}

impl Settings {
    /// Load settings from an optional TOML file plus the environment
    ///
    /// # Errors
    ///
    /// `Config` if the file is missing or malformed, or a value fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ExError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(Config::try_deserialize)
            .map_err(config_error)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from TOML text, ignoring the environment
    ///
    /// # Errors
    ///
    /// `Config` if the text is malformed or a value fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self, ExError> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()
            .and_then(Config::try_deserialize)
            .map_err(config_error)?;
        settings.validate()?;
        Ok(settings)
    }

    /// # Errors
    ///
    /// `Config` for a zero timeout or a zero read bound.
    pub fn validate(&self) -> Result<(), ExError> {
        let invalid = |field: &str| {
            ExError::new(ExErrorKind::Config)
                .with_op("load_settings")
                .with_entity_id(field)
                .with_message(format!("{} must be greater than zero", field))
        };
        if self.pv_read_timeout_ms == 0 {
            return Err(invalid("pv_read_timeout_ms"));
        }
        if self.max_concurrent_reads == 0 {
            return Err(invalid("max_concurrent_reads"));
        }
        if self.storage_busy_timeout_ms == 0 {
            return Err(invalid("storage_busy_timeout_ms"));
        }
        Ok(())
    }

    pub fn pv_read_timeout(&self) -> Duration {
        Duration::from_millis(self.pv_read_timeout_ms)
    }

    pub fn storage_busy_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_busy_timeout_ms)
    }
}

fn config_error(err: config::ConfigError) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op("load_settings")
        .with_message(err.to_string())
}
