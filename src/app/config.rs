//! Client configuration.
//!
//! [`ClientConfig`] is what the facade is built from. It is assembled from
//! command-line flags layered over an optional TOML settings file:
//!
//! ```toml
//! region = "us-east-1,eu-west-1"
//! timeout_secs = 8
//! failure_policy = "wait-for-deadline"
//! log_level = "debug"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::app::query::{EngineSettings, FailurePolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of the optional settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Region specifier, same syntax as `--region`
    pub region: Option<String>,
    pub timeout_secs: Option<u64>,
    pub failure_policy: Option<FailurePolicy>,
    /// Crate log level used when neither `RUST_LOG` nor `-v` is given
    pub log_level: Option<String>,
}

impl Settings {
    /// `<config dir>/awsresq/config.toml` for the current user
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "", "awsresq")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load an explicitly named file, or the default file when it exists.
    ///
    /// A missing default file yields empty settings; a missing explicit file
    /// is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_from_file(path),
            _ => Ok(Self::default()),
        }
    }
}

/// Values given on the command line; `None` falls back to the settings file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub region: Option<String>,
    pub timeout_secs: Option<u64>,
    pub failure_policy: Option<FailurePolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Comma list, `all`, or empty
    pub region_spec: String,
    pub service: String,
    pub engine: EngineSettings,
}

impl ClientConfig {
    pub fn new(service: impl Into<String>, region_spec: impl Into<String>) -> Self {
        Self {
            region_spec: region_spec.into(),
            service: service.into(),
            engine: EngineSettings::default(),
        }
    }

    pub fn with_engine(mut self, engine: EngineSettings) -> Self {
        self.engine = engine;
        self
    }

    /// Layer command-line overrides over file settings
    pub fn resolve(service: impl Into<String>, overrides: &Overrides, settings: &Settings) -> Self {
        let region_spec = overrides
            .region
            .clone()
            .or_else(|| settings.region.clone())
            .unwrap_or_default();

        let timeout_override = match overrides.timeout_secs.or(settings.timeout_secs) {
            Some(0) => {
                trace_warn!("ignoring a timeout of 0 seconds, using the service default");
                None
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        let failure_policy = overrides
            .failure_policy
            .or(settings.failure_policy)
            .unwrap_or_default();

        Self::new(service, region_spec).with_engine(EngineSettings {
            timeout_override,
            failure_policy,
        })
    }
}
