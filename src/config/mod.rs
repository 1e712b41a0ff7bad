// Configuration module
//
// YAML-loadable settings for the logging middleware and the deterministic
// naming of its log files.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::body::BodyLoggingPolicy;
use crate::constants::{DEFAULT_FILE_STEM, JSON_LOG_EXTENSION, TEXT_LOG_EXTENSION};
use crate::error::ConfigError;
use crate::record::Level;
use crate::sink::WriteGuard;

/// Settings for [`crate::pipeline::LoggingMiddleware`] and its default sinks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Body capture policy (default: up to 2 MB)
    #[serde(default)]
    pub body_logging: BodyLoggingPolicy,

    /// Application name used in log file names
    #[serde(default)]
    pub app_name: Option<String>,

    /// Prefix for log lines and log file names
    #[serde(default)]
    pub log_prefix: String,

    /// Directory holding the derived log files (default: ".")
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,

    /// Threshold level of the default sinks (default: debug)
    #[serde(default = "default_level")]
    pub level: Level,

    /// Also append human-readable lines to the `.log` file
    #[serde(default)]
    pub text_log: bool,

    /// Coordination of JSON file writes (default: unsynchronized)
    #[serde(default)]
    pub file_writes: WriteGuard,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            body_logging: BodyLoggingPolicy::default(),
            app_name: None,
            log_prefix: String::new(),
            log_directory: default_log_directory(),
            level: default_level(),
            text_log: false,
            file_writes: WriteGuard::default(),
        }
    }
}

fn default_log_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_level() -> Level {
    Level::Debug
}

impl MiddlewareConfig {
    /// Parse YAML, substituting `${VAR}` references from the environment.
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            if std::env::var(var_name).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )));
            }
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        let config: MiddlewareConfig = serde_yaml::from_str(&substituted)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_directory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "log_directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn file_names(&self) -> LogFileNames {
        LogFileNames::derive(self.app_name.as_deref(), &self.log_prefix)
    }

    pub fn json_log_path(&self) -> PathBuf {
        self.log_directory.join(self.file_names().json)
    }

    pub fn text_log_path(&self) -> PathBuf {
        self.log_directory.join(self.file_names().text)
    }
}

/// File names derived from an app name and a prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileNames {
    pub stem: String,
    /// Backing file of the JSON sink
    pub json: String,
    /// Plain-text destination
    pub text: String,
}

impl LogFileNames {
    /// `_<app>_<prefix>.json` / `.log`, using whichever parts survive
    /// sanitisation, or the default stem when neither does.
    pub fn derive(app_name: Option<&str>, prefix: &str) -> Self {
        let app = app_name.map(sanitize).unwrap_or_default();
        let prefix = sanitize(prefix);

        let stem = match (app.is_empty(), prefix.is_empty()) {
            (false, false) => format!("{}_{}", app, prefix),
            (false, true) => app,
            (true, false) => prefix,
            (true, true) => DEFAULT_FILE_STEM.to_string(),
        };

        Self {
            json: format!("_{}.{}", stem, JSON_LOG_EXTENSION),
            text: format!("_{}.{}", stem, TEXT_LOG_EXTENSION),
            stem,
        }
    }
}

/// Keep ASCII letters and digits only
fn sanitize(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}
