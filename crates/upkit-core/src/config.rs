//! Configuration loading
//!
//! Settings come from TOML. The embedded defaults are always applied first;
//! a user file (explicit path, or `<config dir>/upkit/config.toml`) is then
//! layered on top, so it only needs the keys it changes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::time::parse_timezone;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

pub const DEFAULT_BASE_URL: &str = "https://api.up.com.au/api/v1";

#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    pub base_url: String,
    pub page_size: usize,
    pub timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 100,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub timezone: Tz,
    pub output_dir: PathBuf,
    pub input_dir: PathBuf,
    pub lower_variance_limit: f64,
    pub upper_variance_limit: f64,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Australia::Sydney,
            output_dir: PathBuf::from("outputs"),
            input_dir: PathBuf::from("inputs"),
            lower_variance_limit: 97.5,
            upper_variance_limit: 120.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Default filter directive when neither RUST_LOG nor --verbose is set
    pub level: String,
    /// Directory for the log file; `None` disables file logging
    pub log_dir: Option<PathBuf>,
    pub log_file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: Some(PathBuf::from("logs")),
            log_file: "upkit.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub api: ApiSettings,
    pub report: ReportSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings, layering `path` (or the default user file) over the embedded defaults.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// user file is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = Self::default();
        settings.apply(DEFAULT_CONFIG)?;

        let user_file = match path {
            Some(p) if !p.exists() => {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )))
            }
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().filter(|p| p.exists()),
        };

        if let Some(file) = user_file {
            debug!(path = %file.display(), "Loading config");
            let content = fs::read_to_string(&file).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", file.display(), e))
            })?;
            settings.apply(&content)?;
        }

        Ok(settings)
    }

    /// Parse settings from TOML over the embedded defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut settings = Self::default();
        settings.apply(DEFAULT_CONFIG)?;
        settings.apply(content)?;
        Ok(settings)
    }

    fn apply(&mut self, content: &str) -> Result<()> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        if let Some(api) = raw.api {
            if let Some(base_url) = api.base_url {
                self.api.base_url = base_url;
            }
            if let Some(page_size) = api.page_size {
                if page_size == 0 {
                    return Err(Error::Config("api.page_size must be at least 1".into()));
                }
                self.api.page_size = page_size;
            }
            if let Some(timeout) = api.timeout_secs {
                self.api.timeout = Duration::from_secs(timeout);
            }
        }

        if let Some(report) = raw.report {
            if let Some(timezone) = report.timezone {
                self.report.timezone = parse_timezone(&timezone)?;
            }
            if let Some(dir) = report.output_dir {
                self.report.output_dir = dir;
            }
            if let Some(dir) = report.input_dir {
                self.report.input_dir = dir;
            }
            if let Some(lower) = report.lower_variance_limit {
                self.report.lower_variance_limit = lower;
            }
            if let Some(upper) = report.upper_variance_limit {
                self.report.upper_variance_limit = upper;
            }
        }

        if let Some(logging) = raw.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(dir) = logging.log_dir {
                // An empty directory turns file logging off
                self.logging.log_dir = if dir.as_os_str().is_empty() {
                    None
                } else {
                    Some(dir)
                };
            }
            if let Some(file) = logging.log_file {
                self.logging.log_file = file;
            }
        }

        Ok(())
    }
}

/// Default user config path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("upkit").join("config.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    api: Option<RawApi>,
    report: Option<RawReport>,
    logging: Option<RawLogging>,
}

#[derive(Debug, Deserialize)]
struct RawApi {
    base_url: Option<String>,
    page_size: Option<usize>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawReport {
    timezone: Option<String>,
    output_dir: Option<PathBuf>,
    input_dir: Option<PathBuf>,
    lower_variance_limit: Option<f64>,
    upper_variance_limit: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawLogging {
    level: Option<String>,
    log_dir: Option<PathBuf>,
    log_file: Option<String>,
}
