//! Run configuration.
//!
//! Values come from three layers, highest precedence first: command line
//! flags (clap also fills these from environment variables), the TOML config
//! file, and built-in defaults. [`Settings`] is the resolved, immutable result.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::app::bulk::DEFAULT_QUOTA_CEILING;
use crate::app::data_plane::cloudwatch_logs::{AwsConnection, DEFAULT_POLL_INTERVAL};
use crate::app::errors::{CwInsightError, Result};
use crate::app::output::OutputMode;
use crate::app::time_window::{parse_time, TimeWindow, WindowSpec};

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = ".cwinsight.toml";

/// Contents of a config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub query_string: Option<String>,
    /// humantime duration, e.g. `"1h"`
    pub before: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    /// humantime duration, e.g. `"3days"`
    pub duration_quota: Option<String>,
    pub raw: Option<bool>,
    pub max_concurrency: Option<usize>,
    pub poll_interval: Option<String>,
    pub poll_timeout: Option<String>,
    pub region: Option<String>,
    pub profile: Option<String>,
}

impl FileConfig {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| CwInsightError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CwInsightError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }
}

/// Pick the config file to read.
///
/// An explicit path must exist. Otherwise `.cwinsight.toml` in `cwd` is used
/// if present, then `config.toml` in the user's config directory.
pub fn locate_config(explicit: Option<&Path>, cwd: &Path) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(CwInsightError::config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    let local = cwd.join(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Ok(Some(local));
    }

    let user = directories::ProjectDirs::from("", "", "cwinsight")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .filter(|path| path.is_file());

    Ok(user)
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub query_string: Option<String>,
    pub before: Option<Duration>,
    pub start: Option<chrono::DateTime<chrono::Utc>>,
    pub end: Option<chrono::DateTime<chrono::Utc>>,
    pub duration_quota: Option<Duration>,
    /// `Some(false)` turns off `raw = true` from the file
    pub raw: Option<bool>,
    pub max_concurrency: Option<usize>,
    pub poll_interval: Option<Duration>,
    pub poll_timeout: Option<Duration>,
    pub region: Option<String>,
    pub profile: Option<String>,
}

/// Fully resolved configuration for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub query_string: Option<String>,
    pub window: WindowSpec,
    pub duration_quota: Duration,
    pub output_mode: OutputMode,
    pub max_concurrency: Option<usize>,
    pub poll_interval: Duration,
    pub poll_timeout: Option<Duration>,
    pub connection: AwsConnection,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            query_string: None,
            window: WindowSpec::default(),
            duration_quota: DEFAULT_QUOTA_CEILING,
            output_mode: OutputMode::Normalized,
            max_concurrency: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: None,
            connection: AwsConnection::default(),
        }
    }
}

impl Settings {
    /// Layer overrides on top of the file config on top of defaults
    pub fn resolve(overrides: ConfigOverrides, file: FileConfig) -> Result<Self> {
        let defaults = Self::default();

        // start and before pick the window origin together; a layer that sets
        // either one replaces both values from the layers below it
        let (start, before) = if overrides.start.is_some() || overrides.before.is_some() {
            (overrides.start, overrides.before)
        } else {
            (
                pick_time(None, file.start.as_deref())?,
                pick_duration(None, file.before.as_deref(), "before")?,
            )
        };
        let window = WindowSpec {
            start,
            end: pick_time(overrides.end, file.end.as_deref())?,
            before,
        };

        let settings = Self {
            query_string: overrides.query_string.or(file.query_string),
            window,
            duration_quota: pick_duration(
                overrides.duration_quota,
                file.duration_quota.as_deref(),
                "duration_quota",
            )?
            .unwrap_or(defaults.duration_quota),
            output_mode: OutputMode::from_raw_flag(overrides.raw.or(file.raw).unwrap_or(false)),
            max_concurrency: overrides.max_concurrency.or(file.max_concurrency),
            poll_interval: pick_duration(
                overrides.poll_interval,
                file.poll_interval.as_deref(),
                "poll_interval",
            )?
            .unwrap_or(defaults.poll_interval),
            poll_timeout: pick_duration(
                overrides.poll_timeout,
                file.poll_timeout.as_deref(),
                "poll_timeout",
            )?,
            connection: AwsConnection {
                region: overrides.region.or(file.region),
                profile: overrides.profile.or(file.profile),
            },
        };

        if settings.max_concurrency == Some(0) {
            return Err(CwInsightError::config("max_concurrency must be at least 1"));
        }
        if settings.poll_interval.is_zero() {
            return Err(CwInsightError::config("poll_interval must be greater than zero"));
        }

        debug!("Resolved settings: {:?}", settings);
        Ok(settings)
    }

    /// The query string, which query and bulk runs require
    pub fn require_query_string(&self) -> Result<&str> {
        match self.query_string.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => Ok(query),
            _ => Err(CwInsightError::config(
                "query string is empty (set --query-string, QUERY_STRING or query_string)",
            )),
        }
    }

    pub fn resolve_window(&self, now: chrono::DateTime<chrono::Utc>) -> Result<TimeWindow> {
        self.window
            .resolve(now)
            .map_err(|e| CwInsightError::config(e.to_string()))
    }
}

fn pick_time(
    flag: Option<chrono::DateTime<chrono::Utc>>,
    file: Option<&str>,
) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
    match flag {
        Some(instant) => Ok(Some(instant)),
        None => Ok(file.map(parse_time).transpose()?),
    }
}

fn pick_duration(flag: Option<Duration>, file: Option<&str>, key: &str) -> Result<Option<Duration>> {
    if flag.is_some() {
        return Ok(flag);
    }
    file.map(|text| {
        humantime::parse_duration(text)
            .map_err(|e| CwInsightError::config(format!("invalid {} '{}': {}", key, text, e)))
    })
    .transpose()
}
