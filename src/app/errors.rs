//! Crate-level error type and its mapping onto process exit codes.

use std::path::PathBuf;
use thiserror::Error;

use super::bulk::quota::QuotaRejection;
use super::data_plane::cloudwatch_logs::executor::QueryError;
use super::data_plane::cloudwatch_logs::sdk_errors::RemoteError;
use super::time_window::TimeParseError;

#[derive(Debug, Error)]
pub enum CwInsightError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to read config file {path}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to read targets from {source_name}")]
    TargetSource {
        source_name: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Time(#[from] TimeParseError),
    #[error("quota check failed: {0}")]
    Quota(#[from] QuotaRejection),
    #[error("{0}")]
    Remote(RemoteError),
    #[error("query against {log_group} failed")]
    Query {
        log_group: String,
        #[source]
        source: QueryError,
    },
    #[error("failed to serialize output")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to write output")]
    Output(#[source] std::io::Error),
    #[error("result collection closed after {received} of {expected} records")]
    Collection { expected: usize, received: usize },
    #[error("{failed} of {total} targets failed")]
    TargetsFailed { failed: usize, total: usize },
}

impl CwInsightError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Exit status for this error: 2 when the envelope was still written, 1 otherwise
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::TargetsFailed { .. } => 2,
            _ => 1,
        }
    }
}

impl From<RemoteError> for CwInsightError {
    fn from(error: RemoteError) -> Self {
        Self::Remote(error)
    }
}

pub type Result<T, E = CwInsightError> = std::result::Result<T, E>;
