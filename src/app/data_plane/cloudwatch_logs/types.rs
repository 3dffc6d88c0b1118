//! CloudWatch Logs Insights Data Types
//!
//! Data structures for Logs Insights queries, their results, and log group
//! descriptors. These are the crate's own types; the AWS SDK types never leak
//! past the client wrapper.

#![warn(clippy::all, rust_2018_idioms)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Parameters for a single StartQuery call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartQueryRequest {
    /// Log group the query is scoped to
    pub log_group_name: String,
    /// Logs Insights query expression
    pub query_string: String,
    /// Window start (Unix timestamp in seconds)
    pub start_time: i64,
    /// Window end (Unix timestamp in seconds)
    pub end_time: i64,
}

/// Status reported by GetQueryResults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryStatus {
    Scheduled,
    Running,
    Complete,
    Failed,
    Cancelled,
    Timeout,
    Unknown,
    /// A status this crate does not know about yet
    Other(String),
}

impl QueryStatus {
    /// Map the service's status string onto a status
    pub fn from_service(value: &str) -> Self {
        match value {
            "Scheduled" => Self::Scheduled,
            "Running" => Self::Running,
            "Complete" => Self::Complete,
            "Failed" => Self::Failed,
            "Cancelled" => Self::Cancelled,
            "Timeout" => Self::Timeout,
            "Unknown" => Self::Unknown,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Running => "Running",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
            Self::Timeout => "Timeout",
            Self::Unknown => "Unknown",
            Self::Other(other) => other,
        }
    }

    /// The query finished and its results are final
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// The service gave up on the query; polling again will not change that
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled | Self::Timeout)
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `{field, value}` cell of a result row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultField {
    pub field: String,
    pub value: String,
}

impl ResultField {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// A result row as the service returns it
pub type ResultRow = Vec<ResultField>;

/// Fold a row into a `field -> value` mapping.
///
/// A field repeated within one row keeps its last value.
pub fn row_to_map(row: &[ResultField]) -> BTreeMap<String, String> {
    row.iter()
        .map(|cell| (cell.field.clone(), cell.value.clone()))
        .collect()
}

/// Statistics about a Logs Insights query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryStatistics {
    /// Number of log events that matched the query
    pub records_matched: f64,
    /// Number of log events scanned
    pub records_scanned: f64,
    /// Bytes scanned during the query
    pub bytes_scanned: f64,
}

impl QueryStatistics {
    pub fn new(records_matched: f64, records_scanned: f64, bytes_scanned: f64) -> Self {
        Self {
            records_matched,
            records_scanned,
            bytes_scanned,
        }
    }
}

/// One GetQueryResults response
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResultsPage {
    pub status: QueryStatus,
    pub results: Vec<ResultRow>,
    pub statistics: Option<QueryStatistics>,
}

impl QueryResultsPage {
    /// A page for a query that is still in flight
    pub fn pending(status: QueryStatus) -> Self {
        Self {
            status,
            results: Vec::new(),
            statistics: None,
        }
    }

    /// A page for a finished query
    pub fn complete(results: Vec<ResultRow>, statistics: QueryStatistics) -> Self {
        Self {
            status: QueryStatus::Complete,
            results,
            statistics: Some(statistics),
        }
    }
}

/// Log group descriptor returned by DescribeLogGroups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogGroupSummary {
    pub log_group_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    /// Creation time (Unix milliseconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_in_days: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_bytes: Option<i64>,
}

impl LogGroupSummary {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            log_group_name: name.into(),
            arn: None,
            creation_time: None,
            retention_in_days: None,
            stored_bytes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(QueryStatus::from_service("Complete"), QueryStatus::Complete);
        assert_eq!(QueryStatus::from_service("Running"), QueryStatus::Running);
        assert_eq!(
            QueryStatus::from_service("Paused"),
            QueryStatus::Other("Paused".to_string())
        );
        assert_eq!(QueryStatus::from_service("Paused").as_str(), "Paused");
    }

    #[test]
    fn test_status_classification() {
        assert!(QueryStatus::Complete.is_complete());
        assert!(!QueryStatus::Running.is_complete());
        assert!(QueryStatus::Cancelled.is_failed());
        assert!(QueryStatus::Timeout.is_failed());
        assert!(!QueryStatus::Scheduled.is_failed());
        assert!(!QueryStatus::Unknown.is_failed());
    }

    #[test]
    fn test_row_to_map_last_value_wins() {
        let row = vec![
            ResultField::new("@message", "first"),
            ResultField::new("@timestamp", "2020-08-16 00:00:00.000"),
            ResultField::new("@message", "second"),
        ];

        let map = row_to_map(&row);

        assert_eq!(map.len(), 2);
        assert_eq!(map["@message"], "second");
        assert_eq!(map["@timestamp"], "2020-08-16 00:00:00.000");
    }

    #[test]
    fn test_log_group_summary_serialization_skips_missing() {
        let json = serde_json::to_string(&LogGroupSummary::named("/aws/lambda/fn")).unwrap();
        assert_eq!(json, r#"{"LogGroupName":"/aws/lambda/fn"}"#);
    }
}
