//! Query records, the bulk output envelope, and their JSON rendering.
//!
//! The JSON field names follow the AWS response shapes (`PascalCase`), so a
//! raw response reads like the service's own payload.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::app::data_plane::cloudwatch_logs::types::{row_to_map, QueryStatistics, ResultRow};
use crate::app::data_plane::cloudwatch_logs::{QueryError, QueryOutcome, QuerySuccess};
use crate::app::time_window::{serialize_iso8601_utc, TimeWindow};

/// How a successful response is rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// One `{field: value}` object per row
    #[default]
    Normalized,
    /// Rows as `[{"Field", "Value"}]` lists, plus the query status
    Raw,
}

impl OutputMode {
    pub fn from_raw_flag(raw: bool) -> Self {
        if raw {
            Self::Raw
        } else {
            Self::Normalized
        }
    }
}

/// The outcome of querying one target
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRecord {
    pub target: String,
    pub outcome: QueryOutcome,
}

impl QueryRecord {
    pub fn new(target: impl Into<String>, outcome: QueryOutcome) -> Self {
        Self {
            target: target.into(),
            outcome,
        }
    }

    pub fn error(&self) -> Option<&QueryError> {
        match &self.outcome {
            QueryOutcome::Failure(error) => Some(error),
            QueryOutcome::Success(_) => None,
        }
    }
}

/// The single document a bulk run produces.
///
/// Records are in completion order. Consumers that need input order sort by
/// target themselves, or use [`OutputEnvelope::sorted_by_target`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutputEnvelope {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    records: Vec<QueryRecord>,
}

impl OutputEnvelope {
    pub fn new(window: &TimeWindow, records: Vec<QueryRecord>) -> Self {
        Self {
            start_time: window.start(),
            end_time: window.end(),
            records,
        }
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn records(&self) -> &[QueryRecord] {
        &self.records
    }

    pub fn failures(&self) -> impl Iterator<Item = &QueryRecord> {
        self.records.iter().filter(|r| !r.outcome.is_success())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Same envelope with records ordered by target name (stable for duplicates)
    pub fn sorted_by_target(mut self) -> Self {
        self.records.sort_by(|a, b| a.target.cmp(&b.target));
        self
    }

    pub fn render(&self, mode: OutputMode) -> EnvelopeView<'_> {
        EnvelopeView {
            start_time: self.start_time,
            end_time: self.end_time,
            result_set: self
                .records
                .iter()
                .map(|record| RecordView {
                    group_name: &record.target,
                    response: ResponseView::of(&record.outcome, mode),
                })
                .collect(),
        }
    }

    pub fn to_json(&self, mode: OutputMode) -> serde_json::Result<String> {
        serde_json::to_string(&self.render(mode))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EnvelopeView<'a> {
    #[serde(serialize_with = "serialize_iso8601_utc")]
    pub start_time: DateTime<Utc>,
    #[serde(serialize_with = "serialize_iso8601_utc")]
    pub end_time: DateTime<Utc>,
    pub result_set: Vec<RecordView<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecordView<'a> {
    pub group_name: &'a str,
    pub response: ResponseView<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ResponseView<'a> {
    Normalized(NormalizedResponse<'a>),
    Raw(RawResponse<'a>),
    Failure(FailureResponse),
}

impl<'a> ResponseView<'a> {
    pub fn of(outcome: &'a QueryOutcome, mode: OutputMode) -> Self {
        match outcome {
            QueryOutcome::Success(success) => Self::success(success, mode),
            QueryOutcome::Failure(error) => Self::Failure(FailureResponse {
                error: error.to_string(),
                error_kind: error.kind_label(),
            }),
        }
    }

    pub fn success(success: &'a QuerySuccess, mode: OutputMode) -> Self {
        match mode {
            OutputMode::Normalized => Self::Normalized(NormalizedResponse {
                results: success.rows.iter().map(|row| row_to_map(row)).collect(),
                statistics: &success.statistics,
                query_id: &success.query_id,
            }),
            OutputMode::Raw => Self::Raw(RawResponse {
                results: &success.rows,
                statistics: &success.statistics,
                status: success.status.as_str(),
                query_id: &success.query_id,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NormalizedResponse<'a> {
    pub results: Vec<BTreeMap<String, String>>,
    pub statistics: &'a QueryStatistics,
    pub query_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawResponse<'a> {
    pub results: &'a [ResultRow],
    pub statistics: &'a QueryStatistics,
    pub status: &'a str,
    pub query_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FailureResponse {
    pub error: String,
    pub error_kind: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::data_plane::cloudwatch_logs::types::ResultField;
    use crate::app::data_plane::cloudwatch_logs::QueryStatus;
    use crate::app::time_window::parse_time;
    use insta::assert_json_snapshot;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn window() -> TimeWindow {
        TimeWindow::new(
            parse_time("2020-08-16T00:00:00Z").unwrap(),
            parse_time("2020-08-16T01:00:00Z").unwrap(),
        )
    }

    fn success(query_id: &str) -> QueryOutcome {
        QueryOutcome::Success(QuerySuccess {
            query_id: query_id.to_string(),
            status: QueryStatus::Complete,
            rows: vec![vec![
                ResultField::new("@timestamp", "2020-08-16 00:10:00.000"),
                ResultField::new("@message", "hello"),
            ]],
            statistics: QueryStatistics::new(1.0, 10.0, 512.0),
        })
    }

    fn failure() -> QueryOutcome {
        QueryOutcome::Failure(QueryError::TerminalStatus {
            query_id: "q-9".to_string(),
            status: QueryStatus::Failed,
        })
    }

    #[test]
    fn test_normalized_envelope() {
        let envelope = OutputEnvelope::new(
            &window(),
            vec![QueryRecord::new("group-a", success("q-1"))],
        );

        let value = serde_json::to_value(envelope.render(OutputMode::Normalized)).unwrap();

        assert_eq!(
            value,
            json!({
                "StartTime": "2020-08-16T00:00:00Z",
                "EndTime": "2020-08-16T01:00:00Z",
                "ResultSet": [{
                    "GroupName": "group-a",
                    "Response": {
                        "Results": [{
                            "@message": "hello",
                            "@timestamp": "2020-08-16 00:10:00.000"
                        }],
                        "Statistics": {
                            "RecordsMatched": 1.0,
                            "RecordsScanned": 10.0,
                            "BytesScanned": 512.0
                        },
                        "QueryId": "q-1"
                    }
                }]
            })
        );
    }

    #[test]
    fn test_raw_response() {
        let outcome = success("q-1");
        let value = serde_json::to_value(ResponseView::of(&outcome, OutputMode::Raw)).unwrap();

        assert_eq!(
            value,
            json!({
                "Results": [[
                    {"Field": "@timestamp", "Value": "2020-08-16 00:10:00.000"},
                    {"Field": "@message", "Value": "hello"}
                ]],
                "Statistics": {
                    "RecordsMatched": 1.0,
                    "RecordsScanned": 10.0,
                    "BytesScanned": 512.0
                },
                "Status": "Complete",
                "QueryId": "q-1"
            })
        );
    }

    #[test]
    fn test_failure_record_snapshot() {
        let envelope = OutputEnvelope::new(&window(), vec![QueryRecord::new("group-b", failure())]);

        assert_json_snapshot!(envelope.render(OutputMode::Raw), @r###"
        {
          "StartTime": "2020-08-16T00:00:00Z",
          "EndTime": "2020-08-16T01:00:00Z",
          "ResultSet": [
            {
              "GroupName": "group-b",
              "Response": {
                "Error": "query q-9 ended with status Failed",
                "ErrorKind": "query-failed"
              }
            }
          ]
        }
        "###);
    }

    #[test]
    fn test_failures_and_sorting() {
        let envelope = OutputEnvelope::new(
            &window(),
            vec![
                QueryRecord::new("group-c", success("q-3")),
                QueryRecord::new("group-a", failure()),
                QueryRecord::new("group-b", success("q-2")),
            ],
        );

        assert_eq!(envelope.failure_count(), 1);
        assert_eq!(envelope.failures().next().unwrap().target, "group-a");

        let sorted = envelope.sorted_by_target();
        let targets: Vec<&str> = sorted.records().iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["group-a", "group-b", "group-c"]);
    }

    #[test]
    fn test_empty_results_render_as_empty_list() {
        let outcome = QueryOutcome::Success(QuerySuccess {
            query_id: "q-0".to_string(),
            status: QueryStatus::Complete,
            rows: Vec::new(),
            statistics: QueryStatistics::default(),
        });

        let json = serde_json::to_string(&ResponseView::of(&outcome, OutputMode::Normalized)).unwrap();

        assert_eq!(
            json,
            r#"{"Results":[],"Statistics":{"RecordsMatched":0.0,"RecordsScanned":0.0,"BytesScanned":0.0},"QueryId":"q-0"}"#
        );
    }
}
