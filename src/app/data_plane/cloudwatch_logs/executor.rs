//! Runs one Logs Insights query end to end: StartQuery, then GetQueryResults
//! on a fixed interval until the query completes.

#![warn(clippy::all, rust_2018_idioms)]

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::app::time_window::TimeWindow;

use super::client::LogsInsightsApi;
use super::sdk_errors::RemoteError;
use super::types::{QueryStatistics, QueryStatus, ResultRow, StartQueryRequest};

/// Interval between two GetQueryResults calls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Why a single query produced no results
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("{0}")]
    StartQuery(RemoteError),
    #[error("StartQuery for {log_group} returned no query id")]
    MissingQueryId { log_group: String },
    #[error("{0}")]
    Poll(RemoteError),
    #[error("query {query_id} ended with status {status}")]
    TerminalStatus { query_id: String, status: QueryStatus },
    #[error("query {query_id} still {status} after {}", human(.waited))]
    PollTimeout {
        query_id: String,
        status: QueryStatus,
        waited: Duration,
    },
}

fn human(duration: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*duration)
}

impl QueryError {
    /// Short label for the `ErrorKind` of a failed record
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::StartQuery(remote) | Self::Poll(remote) => remote.kind.label(),
            Self::MissingQueryId { .. } => "malformed-response",
            Self::TerminalStatus { .. } => "query-failed",
            Self::PollTimeout { .. } => "poll-timeout",
        }
    }
}

/// Results of a completed query
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySuccess {
    pub query_id: String,
    pub status: QueryStatus,
    pub rows: Vec<ResultRow>,
    pub statistics: QueryStatistics,
}

/// What one query against one target came to
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Success(QuerySuccess),
    Failure(QueryError),
}

impl QueryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_result(self) -> Result<QuerySuccess, QueryError> {
        match self {
            Self::Success(success) => Ok(success),
            Self::Failure(error) => Err(error),
        }
    }
}

/// Drives single queries against the shared client.
///
/// Cheap to clone; every clone shares the same client handle.
#[derive(Clone)]
pub struct QueryExecutor {
    api: Arc<dyn LogsInsightsApi>,
    poll_interval: Duration,
    poll_timeout: Option<Duration>,
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("poll_interval", &self.poll_interval)
            .field("poll_timeout", &self.poll_timeout)
            .finish_non_exhaustive()
    }
}

impl QueryExecutor {
    /// Executor that polls every second and never gives up on a query
    pub fn new(api: Arc<dyn LogsInsightsApi>) -> Self {
        Self {
            api,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: None,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Stop polling after `timeout` and report the query as failed.
    /// Without this a query that never completes is polled forever.
    pub fn with_poll_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn api(&self) -> &Arc<dyn LogsInsightsApi> {
        &self.api
    }

    /// Submit `query` for `target` over `window` and wait for it to finish.
    ///
    /// Remote failures are not retried; the first one ends the query.
    pub async fn execute(&self, query: &str, target: &str, window: &TimeWindow) -> QueryOutcome {
        match self.run(query, target, window).await {
            Ok(success) => QueryOutcome::Success(success),
            Err(error) => {
                warn!("Query for log group '{}' failed: {}", target, error);
                QueryOutcome::Failure(error)
            }
        }
    }

    async fn run(
        &self,
        query: &str,
        target: &str,
        window: &TimeWindow,
    ) -> Result<QuerySuccess, QueryError> {
        let request = StartQueryRequest {
            log_group_name: target.to_string(),
            query_string: query.to_string(),
            start_time: window.start_unix(),
            end_time: window.end_unix(),
        };

        debug!(
            "Starting query for log group '{}' over [{}, {})",
            target, request.start_time, request.end_time
        );

        let query_id = self
            .api
            .start_query(&request)
            .await
            .map_err(|e| QueryError::StartQuery(RemoteError::from_anyhow("StartQuery", &e)))?;

        if query_id.is_empty() {
            return Err(QueryError::MissingQueryId {
                log_group: target.to_string(),
            });
        }

        info!("Started query {} for log group '{}'", query_id, target);

        let started = Instant::now();
        let mut polls: u64 = 0;

        loop {
            let page = self
                .api
                .get_query_results(&query_id)
                .await
                .map_err(|e| QueryError::Poll(RemoteError::from_anyhow("GetQueryResults", &e)))?;
            polls += 1;

            if page.status.is_complete() {
                info!(
                    "Query {} for log group '{}' complete after {} polls, {} rows",
                    query_id,
                    target,
                    polls,
                    page.results.len()
                );
                return Ok(QuerySuccess {
                    query_id,
                    status: page.status,
                    rows: page.results,
                    statistics: page.statistics.unwrap_or_default(),
                });
            }

            if page.status.is_failed() {
                return Err(QueryError::TerminalStatus {
                    query_id,
                    status: page.status,
                });
            }

            if let Some(timeout) = self.poll_timeout {
                let waited = started.elapsed();
                if waited >= timeout {
                    return Err(QueryError::PollTimeout {
                        query_id,
                        status: page.status,
                        waited,
                    });
                }
            }

            debug!("Query {} is {}, polling again", query_id, page.status);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
