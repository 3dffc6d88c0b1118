//! Fan-out of one query over many log groups.
//!
//! Every target gets its own task. Tasks hand their record to a single
//! collector over a channel; the collector owns the record list and waits for
//! exactly one record per target before building the envelope.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::app::data_plane::cloudwatch_logs::QueryExecutor;
use crate::app::errors::{CwInsightError, Result};
use crate::app::output::{OutputEnvelope, QueryRecord};
use crate::app::time_window::TimeWindow;

use super::quota;
use super::targets::read_targets;

/// Everything a bulk run shares across targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkRequest {
    pub query: String,
    pub window: TimeWindow,
    pub quota_ceiling: Duration,
    /// Upper bound on in-flight queries; `None` dispatches every target at once
    pub max_concurrency: Option<usize>,
}

impl BulkRequest {
    pub fn new(query: impl Into<String>, window: TimeWindow, quota_ceiling: Duration) -> Self {
        Self {
            query: query.into(),
            window,
            quota_ceiling,
            max_concurrency: None,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: Option<usize>) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }
}

#[derive(Debug, Clone)]
pub struct BulkOrchestrator {
    executor: QueryExecutor,
}

impl BulkOrchestrator {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    /// Read targets from `source` and run the batch over them
    pub async fn run_from_source<R: Read>(
        &self,
        request: &BulkRequest,
        source: R,
        source_name: &str,
    ) -> Result<OutputEnvelope> {
        let targets = read_targets(source, source_name)?;
        info!("Read {} targets from {}", targets.len(), source_name);
        self.run(request, targets).await
    }

    /// Check the quota, query every target concurrently, and collect the
    /// records into an envelope.
    ///
    /// Failed targets are recorded, not fatal: the envelope always holds one
    /// record per target. Nothing is dispatched when validation or the quota
    /// check fails.
    pub async fn run(&self, request: &BulkRequest, targets: Vec<String>) -> Result<OutputEnvelope> {
        if request.query.trim().is_empty() {
            return Err(CwInsightError::config("query string is empty"));
        }
        if targets.is_empty() {
            return Err(CwInsightError::config("no targets to query"));
        }
        if request.max_concurrency == Some(0) {
            return Err(CwInsightError::config("max concurrency must be at least 1"));
        }

        let approval = quota::check(&request.window, targets.len(), request.quota_ceiling)?;
        info!(
            "Quota check passed: {} x {} targets = {} of {}",
            humantime::format_duration(approval.window),
            targets.len(),
            humantime::format_duration(approval.requested),
            humantime::format_duration(request.quota_ceiling)
        );

        let records = self.dispatch(request, targets).await?;
        Ok(OutputEnvelope::new(&request.window, records))
    }

    async fn dispatch(&self, request: &BulkRequest, targets: Vec<String>) -> Result<Vec<QueryRecord>> {
        let expected = targets.len();
        // Capacity for every record, so a finished task never waits on the collector
        let (result_sender, mut result_receiver) = mpsc::channel::<QueryRecord>(expected);
        let semaphore = request
            .max_concurrency
            .map(|limit| Arc::new(Semaphore::new(limit)));
        let query: Arc<str> = Arc::from(request.query.as_str());

        info!(
            "Dispatching {} queries (max concurrency: {})",
            expected,
            request
                .max_concurrency
                .map_or_else(|| "unbounded".to_string(), |n| n.to_string())
        );

        for target in targets {
            let executor = self.executor.clone();
            let result_sender = result_sender.clone();
            let semaphore = semaphore.clone();
            let query = query.clone();
            let window = request.window;

            tokio::spawn(async move {
                let _permit = match &semaphore {
                    Some(semaphore) => match semaphore.acquire().await {
                        Ok(permit) => Some(permit),
                        Err(_) => {
                            warn!("Semaphore closed, not querying log group '{}'", target);
                            return;
                        }
                    },
                    None => None,
                };

                let outcome = executor.execute(&query, &target, &window).await;
                if let Err(e) = result_sender.send(QueryRecord::new(target, outcome)).await {
                    warn!("Failed to send query record: {}", e);
                }
            });
        }

        // Only the tasks hold senders now; if they all die the channel closes
        drop(result_sender);

        let mut records = Vec::with_capacity(expected);
        while records.len() < expected {
            match result_receiver.recv().await {
                Some(record) => {
                    records.push(record);
                    debug!("{}/{} queries finished", records.len(), expected);
                }
                None => break,
            }
        }
        result_receiver.close();

        if records.len() != expected {
            return Err(CwInsightError::Collection {
                expected,
                received: records.len(),
            });
        }

        info!("All {} queries finished", expected);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::data_plane::cloudwatch_logs::types::{
        LogGroupSummary, QueryResultsPage, QueryStatistics, StartQueryRequest,
    };
    use crate::app::data_plane::cloudwatch_logs::LogsInsightsApi;
    use crate::app::time_window::parse_time;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Completes every query on its first poll, tracking how many run at once
    #[derive(Default)]
    struct InstantApi {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl LogsInsightsApi for InstantApi {
        async fn start_query(&self, request: &StartQueryRequest) -> anyhow::Result<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            Ok(format!("q-{}", request.log_group_name))
        }

        async fn get_query_results(&self, _query_id: &str) -> anyhow::Result<QueryResultsPage> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(QueryResultsPage::complete(Vec::new(), QueryStatistics::default()))
        }

        async fn describe_log_groups(&self, _prefix: Option<&str>) -> anyhow::Result<Vec<LogGroupSummary>> {
            Ok(Vec::new())
        }
    }

    fn request() -> BulkRequest {
        let end = parse_time("2020-08-16T01:00:00Z").unwrap();
        BulkRequest::new(
            "fields @message",
            TimeWindow::ending_at(end, Duration::from_secs(60)).unwrap(),
            Duration::from_secs(24 * 3600),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_cap_is_respected() {
        let api = Arc::new(InstantApi::default());
        let orchestrator = BulkOrchestrator::new(QueryExecutor::new(api.clone()));
        let targets = (0..10).map(|i| format!("group-{}", i)).collect();

        let envelope = orchestrator
            .run(&request().with_max_concurrency(Some(3)), targets)
            .await
            .unwrap();

        assert_eq!(envelope.records().len(), 10);
        assert!(api.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_dispatch_runs_everything_at_once() {
        let api = Arc::new(InstantApi::default());
        let orchestrator = BulkOrchestrator::new(QueryExecutor::new(api.clone()));
        let targets = (0..10).map(|i| format!("group-{}", i)).collect();

        orchestrator.run(&request(), targets).await.unwrap();

        assert_eq!(api.peak.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_zero_concurrency_rejected() {
        let api = Arc::new(InstantApi::default());
        let orchestrator = BulkOrchestrator::new(QueryExecutor::new(api));

        let error = orchestrator
            .run(&request().with_max_concurrency(Some(0)), vec!["a".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(error, CwInsightError::Config(_)));
    }
}
