//! In-memory Logs Insights service shared by the integration tests.

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cwinsight::app::data_plane::cloudwatch_logs::types::{
    LogGroupSummary, QueryResultsPage, QueryStatistics, QueryStatus, ResultField,
    StartQueryRequest,
};
use cwinsight::app::data_plane::cloudwatch_logs::LogsInsightsApi;
use cwinsight::app::time_window::{parse_time, TimeWindow};

/// How the fake answers for one log group
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Completes on the first poll with one row naming the log group
    Complete,
    /// Stays Running for `delay`, then completes
    CompleteAfter(Duration),
    /// StartQuery fails with this message
    FailStart(String),
    /// Every poll returns this status
    Status(QueryStatus),
}

#[derive(Default)]
pub struct FakeLogsApi {
    behaviors: HashMap<String, Behavior>,
    log_groups: Vec<LogGroupSummary>,
    started: Mutex<Vec<StartQueryRequest>>,
    queries: Mutex<HashMap<String, String>>,
    polls: Mutex<usize>,
}

impl FakeLogsApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, log_group: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(log_group.to_string(), behavior);
        self
    }

    pub fn with_log_groups(mut self, names: &[&str]) -> Self {
        self.log_groups = names.iter().copied().map(LogGroupSummary::named).collect();
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Log groups StartQuery was called for, in call order
    pub fn started_groups(&self) -> Vec<String> {
        self.started
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.log_group_name.clone())
            .collect()
    }

    pub fn started_requests(&self) -> Vec<StartQueryRequest> {
        self.started.lock().unwrap().clone()
    }

    /// StartQuery plus GetQueryResults calls
    pub fn remote_calls(&self) -> usize {
        self.started.lock().unwrap().len() + *self.polls.lock().unwrap()
    }

    fn behavior(&self, log_group: &str) -> Behavior {
        self.behaviors
            .get(log_group)
            .cloned()
            .unwrap_or(Behavior::Complete)
    }
}

#[async_trait]
impl LogsInsightsApi for FakeLogsApi {
    async fn start_query(&self, request: &StartQueryRequest) -> Result<String> {
        let query_id = {
            let mut started = self.started.lock().unwrap();
            started.push(request.clone());
            format!("query-{}", started.len())
        };

        if let Behavior::FailStart(message) = self.behavior(&request.log_group_name) {
            return Err(anyhow!(message));
        }

        self.queries
            .lock()
            .unwrap()
            .insert(query_id.clone(), request.log_group_name.clone());
        Ok(query_id)
    }

    async fn get_query_results(&self, query_id: &str) -> Result<QueryResultsPage> {
        *self.polls.lock().unwrap() += 1;

        let log_group = self
            .queries
            .lock()
            .unwrap()
            .get(query_id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown query id {}", query_id))?;

        match self.behavior(&log_group) {
            Behavior::Complete => Ok(complete_page(&log_group)),
            Behavior::CompleteAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(complete_page(&log_group))
            }
            Behavior::Status(status) => Ok(QueryResultsPage::pending(status)),
            Behavior::FailStart(_) => Err(anyhow!("polled a query that never started")),
        }
    }

    async fn describe_log_groups(&self, prefix: Option<&str>) -> Result<Vec<LogGroupSummary>> {
        Ok(self
            .log_groups
            .iter()
            .filter(|group| prefix.map_or(true, |p| group.log_group_name.starts_with(p)))
            .cloned()
            .collect())
    }
}

pub fn complete_page(log_group: &str) -> QueryResultsPage {
    QueryResultsPage::complete(
        vec![vec![
            ResultField::new("@logStream", log_group),
            ResultField::new("@message", "hello"),
        ]],
        QueryStatistics::new(1.0, 4.0, 128.0),
    )
}

/// `2020-08-16T00:00:00Z` plus `length`
pub fn window_of(length: Duration) -> TimeWindow {
    let start = parse_time("2020-08-16T00:00:00Z").unwrap();
    let end = start + chrono::Duration::from_std(length).unwrap();
    TimeWindow::new(start, end)
}

pub fn hours(n: u64) -> Duration {
    Duration::from_secs(n * 3600)
}

pub fn targets(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}
