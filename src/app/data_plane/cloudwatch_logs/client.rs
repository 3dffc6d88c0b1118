//! CloudWatch Logs Insights Client Wrapper
//!
//! [`LogsInsightsApi`] is the seam between the query logic and the remote
//! service. [`CloudWatchLogsClient`] implements it on top of the AWS SDK; tests
//! implement it with in-memory fakes.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudwatchlogs as cloudwatchlogs;
use aws_types::region::Region;
use tracing::debug;

use super::types::{
    LogGroupSummary, QueryResultsPage, QueryStatistics, QueryStatus, ResultField, ResultRow,
    StartQueryRequest,
};

/// The three remote operations this tool consumes
#[async_trait]
pub trait LogsInsightsApi: Send + Sync {
    /// Submit a query and return its query id, empty if the service sent none
    async fn start_query(&self, request: &StartQueryRequest) -> Result<String>;

    /// Fetch the current status (and results, once complete) of a query
    async fn get_query_results(&self, query_id: &str) -> Result<QueryResultsPage>;

    /// Describe log groups, optionally filtered by name prefix.
    ///
    /// Returns the first page only.
    async fn describe_log_groups(&self, prefix: Option<&str>) -> Result<Vec<LogGroupSummary>>;
}

/// Where the AWS SDK config comes from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsConnection {
    /// Region override; the SDK default chain is used when absent
    pub region: Option<String>,
    /// Named profile override; the SDK default chain is used when absent
    pub profile: Option<String>,
}

/// CloudWatch Logs client wrapper
#[derive(Clone, Debug)]
pub struct CloudWatchLogsClient {
    client: cloudwatchlogs::Client,
}

impl CloudWatchLogsClient {
    /// Wrap an already-configured SDK client
    pub fn new(client: cloudwatchlogs::Client) -> Self {
        Self { client }
    }

    /// Load AWS config once and build the client every component shares
    pub async fn connect(connection: &AwsConnection) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(profile) = &connection.profile {
            loader = loader.profile_name(profile);
        }

        if let Some(region) = &connection.region {
            loader = loader.region(Region::new(region.clone()));
        }

        let config = loader.load().await;
        debug!(
            "Created CloudWatch Logs client for region {:?}",
            config.region().map(|r| r.as_ref().to_string())
        );

        Self::new(cloudwatchlogs::Client::new(&config))
    }
}

#[async_trait]
impl LogsInsightsApi for CloudWatchLogsClient {
    async fn start_query(&self, request: &StartQueryRequest) -> Result<String> {
        let response = self
            .client
            .start_query()
            .log_group_name(&request.log_group_name)
            .query_string(&request.query_string)
            .start_time(request.start_time)
            .end_time(request.end_time)
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to start query for log group: {}",
                    request.log_group_name
                )
            })?;

        if response.query_id.is_none() {
            debug!(
                "StartQuery returned no query id for log group: {}",
                request.log_group_name
            );
        }

        Ok(response.query_id.unwrap_or_default())
    }

    async fn get_query_results(&self, query_id: &str) -> Result<QueryResultsPage> {
        let response = self
            .client
            .get_query_results()
            .query_id(query_id)
            .send()
            .await
            .with_context(|| format!("Failed to get results for query: {}", query_id))?;

        let status = response
            .status
            .as_ref()
            .map(|s| QueryStatus::from_service(s.as_str()))
            .unwrap_or(QueryStatus::Unknown);

        // Convert response to our types
        let results: Vec<ResultRow> = response
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| {
                        ResultField::new(
                            cell.field.unwrap_or_default(),
                            cell.value.unwrap_or_default(),
                        )
                    })
                    .collect()
            })
            .collect();

        let statistics = response.statistics.map(|stats| {
            QueryStatistics::new(stats.records_matched, stats.records_scanned, stats.bytes_scanned)
        });

        Ok(QueryResultsPage {
            status,
            results,
            statistics,
        })
    }

    async fn describe_log_groups(&self, prefix: Option<&str>) -> Result<Vec<LogGroupSummary>> {
        let mut request = self.client.describe_log_groups();

        if let Some(prefix) = prefix {
            request = request.log_group_name_prefix(prefix);
        }

        let response = request
            .send()
            .await
            .with_context(|| "Failed to list log groups")?;

        let mut log_groups = Vec::new();

        if let Some(groups) = response.log_groups {
            for group in groups {
                if let Some(name) = group.log_group_name {
                    log_groups.push(LogGroupSummary {
                        log_group_name: name,
                        arn: group.arn,
                        creation_time: group.creation_time,
                        retention_in_days: group.retention_in_days,
                        stored_bytes: group.stored_bytes,
                    });
                }
            }
        }

        Ok(log_groups)
    }
}
