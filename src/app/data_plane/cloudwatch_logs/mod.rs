//! CloudWatch Logs Insights Integration Module
//!
//! Provides the remote side of the tool: the service seam, its AWS SDK
//! implementation, and the executor that drives one query to completion.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cwinsight::app::data_plane::cloudwatch_logs::{
//!     AwsConnection, CloudWatchLogsClient, QueryExecutor,
//! };
//! use cwinsight::app::time_window::TimeWindow;
//! use std::sync::Arc;
//!
//! # async fn example(window: TimeWindow) {
//! let client = CloudWatchLogsClient::connect(&AwsConnection::default()).await;
//! let executor = QueryExecutor::new(Arc::new(client));
//!
//! let outcome = executor
//!     .execute("fields @timestamp, @message", "/aws/lambda/my-function", &window)
//!     .await;
//! # }
//! ```

#![warn(clippy::all, rust_2018_idioms)]

pub mod client;
pub mod executor;
pub mod sdk_errors;
pub mod types;

// Re-export commonly used types
pub use client::{AwsConnection, CloudWatchLogsClient, LogsInsightsApi};
pub use executor::{QueryError, QueryExecutor, QueryOutcome, QuerySuccess, DEFAULT_POLL_INTERVAL};
pub use sdk_errors::{RemoteError, RemoteErrorKind};
pub use types::{
    LogGroupSummary, QueryResultsPage, QueryStatistics, QueryStatus, ResultField, ResultRow,
    StartQueryRequest,
};
