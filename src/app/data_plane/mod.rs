//! Data Plane Services Module
//!
//! AWS data plane integrations: services that query data held inside AWS
//! resources, as opposed to control plane resource management.
//!
//! ## Available Services
//!
//! - **CloudWatch Logs**: Logs Insights queries over one or many log groups,
//!   plus log group discovery

pub mod cloudwatch_logs;

pub use cloudwatch_logs::{CloudWatchLogsClient, LogsInsightsApi, QueryExecutor};
