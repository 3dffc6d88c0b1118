//! cwinsight - CloudWatch Logs Insights queries from the command line
//!
//! Runs one Logs Insights query against a single log group, or against a
//! whole list of log groups at once, and prints the results as one JSON
//! document.
//!
//! # Architecture Overview
//!
//! - **Integration Layer** ([`app::data_plane::cloudwatch_logs`]): the
//!   [`app::data_plane::cloudwatch_logs::LogsInsightsApi`] trait, its AWS SDK
//!   implementation, and the poll loop that drives one query to completion
//! - **Orchestration** ([`app::bulk`]): the duration quota check and the
//!   fan-out of one task per log group, collected over a channel
//! - **Presentation** ([`app::output`]): the `StartTime`/`EndTime`/`ResultSet`
//!   envelope in normalized or raw form
//! - **Command Line** ([`app::cli`], [`app::config`], [`app::commands`])
//!
//! ## Bulk runs
//!
//! A bulk run is checked against the duration quota before anything is sent:
//! the window length times the number of log groups must not exceed the
//! ceiling (three days by default). Every log group then gets its own query.
//! A failing log group is recorded in the envelope and the run continues; the
//! process exits with status 2 when any log group failed.

#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
