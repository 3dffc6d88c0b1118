//! Core application modules for cwinsight.
//!
//! # Module Organization
//!
//! ## AWS Integration
//! - [`data_plane`] - CloudWatch Logs Insights client and single-query executor
//!
//! ## Query Orchestration
//! - [`bulk`] - Target parsing, the duration quota, and concurrent fan-out
//! - [`time_window`] - Time parsing and the query window
//! - [`output`] - Records and the JSON envelope
//! - [`log_groups`] - Log group listing and fuzzy selection
//!
//! ## Command Line
//! - [`cli`] - clap definitions
//! - [`config`] - Flag, environment, and file configuration layers
//! - [`commands`] - The subcommands, written against any [`std::io::Write`]
//! - [`errors`] - Crate error type and exit statuses
//! - [`logging`] - tracing subscriber setup

pub mod bulk;
pub mod cli;
pub mod commands;
pub mod config;
pub mod data_plane;
pub mod errors;
pub mod log_groups;
pub mod logging;
pub mod output;
pub mod time_window;

pub use errors::{CwInsightError, Result};
