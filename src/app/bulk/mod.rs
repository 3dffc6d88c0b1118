//! Bulk mode: one query over many log groups.
//!
//! - [`targets`] reads the newline separated log group list
//! - [`quota`] bounds the total query time a batch may request
//! - [`orchestrator`] dispatches one query task per log group and collects
//!   the results into a single [`crate::app::output::OutputEnvelope`]

pub mod orchestrator;
pub mod quota;
pub mod targets;

pub use orchestrator::{BulkOrchestrator, BulkRequest};
pub use quota::{check as check_quota, QuotaApproval, QuotaRejection, DEFAULT_QUOTA_CEILING};
pub use targets::{parse_targets, read_targets};
