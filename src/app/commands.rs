//! The `query`, `bulk`, `list` and `version` commands.
//!
//! Each command writes its document to `out` and reports failures as
//! [`CwInsightError`]; the binary decides what reaches stdout and stderr.

use std::io::{Read, Write};
use std::sync::Arc;
use tracing::{error, info};

use crate::app::bulk::{check_quota, BulkOrchestrator, BulkRequest};
use crate::app::config::Settings;
use crate::app::data_plane::cloudwatch_logs::{LogsInsightsApi, QueryExecutor, RemoteError};
use crate::app::errors::{CwInsightError, Result};
use crate::app::log_groups::{format_names, pick_log_group};
use crate::app::output::{OutputEnvelope, ResponseView};
use crate::app::time_window::{iso8601_utc, TimeWindow};

/// How the `query` command names its log group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogGroupSelector {
    Name(String),
    /// Best fuzzy match among the account's log groups
    Pick(String),
}

/// Build the executor every command shares from resolved settings
pub fn executor_for(api: Arc<dyn LogsInsightsApi>, settings: &Settings) -> QueryExecutor {
    QueryExecutor::new(api)
        .with_poll_interval(settings.poll_interval)
        .with_poll_timeout(settings.poll_timeout)
}

/// Resolve the log group the `query` command runs against
pub async fn resolve_log_group(
    api: &dyn LogsInsightsApi,
    selector: &LogGroupSelector,
) -> Result<String> {
    match selector {
        LogGroupSelector::Name(name) => Ok(name.clone()),
        LogGroupSelector::Pick(pattern) => {
            let groups = api
                .describe_log_groups(None)
                .await
                .map_err(|e| RemoteError::from_anyhow("DescribeLogGroups", &e))?;
            let picked = pick_log_group(&groups, pattern).ok_or_else(|| {
                CwInsightError::config(format!("no log group matches '{}'", pattern))
            })?;
            info!("Picked log group '{}' for '{}'", picked.log_group_name, pattern);
            Ok(picked.log_group_name.clone())
        }
    }
}

/// Run one query against one log group and write its response
pub async fn run_query<W: Write>(
    settings: &Settings,
    executor: &QueryExecutor,
    selector: &LogGroupSelector,
    window: &TimeWindow,
    out: &mut W,
) -> Result<()> {
    let query = settings.require_query_string()?;
    let log_group = resolve_log_group(executor.api().as_ref(), selector).await?;

    log_window(&log_group, query, window);
    check_quota(window, 1, settings.duration_quota)?;

    let outcome = executor.execute(query, &log_group, window).await;
    let success = outcome
        .into_result()
        .map_err(|source| CwInsightError::Query { log_group, source })?;

    let json = serde_json::to_string(&ResponseView::success(&success, settings.output_mode))?;
    writeln!(out, "{}", json).map_err(CwInsightError::Output)?;
    Ok(())
}

/// Run the bulk command: query every target read from `source`, write the
/// envelope, and fail with [`CwInsightError::TargetsFailed`] if any target
/// failed (after the envelope is written).
pub async fn run_bulk<R: Read, W: Write>(
    settings: &Settings,
    executor: &QueryExecutor,
    window: &TimeWindow,
    source: R,
    source_name: &str,
    out: &mut W,
) -> Result<OutputEnvelope> {
    let query = settings.require_query_string()?;
    let request = BulkRequest::new(query, *window, settings.duration_quota)
        .with_max_concurrency(settings.max_concurrency);

    info!(
        "Bulk query over [{}, {}) with quota {}",
        iso8601_utc(&window.start()),
        iso8601_utc(&window.end()),
        humantime::format_duration(settings.duration_quota)
    );

    let envelope = BulkOrchestrator::new(executor.clone())
        .run_from_source(&request, source, source_name)
        .await?;

    let json = envelope.to_json(settings.output_mode)?;
    writeln!(out, "{}", json).map_err(CwInsightError::Output)?;

    let failed = envelope.failure_count();
    if failed > 0 {
        for record in envelope.failures() {
            if let Some(e) = record.error() {
                error!("Log group '{}' failed: {}", record.target, e);
            }
        }
        return Err(CwInsightError::TargetsFailed {
            failed,
            total: envelope.records().len(),
        });
    }

    Ok(envelope)
}

/// List log group names, or full descriptors as JSON
pub async fn run_list<W: Write>(
    api: &dyn LogsInsightsApi,
    prefix: Option<&str>,
    full: bool,
    out: &mut W,
) -> Result<()> {
    let groups = api
        .describe_log_groups(prefix)
        .await
        .map_err(|e| RemoteError::from_anyhow("DescribeLogGroups", &e))?;

    if full {
        let json = serde_json::to_string(&groups)?;
        writeln!(out, "{}", json).map_err(CwInsightError::Output)?;
    } else {
        out.write_all(format_names(&groups).as_bytes())
            .map_err(CwInsightError::Output)?;
    }
    Ok(())
}

/// Print the package version, plus the git commit with `full`
pub fn run_version<W: Write>(full: bool, out: &mut W) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let line = if full {
        format!("{} ({} {})", version, env!("GIT_COMMIT"), env!("GIT_BRANCH"))
    } else {
        version.to_string()
    };
    writeln!(out, "{}", line).map_err(CwInsightError::Output)
}

fn log_window(log_group: &str, query: &str, window: &TimeWindow) {
    info!("group-name: {}", log_group);
    info!("query-string: {}", query);
    info!("start: {}", iso8601_utc(&window.start()));
    info!("end: {}", iso8601_utc(&window.end()));
    info!("duration: {}", window.duration());
}
