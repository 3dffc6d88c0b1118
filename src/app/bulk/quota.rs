//! Pre-flight duration quota.
//!
//! Every target is charged the full window, so a batch requests
//! `window * targets` of query time. That is an upper bound, not the cost the
//! service will actually bill.

use std::time::Duration;
use thiserror::Error;

use crate::app::time_window::{iso8601_utc, TimeWindow};

/// Default ceiling on requested query time per run
pub const DEFAULT_QUOTA_CEILING: Duration = Duration::from_secs(3 * 24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuotaRejection {
    #[error("time window is empty or inverted (start {start}, end {end})")]
    EmptyWindow { start: String, end: String },
    #[error(
        "requested {} ({} x {} targets) exceeds quota of {}",
        human(.requested),
        human(.window),
        .targets,
        human(.ceiling)
    )]
    Exceeded {
        requested: Duration,
        window: Duration,
        targets: usize,
        ceiling: Duration,
    },
}

fn human(duration: &Duration) -> humantime::FormattedDuration {
    humantime::format_duration(*duration)
}

/// A batch the guard let through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaApproval {
    pub window: Duration,
    pub requested: Duration,
}

/// Check a planned batch against the ceiling.
///
/// Rejects when the window is not strictly positive or when
/// `window * target_count > ceiling`. Exactly reaching the ceiling passes.
pub fn check(
    window: &TimeWindow,
    target_count: usize,
    ceiling: Duration,
) -> Result<QuotaApproval, QuotaRejection> {
    let span = window.duration();
    if span <= chrono::Duration::zero() {
        return Err(QuotaRejection::EmptyWindow {
            start: iso8601_utc(&window.start()),
            end: iso8601_utc(&window.end()),
        });
    }

    let window_ms = u128::try_from(span.num_milliseconds()).unwrap_or(0);
    let requested_ms = window_ms.saturating_mul(target_count as u128);
    let window = Duration::from_millis(u64::try_from(window_ms).unwrap_or(u64::MAX));
    let requested = Duration::from_millis(u64::try_from(requested_ms).unwrap_or(u64::MAX));

    if requested_ms > ceiling.as_millis() {
        return Err(QuotaRejection::Exceeded {
            requested,
            window,
            targets: target_count,
            ceiling,
        });
    }

    Ok(QuotaApproval { window, requested })
}
