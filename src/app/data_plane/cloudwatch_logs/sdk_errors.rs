//! Categorisation of CloudWatch Logs SDK failures.
//!
//! Remote failures are never retried here. The category only makes the
//! diagnostic (and the `ErrorKind` of a failed record) say what went wrong:
//! throttling, a timeout, the network, the service itself, or the request.

use serde::Serialize;
use std::fmt;

/// Broad class of a failed remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RemoteErrorKind {
    /// Request was throttled due to rate limiting
    Throttled,
    /// Request timed out
    Timeout,
    /// Network connectivity issues
    Network,
    /// Service-side transient failure
    Unavailable,
    /// Permissions
    AccessDenied,
    /// Anything else: validation, unknown log group, malformed query
    Request,
}

impl RemoteErrorKind {
    /// Short label for compact display
    pub fn label(&self) -> &'static str {
        match self {
            Self::Throttled => "throttled",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Unavailable => "unavailable",
            Self::AccessDenied => "access-denied",
            Self::Request => "error",
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A categorised remote failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub operation: &'static str,
    pub kind: RemoteErrorKind,
    pub code: Option<String>,
    pub message: String,
}

impl RemoteError {
    /// Categorise an error returned by the client wrapper.
    ///
    /// The alternate format walks the whole context chain, which is where the
    /// SDK puts the service error code.
    pub fn from_anyhow(operation: &'static str, error: &anyhow::Error) -> Self {
        Self::from_message(operation, &format!("{:#}", error))
    }

    pub fn from_message(operation: &'static str, message: &str) -> Self {
        Self {
            operation,
            kind: categorize(message),
            code: extract_error_code(message),
            message: truncate_message(message, 300),
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed ({}): {}", self.operation, self.kind, self.message)
    }
}

/// Classify an error message using the patterns the AWS SDK produces
pub fn categorize(error_str: &str) -> RemoteErrorKind {
    const THROTTLED: &[&str] = &[
        "ThrottlingException",
        "Throttling",
        "TooManyRequestsException",
        "LimitExceededException",
        "RateExceeded",
    ];
    const TIMEOUT: &[&str] = &["TimeoutError", "timed out", "timeout", "deadline exceeded"];
    const NETWORK: &[&str] = &[
        "DispatchFailure",
        "dispatch failure",
        "connection",
        "Connection",
        "DNS",
        "socket",
    ];
    const UNAVAILABLE: &[&str] = &[
        "ServiceUnavailable",
        "Service Unavailable",
        "InternalServerError",
        "InternalServerException",
        "ServiceUnavailableException",
    ];
    const ACCESS_DENIED: &[&str] = &[
        "AccessDenied",
        "UnauthorizedOperation",
        "UnrecognizedClientException",
        "InvalidClientTokenId",
        "ExpiredToken",
        "SignatureDoesNotMatch",
    ];

    let contains_any = |patterns: &[&str]| patterns.iter().any(|p| error_str.contains(p));

    if contains_any(THROTTLED) {
        RemoteErrorKind::Throttled
    } else if contains_any(TIMEOUT) {
        RemoteErrorKind::Timeout
    } else if contains_any(NETWORK) {
        RemoteErrorKind::Network
    } else if contains_any(UNAVAILABLE) {
        RemoteErrorKind::Unavailable
    } else if contains_any(ACCESS_DENIED) {
        RemoteErrorKind::AccessDenied
    } else {
        RemoteErrorKind::Request
    }
}

/// Pull an AWS error code such as `ResourceNotFoundException` out of a message
fn extract_error_code(error_str: &str) -> Option<String> {
    error_str
        .split(|c: char| !c.is_ascii_alphanumeric())
        .find(|word| {
            word.len() < 50
                && word.ends_with("Exception")
                && word.chars().next().is_some_and(|c| c.is_ascii_uppercase())
        })
        .map(str::to_string)
}

/// Truncate a message to max length on a char boundary, adding ellipsis if truncated
fn truncate_message(msg: &str, max_len: usize) -> String {
    if msg.len() <= max_len {
        return msg.to_string();
    }
    let mut end = max_len.saturating_sub(3);
    while !msg.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &msg[..end])
}
