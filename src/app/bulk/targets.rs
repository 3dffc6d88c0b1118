//! Reading the bulk target list.

use std::io::Read;

use crate::app::errors::{CwInsightError, Result};

/// Split target text into one target per line.
///
/// Whitespace around the whole input is dropped first, so a trailing newline
/// does not produce a target. Each line is then trimmed. Blank lines inside
/// the list are kept as empty targets and will be dispatched like any other.
pub fn parse_targets(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n').map(|line| line.trim().to_string()).collect()
}

/// Read a whole target source and parse it
pub fn read_targets<R: Read>(mut source: R, source_name: &str) -> Result<Vec<String>> {
    let mut text = String::new();
    source
        .read_to_string(&mut text)
        .map_err(|source| CwInsightError::TargetSource {
            source_name: source_name.to_string(),
            source,
        })?;
    Ok(parse_targets(&text))
}
