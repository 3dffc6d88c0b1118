//! Tracing setup. Diagnostics go to stderr so stdout carries only JSON.

use anyhow::{Context, Result};
use std::io::IsTerminal;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// SDK crates stay quiet unless RUST_LOG asks for them
const SDK_DIRECTIVES: &str =
    "aws_config=warn,aws_sigv4=warn,aws_smithy_runtime=warn,aws_smithy_runtime_api=warn,aws_smithy_http=warn,hyper=warn";

/// Filter directives for `-v` repeated `verbosity` times
pub fn default_directives(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("cwinsight={},{}", level, SDK_DIRECTIVES)
}

/// Install the global subscriber. RUST_LOG, when set, replaces the
/// verbosity-derived filter.
pub fn init_logging(verbosity: u8) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::builder()
            .parse(default_directives(verbosity))
            .context("Failed to parse log filter")?,
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .with_target(false),
    );

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    // Bridge log crate events; must come after the subscriber is set
    tracing_log::LogTracer::init().context("Failed to initialize log-to-tracing bridge")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert!(default_directives(0).starts_with("cwinsight=warn,"));
        assert!(default_directives(1).starts_with("cwinsight=info,"));
        assert!(default_directives(2).starts_with("cwinsight=debug,"));
        assert!(default_directives(7).starts_with("cwinsight=trace,"));
    }

    #[test]
    fn test_directives_parse() {
        for verbosity in 0..4 {
            assert!(EnvFilter::builder()
                .parse(default_directives(verbosity))
                .is_ok());
        }
    }
}
