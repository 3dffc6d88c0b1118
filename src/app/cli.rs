//! Command line definition.

use chrono::{DateTime, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::app::commands::LogGroupSelector;
use crate::app::config::ConfigOverrides;
use crate::app::time_window::parse_time;

#[derive(Debug, Parser)]
#[command(
    name = "cwinsight",
    version,
    about = "Run CloudWatch Logs Insights queries against one or many log groups"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Logs Insights query to run
    #[arg(long, env = "QUERY_STRING", global = true)]
    pub query_string: Option<String>,

    /// Query the period ending now (or at --end), e.g. "1h" or "2days"
    #[arg(
        long,
        env = "BEFORE",
        global = true,
        value_parser = humantime::parse_duration,
        conflicts_with = "start"
    )]
    pub before: Option<Duration>,

    /// Start of the period, e.g. 2020-08-16T00:00:00+09:00 or 20200816
    #[arg(long, env = "START", global = true, value_parser = parse_time)]
    pub start: Option<DateTime<Utc>>,

    /// End of the period; defaults to now
    #[arg(long, env = "END", global = true, value_parser = parse_time)]
    pub end: Option<DateTime<Utc>>,

    /// Most query time a run may request, summed over targets
    #[arg(
        long,
        env = "DURATION_QUOTA",
        global = true,
        value_parser = humantime::parse_duration
    )]
    pub duration_quota: Option<Duration>,

    /// Emit the service response as is instead of one object per row
    #[arg(long, global = true, overrides_with = "no_raw")]
    pub raw: bool,

    /// Normalized rows even when the config file sets `raw = true`
    #[arg(long, global = true, overrides_with = "raw")]
    pub no_raw: bool,

    /// Most queries in flight at once during a bulk run
    #[arg(long, global = true)]
    pub max_concurrency: Option<usize>,

    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    pub poll_interval: Option<Duration>,

    /// Give up on a query that has not completed after this long
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    pub poll_timeout: Option<Duration>,

    #[arg(long, env = "AWS_REGION", global = true)]
    pub region: Option<String>,

    #[arg(long, env = "AWS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file; defaults to ./.cwinsight.toml, then the user config dir
    #[arg(long, env = "CWINSIGHT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// More log output on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Query a single log group
    Query {
        /// Log group to query
        #[arg(
            long,
            visible_alias = "group-name",
            env = "LOG_GROUP",
            required_unless_present = "pick"
        )]
        log_group: Option<String>,

        /// Query the log group that best fuzzy-matches this pattern
        #[arg(long, conflicts_with = "log_group")]
        pick: Option<String>,
    },
    /// Query every log group listed in FILE (or stdin), one per line
    Bulk {
        /// Target list; "-" or nothing reads stdin
        file: Option<PathBuf>,
    },
    /// List log groups
    List {
        #[arg(long)]
        prefix: Option<String>,

        /// Print full descriptors as JSON
        #[arg(long)]
        full: bool,
    },
    /// Print version information
    Version {
        /// Include the git commit and branch
        #[arg(long)]
        full: bool,
    },
}

impl Command {
    /// Log group selection for `query`
    pub fn log_group_selector(&self) -> Option<LogGroupSelector> {
        match self {
            Self::Query {
                log_group: Some(name),
                ..
            } => Some(LogGroupSelector::Name(name.clone())),
            Self::Query {
                pick: Some(pattern),
                ..
            } => Some(LogGroupSelector::Pick(pattern.clone())),
            _ => None,
        }
    }
}

impl GlobalArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            query_string: self.query_string.clone(),
            before: self.before,
            start: self.start,
            end: self.end,
            duration_quota: self.duration_quota,
            raw: match (self.raw, self.no_raw) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            max_concurrency: self.max_concurrency,
            poll_interval: self.poll_interval,
            poll_timeout: self.poll_timeout,
            region: self.region.clone(),
            profile: self.profile.clone(),
        }
    }
}
