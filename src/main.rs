#![warn(clippy::all, rust_2018_idioms)]

use clap::Parser;
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

use cwinsight::app::cli::{Cli, Command};
use cwinsight::app::commands::{executor_for, run_bulk, run_list, run_query, run_version};
use cwinsight::app::config::{locate_config, FileConfig, Settings};
use cwinsight::app::data_plane::cloudwatch_logs::{CloudWatchLogsClient, LogsInsightsApi};
use cwinsight::app::logging::init_logging;
use cwinsight::app::{CwInsightError, Result};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.global.verbose) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let status = e.exit_status();
            eprintln!("Error: {:#}", anyhow::Error::from(e));
            ExitCode::from(status)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut out = std::io::stdout();

    if let Command::Version { full } = cli.command {
        return run_version(full, &mut out);
    }

    let settings = load_settings(&cli)?;

    // One client for the whole run, shared by every query task
    let client = CloudWatchLogsClient::connect(&settings.connection).await;
    let api: Arc<dyn LogsInsightsApi> = Arc::new(client);

    match &cli.command {
        Command::Query { .. } => {
            let selector = cli.command.log_group_selector().ok_or_else(|| {
                CwInsightError::config("either --log-group or --pick is required")
            })?;
            let window = settings.resolve_window(chrono::Utc::now())?;
            let executor = executor_for(api, &settings);
            run_query(&settings, &executor, &selector, &window, &mut out).await
        }
        Command::Bulk { file } => {
            let window = settings.resolve_window(chrono::Utc::now())?;
            let executor = executor_for(api, &settings);
            match file.as_deref().filter(|path| *path != Path::new("-")) {
                Some(path) => {
                    let source_name = path.display().to_string();
                    let reader = std::fs::File::open(path).map_err(|source| {
                        CwInsightError::TargetSource {
                            source_name: source_name.clone(),
                            source,
                        }
                    })?;
                    run_bulk(&settings, &executor, &window, reader, &source_name, &mut out)
                        .await
                        .map(|_| ())
                }
                None => {
                    let stdin = std::io::stdin();
                    if stdin.is_terminal() {
                        return Err(CwInsightError::config(
                            "no target file given and stdin is a terminal",
                        ));
                    }
                    run_bulk(&settings, &executor, &window, stdin, "stdin", &mut out)
                        .await
                        .map(|_| ())
                }
            }
        }
        Command::List { prefix, full } => {
            run_list(api.as_ref(), prefix.as_deref(), *full, &mut out).await
        }
        Command::Version { .. } => Ok(()),
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let cwd = std::env::current_dir().map_err(|e| {
        CwInsightError::config(format!("cannot determine working directory: {}", e))
    })?;

    let file = match locate_config(cli.global.config.as_deref(), &cwd)? {
        Some(path) => {
            info!("Loading config from {}", path.display());
            FileConfig::load(&path)?
        }
        None => FileConfig::default(),
    };

    Settings::resolve(cli.global.overrides(), file)
}
