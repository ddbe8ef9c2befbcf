//! CODEOWNERS linter CLI
//!
//! A command-line tool for validating GitHub CODEOWNERS files.

use clap::Parser;
use std::io::{self, IsTerminal};
use std::process::ExitCode as StdExitCode;
use std::sync::Arc;
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

mod cli;

use cli::Args;
use cli::config::{ConfigError, ExitCode, ValidatedConfig, create_octocrab};
use cli::github::OctocrabClient;
use cli::output::{JsonPrinter, TtyPrinter};
use codeowners_lint_core::validate::github_client::GithubClient;
use codeowners_lint_core::{
    CancellationToken, CheckInput, CheckRunner, RunOutcome, build_checks, parse_entries,
};

#[tokio::main]
async fn main() -> StdExitCode {
    let args = Args::parse();

    init_tracing(args.verbose, args.json);

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let exit_code = run(args, &cancel).await;
    StdExitCode::from(i32::from(exit_code) as u8)
}

/// Cancels the run on SIGINT or SIGTERM.
async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }

    cancel.cancel();
}

/// Initialize tracing based on verbosity level.
fn init_tracing(verbosity: u8, json_output: bool) {
    // Don't output logs when using JSON output mode
    if json_output {
        return;
    }

    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for quiet in ["octocrab=warn", "hyper=warn", "reqwest=warn"] {
        if let Ok(directive) = quiet.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

/// Run the linter with the given arguments.
async fn run(args: Args, cancel: &CancellationToken) -> ExitCode {
    let config = match ValidatedConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            report_startup_error(&e, !args.json && io::stderr().is_terminal());
            return ExitCode::StartupFailure;
        }
    };

    debug!("Validated configuration: {:?}", config);
    info!("Repository path: {}", config.repo_path.display());
    info!("CODEOWNERS file: {}", config.codeowners_path.display());

    let use_colors = !config.json_output && io::stdout().is_terminal();

    let content = match std::fs::read_to_string(&config.codeowners_path) {
        Ok(content) => content,
        Err(e) => {
            let e = ConfigError::ReadCodeowners(format!(
                "'{}': {}",
                config.codeowners_path.display(),
                e
            ));
            report_startup_error(&e, use_colors);
            return ExitCode::StartupFailure;
        }
    };
    let entries = parse_entries(&content);
    debug!("Parsed {} CODEOWNERS entries", entries.len());

    let github: Option<Arc<dyn GithubClient>> = match &config.github {
        Some(settings) => match create_octocrab(settings).await {
            Ok(client) => Some(Arc::new(OctocrabClient::new(client))),
            Err(e) => {
                report_startup_error(&e, use_colors);
                return ExitCode::StartupFailure;
            }
        },
        None => None,
    };

    let checks = match build_checks(&config.checks, &config.check_config, github) {
        Ok(checks) => checks,
        Err(e) => {
            report_startup_error(&ConfigError::from(e), use_colors);
            return ExitCode::StartupFailure;
        }
    };

    let runner = CheckRunner::new(checks, config.threshold);
    info!("Selected checks: {}", runner.check_names().join(", "));
    let input = CheckInput::new(config.repo_path.clone(), entries);

    let (outcome, written) = if config.json_output {
        let mut printer = JsonPrinter::new(io::stdout());
        let outcome = runner.run(input, cancel, &mut printer).await;
        (outcome, printer.finish())
    } else {
        let mut printer = TtyPrinter::new(io::stdout(), use_colors);
        let outcome = runner.run(input, cancel, &mut printer).await;
        (outcome, printer.finish())
    };

    if let Err(e) = written {
        error!("Failed to write output: {}", e);
        if outcome != RunOutcome::Interrupted {
            return ExitCode::StartupFailure;
        }
    }

    match outcome {
        RunOutcome::Passed => ExitCode::Success,
        RunOutcome::Failed => ExitCode::ValidationFailed,
        RunOutcome::Interrupted => {
            warn!("Run interrupted before every check finished");
            ExitCode::Terminated
        }
    }
}

/// Prints an error that stopped the run before any check started.
fn report_startup_error(err: &ConfigError, use_colors: bool) {
    let mut printer = TtyPrinter::new(io::stderr(), use_colors);
    if let Err(e) = printer.write_error(&err.to_string()) {
        error!("Failed to write error: {}", e);
    }
}
