//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - builds the session configuration and prediction-service client
//! - runs the TUI or a one-shot comparison

use std::fs::File;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, CompareArgs, SessionArgs};
use crate::domain::{HorizonPolicy, MethodSelection, SessionConfig};
use crate::error::{AppError, WorkflowError};
use crate::service::HttpPredictionService;
use crate::workflow::{Completion, Session};

/// Entry point for the `fcmp` binary.
pub fn run() -> Result<(), AppError> {
    // `fcmp` with no subcommand behaves like `fcmp tui`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => {
            init_logging(&args, LogTarget::FileOnly)?;
            crate::tui::run(session_config_from_args(&args))
        }
        Command::Compare(args) => {
            init_logging(&args.session, LogTarget::Stderr)?;
            handle_compare(args)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogTarget {
    /// Log to stderr unless a log file was given.
    Stderr,
    /// The terminal belongs to the UI: log only when a log file was given.
    FileOnly,
}

fn init_logging(args: &SessionArgs, target: LogTarget) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match (&args.log_file, target) {
        (Some(path), _) => {
            let file = File::create(path)
                .map_err(|e| AppError::new(2, format!("Failed to create log file '{}': {e}", path.display())))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        (None, LogTarget::Stderr) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        (None, LogTarget::FileOnly) => {}
    }
    Ok(())
}

fn handle_compare(args: CompareArgs) -> Result<(), AppError> {
    let config = session_config_from_args(&args.session);
    let service = HttpPredictionService::from_config(&config).map_err(WorkflowError::from)?;
    let mut session = Session::new(config, service);

    session.select_methods(MethodSelection::from_ordered(args.methods.iter().copied()));
    session.set_horizon(args.horizon.clone());

    // Upload failures are advisory: the server may already hold a dataset.
    if let Some(file) = &args.file {
        session.select_dataset(file);
        match session.upload()? {
            Completion::Applied => {
                if let Some(notice) = session.state.notice() {
                    eprintln!("{}", notice.text);
                }
            }
            Completion::Failed(err) => eprintln!("warning: {err}"),
            Completion::Stale => {}
        }
    }

    match session.compare()? {
        Completion::Applied => {}
        Completion::Failed(err) => return Err(err.into()),
        Completion::Stale => return Err(AppError::new(4, "Comparison response was superseded.")),
    }

    if let Some(done) = session.state.completed() {
        println!(
            "{}",
            crate::report::format_comparison_summary(&done.request, &done.chart)
        );
    }

    if args.export {
        let path = session.export_default()?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

pub fn session_config_from_args(args: &SessionArgs) -> SessionConfig {
    SessionConfig {
        server_url: args.server.clone(),
        horizon_policy: if args.strict_horizon {
            HorizonPolicy::Strict
        } else {
            HorizonPolicy::Lenient
        },
        max_horizon: args.max_horizon,
        report_title: args.title.clone(),
        report_path: args.output.clone(),
        timeout_secs: args.timeout_secs,
    }
}

/// Rewrite argv so `fcmp` defaults to `fcmp tui`.
///
/// Rules:
/// - `fcmp`                        -> `fcmp tui`
/// - `fcmp --server URL ...`       -> `fcmp tui --server URL ...`
/// - `fcmp --help/--version/-h`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "compare");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(argv(&["fcmp"])), argv(&["fcmp", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["fcmp", "--server", "http://h:1"])),
            argv(&["fcmp", "tui", "--server", "http://h:1"])
        );
        assert_eq!(rewrite_args(argv(&["fcmp", "--help"])), argv(&["fcmp", "--help"]));
        assert_eq!(rewrite_args(argv(&["fcmp", "compare"])), argv(&["fcmp", "compare"]));
    }

    #[test]
    fn strict_flag_selects_strict_policy() {
        let cli = crate::cli::Cli::parse_from(["fcmp", "tui", "--strict-horizon", "--max-horizon", "50"]);
        let Command::Tui(args) = cli.command else {
            panic!("expected tui");
        };
        let config = session_config_from_args(&args);
        assert_eq!(config.horizon_policy, HorizonPolicy::Strict);
        assert_eq!(config.max_horizon, Some(50));
    }
}
