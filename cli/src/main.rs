//! CLI for the copier-python template automation.
//!
//! Entry points: the downstream update scan, the template test/build
//! sessions, and the copyright-range hook.

use chrono::Datelike;
use clap::{Parser, Subcommand};
use copier_update_bot::{
    copyright_range, run_session, token_from_env, BotConfig, CopierCli, GitCli, RunSummary, Runner,
    SessionName,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Automation for the copier-python project template.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan GitHub for downstream repositories and open update PRs.
    Update {
        /// Path to a TOML overrides file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// GitHub token; falls back to GITHUB_PAT if unset.
        #[arg(long, env = "GITHUB_TOKEN")]
        token: Option<String>,

        /// Preview candidates without cloning or pushing anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Run one template test/build session.
    Session {
        /// Session name: tests, compiled, build, lint, or update-pre-commit.
        name: String,

        /// Path to the template repository.
        #[arg(long, default_value = ".")]
        template_path: PathBuf,

        /// Program name for the template tool.
        #[arg(long, default_value = "copier")]
        copier_program: String,
    },

    /// Render the copyright year range for a starting year.
    CopyrightRange {
        /// Starting year as recorded in the template answers.
        start: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = Args::parse();

    match args.command {
        Command::Update {
            config,
            token,
            dry_run,
        } => run_update(config, token, dry_run).await,
        Command::Session {
            name,
            template_path,
            copier_program,
        } => run_one_session(&name, &template_path, &copier_program).await,
        Command::CopyrightRange { start } => {
            let current_year = chrono::Utc::now().year();
            println!("{}", copyright_range(&start, current_year));
            ExitCode::SUCCESS
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Compact single-line output; log level via `RUST_LOG`, defaulting to
/// "info".
fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Runs the downstream update scan.
async fn run_update(config: Option<PathBuf>, token: Option<String>, dry_run: bool) -> ExitCode {
    let token = match token.map_or_else(token_from_env, Ok) {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "No token available");
            return ExitCode::from(2);
        }
    };

    let bot_config = match config {
        Some(path) => BotConfig::from_toml(&path, token),
        None => Ok(BotConfig::new(token)),
    };

    let bot_config = match bot_config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::from(2);
        }
    };

    let runner = match Runner::new(bot_config, dry_run) {
        Ok(runner) => runner,
        Err(e) => {
            error!(error = %e, "Failed to initialize");
            return ExitCode::from(2);
        }
    };

    match runner.run().await {
        Ok(summary) => {
            print_summary(&summary);
            if summary.has_failures() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!(error = %e, "Scan failed");
            ExitCode::from(2)
        }
    }
}

/// Runs one named test/build session.
async fn run_one_session(
    name: &str,
    template_path: &std::path::Path,
    copier_program: &str,
) -> ExitCode {
    let session: SessionName = match name.parse() {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "Unknown session");
            return ExitCode::from(2);
        }
    };

    let tool = CopierCli::new(copier_program);
    let vcs = GitCli::new();

    match run_session(session, &tool, &vcs, template_path).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(session = %session, error = %e, "Session failed");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_accepts_a_copier_program_override() {
        let args = Args::parse_from([
            "copier-update-bot-cli",
            "session",
            "tests",
            "--copier-program",
            "/opt/venv/bin/copier",
        ]);

        match args.command {
            Command::Session { copier_program, .. } => {
                assert_eq!(copier_program, "/opt/venv/bin/copier");
            }
            other => panic!("expected a session command, got {other:?}"),
        }
    }

    #[test]
    fn session_defaults_to_the_stock_program() {
        let args = Args::parse_from(["copier-update-bot-cli", "session", "lint"]);

        match args.command {
            Command::Session { copier_program, .. } => assert_eq!(copier_program, "copier"),
            other => panic!("expected a session command, got {other:?}"),
        }
    }
}

/// Prints the final run summary.
fn print_summary(summary: &RunSummary) {
    println!("\nSummary:");
    println!(
        "  Mode: {}",
        if summary.dry_run { "Dry Run" } else { "Live" }
    );
    println!("  Candidates discovered: {}", summary.candidates_discovered);
    println!("  Updated: {}", summary.updated);
    println!("  Unchanged: {}", summary.unchanged);
    println!("  Skipped: {}", summary.skipped);
    println!("  Failed: {}", summary.failed);

    if !summary.dry_run {
        println!("  PRs created: {}", summary.prs_created);
    }
}
