//! Upkit CLI - Tag and budget reports for Up Bank accounts
//!
//! Usage:
//!   upkit tags --account "2Up Spending"                 Spend per tag, last month
//!   upkit tag --account NAME --tag Groceries            Selected tags only
//!   upkit budget --account NAME --budget budget.csv     Budget vs spend
//!   upkit untagged --account NAME --last 2 --unit weeks Untagged withdrawals
//!   upkit offset --unit days --amount 7                 Shift a timestamp

mod cli;
mod commands;


use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use upkit_core::time::now_in;
use upkit_core::{LoggingSettings, Settings};

use cli::*;
use commands::RunContext;

/// Install the global subscriber: console plus an optional log file.
///
/// The returned guard flushes the file writer when dropped, so it must live
/// until the end of `main`.
fn init_logging(verbose: bool, logging: &LoggingSettings) -> Option<WorkerGuard> {
    // Priority: RUST_LOG env var > --verbose flag > configured level
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let console = fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match &logging.log_dir {
        Some(dir) => match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::never(dir, &logging.log_file);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer().with_ansi(false).with_writer(writer);
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!("Warning: cannot create log directory {}: {}", dir.display(), e);
                (None, None)
            }
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();

    guard
}

/// Map an error to the process exit status
///
/// Authentication failures and unknown accounts exit with 2, anything else with 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<upkit_core::Error>() {
        Some(upkit_core::Error::Authentication(_))
        | Some(upkit_core::Error::AccountNotFound { .. }) => 2,
        _ => 1,
    }
}

async fn run(cli: Cli, ctx: RunContext) -> Result<()> {
    let token = cli.token.as_deref();

    match cli.command {
        Commands::Tags {
            account,
            window,
            output,
        } => {
            let source = commands::open_source(&ctx.settings, token)?;
            commands::cmd_report_tags(&source, &ctx, &account, &window, &output).await?;
        }
        Commands::Tag {
            account,
            tags,
            window,
            output,
        } => {
            let source = commands::open_source(&ctx.settings, token)?;
            commands::cmd_report_tag(&source, &ctx, &account, &tags, &window, &output).await?;
        }
        Commands::Budget {
            account,
            budget,
            lower,
            upper,
            window,
            output,
        } => {
            let source = commands::open_source(&ctx.settings, token)?;
            commands::cmd_report_budget(
                &source, &ctx, &account, &budget, lower, upper, &window, &output,
            )
            .await?;
        }
        Commands::Untagged {
            account,
            window,
            output,
        } => {
            let source = commands::open_source(&ctx.settings, token)?;
            commands::cmd_report_untagged(&source, &ctx, &account, &window, &output).await?;
        }
        Commands::Offset { from, unit, amount } => {
            let shifted = commands::cmd_offset(from.as_deref(), unit, amount, ctx.now)?;
            println!("{}", shifted);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(1);
        }
    };

    let _guard = init_logging(cli.verbose, &settings.logging);

    let now = now_in(settings.report.timezone);
    let ctx = RunContext::new(settings, now);

    match run(cli, ctx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}
