// SPDX-License-Identifier: GPL-3.0-only

use camstream::AppError;
use camstream::constants::devices;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

#[derive(Parser)]
#[command(name = "camstream")]
#[command(about = "Stream a local camera to an RTMP endpoint")]
#[command(version = camstream::constants::app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Generic V4L2 capture node to probe
    #[arg(short, long, global = true, default_value = devices::DEFAULT_V4L2_DEVICE)]
    device: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect hardware, build the pipeline and stream until it ends (default)
    Stream,

    /// Print the detected device profile as JSON
    Probe,

    /// Print the resolved configuration and pipeline without streaming
    Pipeline,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=camstream=debug, RUST_LOG=info
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let result = match cli.command.unwrap_or(Commands::Stream) {
        Commands::Stream => return ExitCode::from(cli::stream(&cli.device).exit_code()),
        Commands::Probe => cli::probe(&cli.device),
        Commands::Pipeline => cli::print_pipeline(&cli.device),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            match e.downcast_ref::<AppError>() {
                Some(app_error) => ExitCode::from(app_error.exit_code()),
                None => ExitCode::FAILURE,
            }
        }
    }
}
