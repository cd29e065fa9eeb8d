mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::config::Config;
use crate::error::CliError;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Config is loaded up front so logging can honour it; commands that
    // don't need it still run when it is broken.
    let loaded = config::load(&cli.global);

    // Keep the file writer's guard alive for the whole process
    let _guard = init_tracing(&cli.global, loaded.as_ref().ok());

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli, loaded) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(global: &GlobalOpts, config: Option<&Config>) -> Option<WorkerGuard> {
    let filter = match (global.quiet, global.verbose) {
        (true, _) => "error",
        (false, 0) => config.map_or("warn", |c| c.logging.level.as_str()),
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };

    let (file_layer, guard) = match config.and_then(|c| c.logging.dir.as_deref()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "devcap.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    guard
}

fn run(cli: Cli, loaded: Result<Config, CliError>) -> Result<(), CliError> {
    match cli.command {
        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "devcap", &mut std::io::stdout());
            Ok(())
        }

        // Config commands work on the file itself
        Command::Config(args) => commands::config_cmd::handle(args, loaded, &cli.global),

        // Everything else needs a built engine
        cmd => {
            let config = loaded?;
            let engine = config::build_engine(&config)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &engine, &cli.global)
        }
    }
}
