//! ostore - command line front end for objstore-core

mod commands;
mod exit_code;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use commands::Cli;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let ansi = output::Formatter::new(cli.output_config()).colors_enabled();
    init_tracing(cli.debug, ansi);

    commands::execute(cli).await.into()
}

/// Log to stderr; `RUST_LOG` wins over `--debug`
fn init_tracing(debug: bool, ansi: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .init();
}
