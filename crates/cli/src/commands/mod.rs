//! Command definitions and dispatch

mod completions;
mod metadata_plan;
mod temp_url;

use clap::{Parser, Subcommand};
use objstore_core::{Config, ConfigManager};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// ostore - temporary URLs and metadata plans for Swift-style object storage
#[derive(Parser, Debug)]
#[command(name = "ostore", version, about, long_about = None)]
pub struct Cli {
    /// Output strict JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_config(&self) -> OutputConfig {
        OutputConfig {
            json: self.json,
            no_color: self.no_color,
            quiet: self.quiet,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a signed temporary URL
    #[command(name = "temp-url")]
    TempUrl(temp_url::TempUrlArgs),

    /// Show the headers a metadata reset or merge would send
    #[command(name = "metadata-plan")]
    MetadataPlan(metadata_plan::MetadataPlanArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Execute the parsed command line
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = cli.output_config();

    match cli.command {
        Commands::TempUrl(args) => temp_url::execute(args, output_config).await,
        Commands::MetadataPlan(args) => metadata_plan::execute(args, output_config).await,
        Commands::Completions(args) => completions::execute(args),
    }
}

/// Load the configuration file, reporting failures through the formatter
pub fn load_config(formatter: &Formatter) -> Result<Config, ExitCode> {
    let manager = match ConfigManager::new() {
        Ok(m) => m,
        Err(e) => {
            formatter.error(&format!("Failed to locate config: {e}"));
            return Err(ExitCode::ConfigError);
        }
    };

    match manager.load() {
        Ok(config) => {
            tracing::debug!(path = %manager.path().display(), "Loaded configuration");
            Ok(config)
        }
        Err(e) => {
            formatter.error(&format!(
                "Failed to load config from {}: {e}",
                manager.path().display()
            ));
            Err(ExitCode::ConfigError)
        }
    }
}
