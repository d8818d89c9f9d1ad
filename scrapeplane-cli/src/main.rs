//! Scrapeplane CLI - Command-line interface
//!
//! This binary runs the scrapeplane target manager against jobs given on
//! the command line.

mod commands;
mod error;
mod probe;
mod runner;

use clap::{Parser, Subcommand};
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "scrapeplane")]
#[command(version = scrapeplane::VERSION)]
#[command(about = "Keep metrics scrape jobs running in step with their configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scrape jobs until interrupted
    Run(RunArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
    };

    if let Err(e) = result {
        e.exit();
    }
}
