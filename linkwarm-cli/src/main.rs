//! linkwarm - replay link prefetch scenarios from the command line.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;
mod error;
mod replay;
mod scenario;

use commands::run::RunArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "linkwarm", version, about)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a scenario script against a prefetching link
    Run {
        /// Scenario script, one step per line
        scenario: PathBuf,

        /// Configuration file (default: ~/.linkwarm/config.ini when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Start with prefetching disabled
        #[arg(long)]
        disable: bool,

        /// Viewport margin in CSS shorthand (e.g. "50px" or "0 100px")
        #[arg(long)]
        root_margin: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a scenario script and report its step count
    Check {
        /// Scenario script, one step per line
        scenario: PathBuf,
    },
}

fn dispatch(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Run {
            scenario,
            config,
            disable,
            root_margin,
            json,
        } => commands::run::run(RunArgs {
            scenario,
            config,
            disable,
            root_margin,
            json,
        }),
        Commands::Check { scenario } => commands::check::run(&scenario),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    linkwarm::logging::init(if cli.verbose { "debug" } else { "info" });

    match dispatch(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
