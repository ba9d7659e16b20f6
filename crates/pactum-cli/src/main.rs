//! Pactum - contract analysis from the command line.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pactum", version)]
#[command(about = "Extract contract data, detect breaches and estimate penalties", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a contract and optionally run the later stages
    Analyze {
        /// Contract PDF
        document: PathBuf,

        /// Also detect breaches
        #[arg(long)]
        breaches: bool,

        /// Also estimate penalties
        #[arg(long)]
        penalties: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Interactive conversation (upload, breaches, penalties, reset, quit)
    Chat,

    /// Run breach rules on an already-extracted record (JSON or YAML)
    Evaluate {
        record: PathBuf,

        /// Also estimate penalties
        #[arg(long)]
        penalties: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the breach rules
    Rules,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Analyze {
            document,
            breaches,
            penalties,
            json,
        } => commands::analyze(config, &document, breaches, penalties, json).await,
        Commands::Chat => commands::chat(config).await,
        Commands::Evaluate {
            record,
            penalties,
            json,
        } => commands::evaluate(config, &record, penalties, json),
        Commands::Rules => commands::rules(),
    }
}
