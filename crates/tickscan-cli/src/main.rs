//! CLI application for receipt OCR text parsing.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{correct, patterns, scan, stats};

/// Receipt OCR parsing - extract amounts from recognized receipt text
/// and learn detection patterns from corrections
#[derive(Parser)]
#[command(name = "tickscan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to the pattern configuration file
    #[arg(short, long, global = true)]
    patterns: Option<PathBuf>,

    /// Directory holding the scan history
    #[arg(long, global = true)]
    history: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a recognized-text file into a structured result
    Scan(scan::ScanArgs),

    /// Analyze a user correction and optionally learn a pattern
    Correct(correct::CorrectArgs),

    /// Show or rebuild the aggregate scan statistics
    Stats(stats::StatsArgs),

    /// Manage the detection pattern configuration
    Patterns(patterns::PatternsArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Scan(args) => scan::run(args, cli.patterns.as_deref(), cli.history.as_deref()),
        Commands::Correct(args) => {
            correct::run(args, cli.patterns.as_deref(), cli.history.as_deref())
        }
        Commands::Stats(args) => stats::run(args, cli.history.as_deref()),
        Commands::Patterns(args) => patterns::run(args, cli.patterns.as_deref()),
    }
}
