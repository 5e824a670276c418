//! Isosim CLI - Command-line interface for running and inspecting skirmishes.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use std::process::ExitCode;

/// Isosim - A deterministic isometric RTS simulation
#[derive(Parser, Debug)]
#[command(name = "isosim")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level: off, error, warn, info, debug, or trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play one skirmish between scripted opponents
    Run {
        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Map layout file (overrides the configuration)
        #[arg(short, long)]
        layout: Option<PathBuf>,

        /// Maximum ticks (overrides the configuration)
        #[arg(short = 't', long)]
        max_ticks: Option<u64>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Run many skirmishes in parallel and aggregate statistics
    Batch {
        /// Number of games to run (default: 100)
        #[arg(short, long, default_value = "100")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Map layout file (overrides the configuration)
        #[arg(short, long)]
        layout: Option<PathBuf>,

        /// Maximum ticks per game (overrides the configuration)
        #[arg(short = 't', long)]
        max_ticks: Option<u64>,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::BatchFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// Print one player's view of a skirmish after some ticks
    View {
        /// Ticks to simulate before capturing
        #[arg(required = true)]
        ticks: u64,

        /// Player whose view is printed (default: 1)
        #[arg(short, long, default_value = "1")]
        player: u8,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Map layout file (overrides the configuration)
        #[arg(short, long)]
        layout: Option<PathBuf>,

        /// Output format: json or llm
        #[arg(short, long, default_value = "llm")]
        format: cli::ViewFormat,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp(None)
        .init();

    let result = match args.command {
        Commands::Run {
            seed,
            config,
            layout,
            max_ticks,
            format,
        } => cli::run::execute(
            seed,
            &cli::Overrides {
                config,
                layout,
                max_ticks,
            },
            format,
        ),

        Commands::Batch {
            games,
            seed,
            threads,
            config,
            layout,
            max_ticks,
            format,
            progress,
        } => cli::batch::execute(
            games,
            seed,
            threads,
            &cli::Overrides {
                config,
                layout,
                max_ticks,
            },
            format,
            progress,
        ),

        Commands::View {
            ticks,
            player,
            seed,
            config,
            layout,
            format,
        } => cli::view::execute(
            ticks,
            player,
            seed,
            &cli::Overrides {
                config,
                layout,
                max_ticks: None,
            },
            format,
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
