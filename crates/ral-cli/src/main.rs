//! Headless launcher for reinforced artificial life worlds.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::WorldKind;

#[derive(Parser)]
#[command(
    name = "ral",
    about = "Reinforced artificial life: creatures, grass, and a lot of eating",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a world for a number of ticks and print a population report
    Run {
        /// Which world to run
        #[arg(short, long, value_enum, default_value = "ball")]
        world: WorldKind,

        /// Number of ticks to simulate
        #[arg(short, long, default_value = "100")]
        ticks: u64,

        /// RNG seed for deterministic simulation (overrides the config file)
        #[arg(short, long)]
        seed: Option<u64>,

        /// JSON config file; missing fields keep their defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the recorded episode to this JSONL file
        #[arg(short, long)]
        episode: Option<PathBuf>,

        /// Print the final state as ASCII art
        #[arg(short, long)]
        render: bool,

        /// Add a report row every N ticks (0 = final tick only)
        #[arg(long, default_value = "10")]
        report_every: u64,

        /// Show debug logs and the full event log
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the default configuration as JSON
    Config {
        /// Which world's configuration to print
        #[arg(short, long, value_enum, default_value = "ball")]
        world: WorldKind,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: could not install logger: {e}");
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Commands::Run { verbose: true, .. }));

    let result = match cli.command {
        Commands::Run {
            world,
            ticks,
            seed,
            config,
            episode,
            render,
            report_every,
            verbose,
        } => commands::run::run(&commands::run::RunOptions {
            world,
            ticks,
            seed,
            config: config.as_deref(),
            episode: episode.as_deref(),
            render,
            report_every,
            verbose,
        }),
        Commands::Config { world } => commands::config::run(world),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
