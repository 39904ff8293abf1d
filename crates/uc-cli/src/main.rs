//! CLI frontend for the Uncooked rail simulation.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "uc",
    about = "Uncooked: headless driver for the train rail simulation",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a straight-line template track file
    Init {
        /// Name of the track (written to `<name>.track.json`)
        name: String,

        /// Number of rail segments
        #[arg(long, default_value = "6")]
        segments: usize,

        /// Waypoints per segment
        #[arg(long, default_value = "5")]
        waypoints: usize,

        /// Number of train cars, engine included
        #[arg(long, default_value = "3")]
        cars: usize,
    },

    /// Validate a track file and summarize its network
    Check {
        /// Track file to validate
        file: PathBuf,
    },

    /// Run the train headlessly over a track file
    Simulate {
        /// Track file to simulate
        file: PathBuf,

        /// Number of ticks to simulate
        #[arg(short, long, default_value = "2000")]
        ticks: u64,

        /// RNG seed for deterministic simulation
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Seconds of game time per tick
        #[arg(long, default_value = "0.02")]
        tick_secs: f64,

        /// Seconds between start and the train moving
        #[arg(long, default_value = "8.0")]
        delay: f64,

        /// Ticks spent editing at each checkpoint before continuing
        #[arg(long, default_value = "50")]
        edit_ticks: u64,

        /// Boost the train at this tick
        #[arg(long)]
        boost_at: Option<u64>,

        /// Set a car on fire at a tick, as `NAME@TICK` (repeatable)
        #[arg(long)]
        ignite: Vec<String>,

        /// Show all events and debug logging
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Simulate { verbose: true, .. });
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Init {
            name,
            segments,
            waypoints,
            cars,
        } => commands::init::run(&name, segments, waypoints, cars),
        Commands::Check { file } => commands::check::run(&file),
        Commands::Simulate {
            file,
            ticks,
            seed,
            tick_secs,
            delay,
            edit_ticks,
            boost_at,
            ignite,
            verbose,
        } => commands::simulate::run(
            &file,
            &commands::simulate::Options {
                ticks,
                seed,
                tick_secs,
                delay,
                edit_ticks,
                boost_at,
                ignite,
                verbose,
            },
        ),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
