//! Odyssey Control - operator CLI for the Tech Odyssey progression engine
//!
//! Reads the content catalog and progress documents configured in
//! ~/.config/odyssey/config.toml and runs engine operations against them.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::OdysseyConfig;
use odyssey_core::{ErrorClass, OdysseyError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "odysseyctl")]
#[command(version, about = "Tech Odyssey - progression engine control", long_about = None)]
struct Cli {
    /// Config file (overrides $ODYSSEY_CONFIG and the default locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a mission attempt and apply its XP, level and unlocks
    Complete {
        user: String,
        mission: String,

        /// Seconds taken
        #[arg(long, default_value = "0")]
        time: f64,

        /// Number of errors made
        #[arg(long, default_value = "0")]
        errors: u32,

        /// The attempt was not completed (no XP, no completion)
        #[arg(long)]
        failed: bool,
    },

    /// Show unlocked and pending planets and achievements (read-only)
    Unlocks { user: String },

    /// Change a user's primary skill path
    Path { user: String, track: String },

    /// Show a user's progress dashboard
    Status { user: String },

    /// Rank users by XP
    Leaderboard {
        /// Rank by one skill track instead of total XP
        #[arg(long)]
        track: Option<String>,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Print the XP curve
    Curve {
        /// Number of levels to print (1-400)
        #[arg(
            long,
            default_value = "20",
            value_parser = clap::value_parser!(u32).range(1..=i64::from(commands::curve::MAX_LEVELS))
        )]
        levels: u32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::display_error(&format!("{:#}", err));
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = OdysseyConfig::load(cli.config.as_deref())?;
    init_logging(&config);

    let Cli { json, command, .. } = cli;
    if let Commands::Curve { levels } = command {
        return commands::curve::run(levels, json);
    }

    let ctx = commands::Context::from_config(&config, json)?;
    match command {
        Commands::Complete {
            user,
            mission,
            time,
            errors,
            failed,
        } => commands::complete::run(&ctx, &user, &mission, time, errors, failed),
        Commands::Unlocks { user } => commands::unlocks::run(&ctx, &user),
        Commands::Path { user, track } => commands::path::run(&ctx, &user, &track),
        Commands::Status { user } => commands::status::run(&ctx, &user),
        Commands::Leaderboard { track, limit } => {
            commands::leaderboard::run(&ctx, track.as_deref(), limit)
        }
        Commands::Curve { .. } => Ok(()),
    }
}

fn init_logging(config: &OdysseyConfig) {
    let filter = config.log_filter(std::env::var(config::LOG_ENV).ok());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

/// 2 for bad input, 3 for write conflicts, 4 for storage/content failures
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<OdysseyError>().map(OdysseyError::class) {
        Some(ErrorClass::Validation) => 2,
        Some(ErrorClass::Conflict) => 3,
        Some(ErrorClass::Infrastructure) => 4,
        None => 1,
    }
}
