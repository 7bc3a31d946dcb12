//! `sbat` command line: headless rendering, gesture replay and label conversion.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sbat::config::AppConfig;

#[derive(Parser)]
#[command(name = "sbat", about = "Scientific box annotation tool")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an image with its boxes to PNG
    Render(commands::render::RenderArgs),
    /// Replay scripted pointer events and print the resulting labels
    Replay(commands::replay::ReplayArgs),
    /// Normalize a label file or print it in pixel units
    Convert(commands::convert::ConvertArgs),
}

fn load_config(path: Option<&PathBuf>) -> commands::Result<AppConfig> {
    match path {
        Some(path) => Ok(AppConfig::load_from_path(path)?),
        None => Ok(AppConfig::load_from_default_path().unwrap_or_default()),
    }
}

fn run(cli: &Cli) -> commands::Result<()> {
    let config = load_config(cli.config.as_ref())?;

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        config.preferences.log_level.to_level_filter()
    };
    // RUST_LOG, when set, overrides the configured level.
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match &cli.command {
        Commands::Render(args) => commands::render::run(args, &config),
        Commands::Replay(args) => commands::replay::run(args, &config),
        Commands::Convert(args) => commands::convert::run(args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
