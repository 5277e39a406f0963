//! Agrimerge CLI - field and weather pipelines.

mod cli;
mod commands;

use std::env;
use std::sync::OnceLock;

use clap::Parser;
use cli::{Cli, Commands};
use log::LevelFilter;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging(verbose: bool) {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
            builder.filter_module("agrimerge", level);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            field_out,
            weather_out,
            sample,
            seed,
            json,
        } => commands::run::run(config, field_out, weather_out, sample, seed, json),

        Commands::Field { config, output } => commands::field::run(config, output),

        Commands::Weather { config, output } => commands::weather::run(config, output),

        Commands::Validate {
            field,
            weather,
            json,
        } => commands::validate::run(field, weather, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
