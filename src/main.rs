use std::process::ExitCode;

use clap::Parser;
use log::debug;

mod cli;
use crate::cli::Cli;
use crate::cli::Config;

mod error;
use crate::error::DumpError;

mod extract;
use crate::extract::Stats;

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: &Cli) -> Result<Stats, DumpError> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let settings = cli.settings(config);
    debug!("SETTINGS: {:?}", settings);

    extract::dump(&settings)
}

fn main() -> ExitCode {
    // Parse the cli
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(&cli) {
        Ok(stats) => {
            println!("count: {}", stats.extracted);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("warcdump: {}", e);
            ExitCode::FAILURE
        }
    }
}
