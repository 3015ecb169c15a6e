use std::io;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;
use privat_rates::{Cli, retrieve_rates, write_rates};

fn main() -> ExitCode {
    env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .parse_default_env()
        .init();
    let args = Cli::parse();

    let rates = match retrieve_rates(&args) {
        Ok(rates) => rates,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match write_rates(io::stdout().lock(), &rates) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
