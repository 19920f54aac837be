mod cli;
mod run;

use std::process::ExitCode;

use capture_logging::{capture_error, LevelFilter, LogDestination};
use clap::Parser;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    // A logger can only be missing here if one was installed already.
    let _ = capture_logging::initialize(LogDestination::Both, &cli.log_file, LevelFilter::Info);

    let context = cli.into_context();
    match run::run(&context) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            capture_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
