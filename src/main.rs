use clap::Parser;
use mediabot::cli::{Args, run_cli};
use mediabot::logging;
use mediabot::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run_cli(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Run aborted");
            OutputFormatter::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
