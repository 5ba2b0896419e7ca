use cgrun_core::logging;

mod cli;

use crate::cli::CliCommand;

fn main() {
    // Initialize logging as early as possible; falls back to stderr.
    logging::init();

    match CliCommand::run_from_args() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("cgrun error: {:#}", err);
            std::process::exit(1);
        }
    }
}
