//! `equilink-admin` binary: parses arguments and hands off to [`equilink_admin::cli`].

use std::process::ExitCode;

use clap::Parser;
use equilink_admin::cli::{run, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
