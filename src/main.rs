use clap::Parser;
use graylog_logger::app::{self, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    match app::run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("graylog-send: {e:#}");
            ExitCode::FAILURE
        }
    }
}
