//! `SchemaSheets` command-line interface
//!
//! This binary provides the `schemasheets` tool for converting between
//! sheets and `LinkML` schemas.

use std::process::ExitCode;

fn main() -> ExitCode {
    match schemasheets_service::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
