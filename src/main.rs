//! doorman - quality control at the door
//!
//! Binary entry point. All real logic lives in the library; the CLI
//! layer parses arguments and wires the engine together.

// Keep the crate clippy-clean; opt-outs below are deliberate
#![deny(clippy::all, unsafe_code)]
#![warn(clippy::pedantic, missing_docs)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cargo_common_metadata
)]

mod cli;

fn main() {
    match cli::app::run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    }
}
