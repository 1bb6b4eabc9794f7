//! doodlecss - Command-line tool for compiling doodle token trees into CSS

use std::process::ExitCode;

use doodlecss::cli;

fn main() -> ExitCode {
    cli::run()
}
