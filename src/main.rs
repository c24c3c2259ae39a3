use clap::Parser;
use sigtrack::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
