use clap::Parser;
use riskboard::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
