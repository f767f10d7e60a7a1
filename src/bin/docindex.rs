//! docindex client binary.

use std::io::Write;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;

use docindex::cli::{ClientArgs, execute_client};

fn main() {
    let args = ClientArgs::parse();

    Builder::new()
        .filter_level(args.verbosity.level_filter())
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(args: ClientArgs) -> Result<()> {
    let channel = args.channel.display().to_string();
    execute_client(args).with_context(|| format!("Request to {channel} failed"))
}
