//! docindex-server binary.

use std::io::Write;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;

use docindex::cli::{ServerArgs, run_server};

fn main() {
    let args = ServerArgs::parse();

    Builder::new()
        .filter_level(args.verbosity.level_filter())
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(args: ServerArgs) -> Result<()> {
    let root = args.document_root.display().to_string();
    run_server(args).with_context(|| format!("Server for {root} failed"))
}
