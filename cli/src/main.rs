mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{mapping, redistribute};
use tracing_subscriber::EnvFilter;

/// Log to stderr; RUST_LOG wins over the -v count.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match &cli.command {
        Commands::Mapping(args) => mapping::run(&cli, args),
        Commands::Redistribute(args) => redistribute::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
