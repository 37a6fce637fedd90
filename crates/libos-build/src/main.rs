use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use libos_build::offsets::{self, OffsetsArgs};

/// Invoked by cargo as `cargo shim <command>`.
#[derive(Parser)]
#[command(name = "cargo", bin_name = "cargo")]
enum Cargo {
    Shim(Shim),
}

#[derive(clap::Args)]
#[command(version, about = "LibOS shim build tooling")]
struct Shim {
    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Offsets(OffsetsArgs),
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = if verbose > 0 {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let Cargo::Shim(shim) = Cargo::parse();
    init_tracing(shim.verbose);

    let result = match shim.command {
        Command::Offsets(args) => offsets::run(args),
    };
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
