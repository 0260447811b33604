//! qkdv Command-Line Interface
//!
//! Turns a QKD protocol description into a machine-checkable Coq proof
//! instance:
//!
//! ```text
//! config (TOML/YAML) -> bound estimate -> interval certificate -> b92_inst.v -> coqc
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::generate::{self, GenerateOptions};

/// Default protocol document, relative to the working directory.
const DEFAULT_CONFIG: &str = "configs/instances/B92_protocol.toml";

/// qkdv - generate and check Coq proof instances for QKD protocols
#[derive(Parser)]
#[command(name = "qkdv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Protocol configuration (.toml, .yaml or .yml)
    #[arg(env = "QKD_CONFIG", default_value = DEFAULT_CONFIG)]
    config: String,

    /// Directory for the proof instance and certificate dump
    #[arg(short, long, default_value = "coq/Generated")]
    out_dir: String,

    /// Safety margin placed around the phase-error estimate
    #[arg(short, long, default_value = "1e-5", allow_negative_numbers = true)]
    margin: f64,

    /// Prover executable used to check the instance
    #[arg(short, long, default_value = qkdv_coq::DEFAULT_PROVER)]
    prover: String,

    /// Generate only, do not run the prover
    #[arg(long)]
    skip_verify: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let options = GenerateOptions {
        config: cli.config,
        out_dir: cli.out_dir,
        margin: cli.margin,
        prover: cli.prover,
        skip_verify: cli.skip_verify,
    };

    if let Err(e) = generate::execute(&options) {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
