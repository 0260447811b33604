//! Generate command implementation: the full proof-instance pipeline.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use tracing::info;

use qkdv_cert::{BoundEstimator, CERTIFICATE_FILE, ExportConfig, PlaceholderEstimator};
use qkdv_coq::{CoqcVerifier, InstanceGenerator, Verifier};

/// File name of the generated proof instance inside the output directory.
pub const INSTANCE_FILE: &str = "b92_inst.v";

/// Resolved command-line options.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub config: String,
    pub out_dir: String,
    pub margin: f64,
    pub prover: String,
    pub skip_verify: bool,
}

/// Execute the pipeline: load, estimate, normalize, dump, generate, verify.
pub fn execute(options: &GenerateOptions) -> Result<()> {
    println!(
        "{} Generating proof instance from {}",
        style("→").cyan().bold(),
        style(&options.config).green()
    );

    let config = qkdv_config::load(&options.config)
        .with_context(|| format!("Failed to load configuration {}", options.config))?;
    println!(
        "  Loaded: protocol {}, {} states, {} POVM elements",
        style(&config.name).yellow(),
        config.states.len(),
        config.measurements.povm.len()
    );

    let estimator = PlaceholderEstimator::new();
    let estimate = estimator.estimate(&config);
    info!("Estimator '{}' returned delta_ph={}", estimator.name(), estimate.delta_ph);

    let certificate = qkdv_cert::normalize_estimate(estimate, options.margin)
        .context("Failed to normalize certificate")?;
    let interval = certificate.delta_ph_interval;
    println!(
        "  Certificate: delta_ph in [{:.10}, {:.10}] ({})",
        interval.lower,
        interval.upper,
        style("placeholder bound").dim()
    );

    let out_dir = Path::new(&options.out_dir);
    let cert_path = out_dir.join(CERTIFICATE_FILE);
    qkdv_cert::export::to_file(&certificate, &cert_path, &ExportConfig::default())
        .context("Failed to write certificate dump")?;

    let artifact = InstanceGenerator::new(out_dir.join(INSTANCE_FILE))
        .generate(&config, &certificate)
        .context("Failed to generate proof instance")?;

    println!("{} Proof instance written", style("✓").green().bold());
    println!("  Instance:    {}", style(artifact.display()).green());
    println!("  Certificate: {}", style(cert_path.display()).green());

    if options.skip_verify {
        println!("  Verification skipped");
        return Ok(());
    }

    verify(&artifact, &options.prover)
}

fn verify(artifact: &Path, prover: &str) -> Result<()> {
    let verifier = CoqcVerifier::with_program(prover);
    println!(
        "{} Checking with {}",
        style("→").cyan().bold(),
        style(verifier.name()).yellow()
    );

    let report = verifier.verify(artifact);
    if report.success {
        println!("{} Verification passed", style("✓").green().bold());
        return Ok(());
    }

    let diagnostic = report
        .diagnostic()
        .unwrap_or_else(|| "unknown failure".to_string());
    anyhow::bail!(
        "Verification of {} failed: {}",
        artifact.display(),
        diagnostic
    )
}
