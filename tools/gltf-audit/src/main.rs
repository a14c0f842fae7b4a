//! gltf-audit - glTF 2.0 conformance checker
//!
//! Validates a `.gltf` document and its external buffers and prints the
//! findings. Exits with status 1 when any error-severity issue remains after
//! report filtering.

use anyhow::{Context, Result};
use clap::Parser;
use gltf_audit::{Report, ReportConfig, Validator};
use gltf_audit_cli::{OutputFormat, load_gltf, render};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "gltf-audit")]
#[command(about = "glTF 2.0 conformance checker")]
#[command(version)]
struct Cli {
    /// Input .gltf file
    input: PathBuf,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Maximum number of issues to print (overrides config)
    #[arg(short, long)]
    max_issues: Option<usize>,

    /// Skip decoding accessor data
    #[arg(long)]
    no_data: bool,
}

fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ReportConfig::load(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => ReportConfig::default(),
    };
    if cli.max_issues.is_some() {
        config.report.max_issues = cli.max_issues;
    }
    if cli.no_data {
        config.validation.validate_accessor_data = false;
    }

    tracing::info!("Validating {:?}", cli.input);
    let asset = load_gltf(&cli.input)?;
    if !asset.unresolved.is_empty() {
        tracing::info!("{} buffer(s) unresolved, their data checks are skipped", asset.unresolved.len());
    }

    let issues = Validator::new(&asset.document, &asset.buffers)
        .with_options(config.validation.clone())
        .validate();
    let report = Report::build(issues, &config.report);

    print!("{}", render(&report, cli.format)?);

    Ok(if report.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
