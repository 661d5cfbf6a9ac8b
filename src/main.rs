//! Sample Model - Main Entry Point
//!
//! Runs the full train-and-evaluate pipeline with the default configuration.

use clap::Parser;
use sample_model::cli::Cli;
use sample_model::pipeline::{run_pipeline, PipelineConfig};

fn main() -> anyhow::Result<()> {
    // Logs go to stderr, the report goes to stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sample_model=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let _cli = Cli::parse();

    run_pipeline(&PipelineConfig::default())?;

    Ok(())
}
