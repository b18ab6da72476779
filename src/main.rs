//! Cardiovascular Risk Pipeline - Main Entry Point
//!
//! Reads patient records as JSON lines, runs each through feature encoding
//! and classifier inference, and writes one outcome line per record.

use anyhow::{Context, Result};
use cardio_risk_pipeline::{
    config::{AppConfig, LoggingConfig},
    consumer::RecordConsumer,
    pipeline::RiskPipeline,
    producer::ReportProducer,
};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    init_logging(&config.logging)?;

    info!("Starting Cardiovascular Risk Pipeline");
    info!("Configuration loaded successfully");

    let pipeline = RiskPipeline::from_config(&config.model);
    info!(
        age_unit = ?pipeline.encoder().age_unit(),
        "Feature encoder initialized ({} features: {:?})",
        pipeline.encoder().feature_count(),
        pipeline.encoder().feature_names()
    );

    // Load once up front; on failure every request reports the load error
    if let Err(e) = pipeline.service().load_artifact() {
        error!(
            artifact = %pipeline.service().artifact_path().display(),
            error = %e,
            "Classifier unavailable, all requests will fail"
        );
    }

    let reader: Box<dyn BufRead> = if config.pipeline.input == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(&config.pipeline.input)
            .with_context(|| format!("Failed to open input {}", config.pipeline.input))?;
        Box::new(BufReader::new(file))
    };

    let mut consumer = RecordConsumer::new(reader);
    let mut producer = ReportProducer::new(io::stdout().lock());

    info!(input = %config.pipeline.input, "Processing patient records");

    while let Some(record) = consumer.next_record()? {
        let outcome = pipeline.process(record);
        producer.publish(&outcome)?;

        let count = producer.written();
        if count % 100 == 0 {
            let processing_stats = pipeline.metrics().get_processing_stats();
            info!(
                processed = count,
                avg_latency_us = processing_stats.mean_us,
                "Processing milestone"
            );
        }
    }
    producer.flush()?;

    info!(
        written = producer.written(),
        skipped = consumer.skipped(),
        "Input exhausted, shutting down"
    );
    pipeline.metrics().print_summary();

    Ok(())
}

/// Logs go to stderr so stdout carries only outcome lines
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("cardio_risk_pipeline={}", logging.level).parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}
