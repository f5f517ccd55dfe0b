mod config;

use clap::Parser;
use config::Config;
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Test-metadata lookup and triage service
#[derive(Parser)]
#[command(name = "annex", version)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long)]
    config: PathBuf,
}

fn init_tracing(config: &Config) {
    let filter = match config
        .logging
        .as_ref()
        .and_then(|logging| logging.filter.as_deref())
    {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn init_metrics(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let Some(metrics) = &config.metrics else {
        return Ok(());
    };

    let recorder = StatsdBuilder::from(metrics.statsd_host.as_str(), metrics.statsd_port)
        .build(Some("annex"))?;
    metrics::set_global_recorder(recorder)?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    init_tracing(&config);
    if let Err(e) = init_metrics(&config) {
        eprintln!("Failed to initialize metrics: {e}");
        process::exit(1);
    }

    tracing::info!("Starting annex");
    if let Err(e) = metadata_api::run(config.service).await {
        tracing::error!(error = %e, "Service exited");
        process::exit(1);
    }
}
