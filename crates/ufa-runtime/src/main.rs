//! # UFA Runtime
//!
//! Boots the UFA chaincode and serves line-delimited JSON commands on stdin,
//! answering on stdout. Logs go to stderr.

use anyhow::{Context, Result};
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ufa_runtime::{session, RuntimeConfig, UfaRuntime};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = RuntimeConfig::from_env();

    // Initialize logging
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  UFA Runtime v{}", ufa_chaincode::VERSION);
    info!("===========================================");
    info!(
        revalidate_updates = config.service.revalidate_updates,
        max_payload_bytes = config.service.max_payload_bytes,
        "Configuration loaded"
    );

    let runtime = UfaRuntime::open(&config).context("starting runtime")?;
    info!("Ready. Reading commands from stdin.");

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    tokio::select! {
        outcome = session::serve(runtime.dispatcher(), stdin, stdout) => {
            let summary = outcome?;
            info!(requests = summary.requests, failures = summary.failures, "End of input");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            warn!("Interrupted");
        }
    }

    let stats = runtime.dispatcher().api().stats();
    info!(
        created = stats.agreements_created,
        updated = stats.agreements_updated,
        invoice_pairs = stats.invoice_pairs_recorded,
        rejections = stats.validation_rejections,
        "Shutting down"
    );
    Ok(())
}
