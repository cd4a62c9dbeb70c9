//! Prometheus exporter for Elasticsearch.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use es_exporter::{
    Endpoint, ExporterConfig, HttpServer, IndicesSettingsCollector, Registry, SnapshotsCollector,
};
use es_exporter_common::init_tracing;

/// Prometheus exporter for Elasticsearch.
#[derive(Parser, Debug)]
#[command(name = "es-exporter")]
#[command(about = "Export Elasticsearch snapshot statistics as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// Elasticsearch URI (overrides config).
    #[arg(long)]
    es_uri: Option<String>,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error; overrides config).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };

    // Apply CLI overrides
    if let Some(uri) = args.es_uri {
        config.elasticsearch.uri = uri;
    }
    if let Some(listen) = args.listen {
        config.prometheus.listen = listen;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    init_tracing(&config.logging)?;

    info!("Starting Elasticsearch exporter");

    let endpoint = Endpoint::parse(&config.elasticsearch.uri)?;
    let client = reqwest::Client::builder()
        .timeout(config.elasticsearch.timeout())
        .build()?;

    let namespace = &config.prometheus.namespace;
    let const_labels = config.prometheus.const_labels();

    // Register collectors
    let mut registry = Registry::new();
    if config.collectors.snapshots {
        registry.register(Arc::new(SnapshotsCollector::new(
            client.clone(),
            endpoint.clone(),
            namespace,
            &const_labels,
        )))?;
    }
    if config.collectors.indices_settings {
        registry.register(Arc::new(IndicesSettingsCollector::new(
            client.clone(),
            endpoint.clone(),
            namespace,
            &const_labels,
        )))?;
    }

    info!(
        endpoint = %endpoint,
        collectors = registry.len(),
        metrics = registry.describe().len(),
        "Collectors registered"
    );

    let listen_addr: SocketAddr = config
        .prometheus
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_server = HttpServer::new(
        Arc::new(registry),
        listen_addr,
        config.prometheus.path.clone(),
    );

    // Start HTTP server
    let mut http_task = tokio::spawn(async move {
        if let Err(e) = http_server.run(shutdown_rx).await {
            error!("HTTP server error: {}", e);
        }
    });

    // Wait for shutdown signal, or the server giving up on its own
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down...");
        }
        result = &mut http_task => {
            if let Err(e) = result {
                error!("HTTP server task failed: {}", e);
            }
            anyhow::bail!("HTTP server exited unexpectedly");
        }
    }

    // Signal shutdown; the server may already be gone
    let _ = shutdown_tx.send(true);

    // Wait for the server to drain
    let _ = tokio::time::timeout(Duration::from_secs(5), http_task).await;

    info!("Exporter stopped");
    Ok(())
}

#[cfg(unix)]
async fn terminate() {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
