//! Intrusion Detection Pipeline - Main Entry Point
//!
//! Serves real-time classification of network connection records over HTTP,
//! backed by a pre-trained decision-forest artifact bundle.

use anyhow::Result;
use intrusion_detection_pipeline::{
    config::AppConfig,
    detector::DetectionEngine,
    metrics::{MetricsReporter, PipelineMetrics},
    server::{self, AppState},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("intrusion_detection_pipeline=info".parse()?),
        )
        .init();

    info!("Starting Intrusion Detection Pipeline");

    // Load configuration
    let config = AppConfig::load()?;
    info!(
        "Configuration loaded: artifacts in {}, data dir {}",
        config.artifacts.model_dir, config.server.data_dir
    );

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    // Initialize the detection engine. Artifacts load lazily; a missing
    // bundle leaves the service up but not_ready until the files appear.
    let engine = Arc::new(DetectionEngine::new(&config));
    match engine.ensure_ready() {
        Ok(bundle) => info!(
            trees = bundle.classifier.tree_count(),
            classes = ?bundle.classifier.classes,
            "Artifact bundle loaded"
        ),
        Err(e) => warn!(error = %e, "Artifacts unavailable, serving as not_ready"),
    }

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    let addr: SocketAddr = config.bind_addr().parse()?;
    let state = AppState {
        engine,
        metrics,
        config: Arc::new(config),
    };

    server::serve(state, addr).await
}
