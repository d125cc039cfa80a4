use crate::config::Config;
use crate::server::{HttpServer, SharedState};
use crate::telemetry::Metrics;
use leaf_detection::{LabelCatalog, OrtDetector, RemedyTable};
use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let detector = match OrtDetector::new(&config.model) {
        Ok(detector) => Arc::new(detector),
        Err(e) => {
            tracing::error!("Failed to initialize detector: {:?}", e);
            return Err(Box::new(e));
        }
    };

    let labels = match LabelCatalog::load(&config.labels.get_path()) {
        Ok(labels) => Arc::new(labels),
        Err(e) => {
            tracing::error!("Failed to load class labels: {:?}", e);
            return Err(Box::new(e));
        }
    };

    let remedies = Arc::new(RemedyTable::new());
    for class_id in 0..labels.len() as u32 {
        if let Some(class_label) = labels.get(class_id) {
            // Missing entries degrade to a generic advisory at request time.
            if remedies.lookup(&class_label.label).is_none() {
                tracing::warn!("No remedy entry for class label {}", class_label.label);
            }
        }
    }

    let state = SharedState {
        detector,
        labels,
        remedies,
        metrics: Arc::new(Metrics::new()),
    };

    let server = HttpServer::new(state, &config.server).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_shutdown_rx = shutdown_tx.subscribe();

    let server_handle = server.run(server_shutdown_rx).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    let _ = server_handle.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
