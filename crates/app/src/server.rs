use crate::config::StartConfig;
use crate::init;
use neuromesh_rpc::HostState;
use tokio::signal;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber
pub fn init_tracing(debug: bool) {
    // Default to "debug" or "info" but allow RUST_LOG override
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Start one NeuroMesh service host
pub async fn start_server(config: &StartConfig) -> anyhow::Result<()> {
    tracing::info!("🚀 Starting NeuroMesh host");
    tracing::info!("  Service: {}", config.service);
    tracing::info!("  RPC:     {}", config.rpc_addr);
    if let Some(seed) = config.seed {
        tracing::info!("  Seed:    {}", seed);
    }

    let service = init::build_service(config.service, config.seed);
    let metrics = init::build_metrics(!config.metrics_disable)?;

    let state = match metrics {
        Some(metrics) => HostState::new_with_metrics(service, metrics),
        None => {
            tracing::warn!("⚠️  Metrics disabled");
            HostState::new(service)
        }
    };
    let shared = state.service.clone();

    tracing::info!("✅ NeuroMesh host started");
    tracing::info!("Press Ctrl+C to stop");

    let result = neuromesh_rpc::start_server(state, &config.rpc_addr, shutdown_signal()).await;

    // Mark entities inactive before state is dropped
    shared.write().await.shutdown();

    match result {
        Ok(()) => tracing::info!("RPC server stopped"),
        Err(e) => {
            tracing::error!("RPC server error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
