use commission_service::config::CommissionConfig;
use commission_service::services::init_metrics;
use commission_service::startup::Application;
use service_core::observability::init_tracing;
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CommissionConfig::load()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );
    init_metrics();

    tracing::info!(service = %config.service_name, "Starting commission-service");

    let app = Application::build(config).await?;
    app.run_until_stopped(shutdown_signal()).await?;

    Ok(())
}
