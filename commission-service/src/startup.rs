//! Application startup and lifecycle management.
//!
//! The HTTP listener serves infrastructure probes and metrics only; reporting
//! callers embed [`CommissionService`] through [`Application::service`].

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use service_core::error::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::CommissionConfig;
use crate::services::{get_metrics, CommissionDb, CommissionService};

/// State for health check endpoints.
#[derive(Clone)]
struct HealthState {
    db: CommissionDb,
}

/// Health check endpoint for Docker/K8s liveness probes.
async fn health_check(State(state): State<HealthState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "commission-service",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "service": "commission-service",
                "error": e.to_string()
            })),
        ),
    }
}

/// Readiness check endpoint for K8s readiness probes.
async fn readiness_check(State(state): State<HealthState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn metrics_endpoint() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    db: CommissionDb,
    service: CommissionService,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: CommissionConfig) -> Result<Self, AppError> {
        let db = CommissionDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;

        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let store = Arc::new(db.clone());
        let service = CommissionService::new(
            store.clone(),
            store.clone(),
            store,
            config.ledger.period_calculator()?,
            config.ledger.append_policy(),
        );

        // Bind HTTP listener (port 0 = random port for testing)
        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", http_addr, e);
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        tracing::info!(
            http_port,
            utc_offset_minutes = config.ledger.utc_offset_minutes,
            "Commission service ready"
        );

        Ok(Self {
            http_port,
            http_listener,
            db,
            service,
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Reporting and ledger operations over the configured store.
    pub fn service(&self) -> &CommissionService {
        &self.service
    }

    /// Run the HTTP server until `shutdown` resolves.
    pub async fn run_until_stopped(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let router = Router::new()
            .route("/health", get(health_check))
            .route("/ready", get(readiness_check))
            .with_state(HealthState { db: self.db })
            .route("/metrics", get(metrics_endpoint));

        axum::serve(self.http_listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}
