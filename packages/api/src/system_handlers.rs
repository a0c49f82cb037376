// ABOUTME: HTTP request handlers for host and daemon level information
// ABOUTME: Stats, cleanup, networks, volumes and the health probe

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::containers_handlers::acquire;
use crate::error::{ApiError, ApiResult};
use crate::host_stats::{self, HostSnapshot};
use crate::state::AppState;
use dockyard_provisioning::{count_containers, ContainerCounts};
use dockyard_runtime::{NetworkSummary, VolumeSummary};

#[derive(Serialize)]
pub struct ImageCounts {
    pub total: usize,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub containers: ContainerCounts,
    pub images: ImageCounts,
    pub system: HostSnapshot,
    pub timestamp: String,
}

/// GET /stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    let lease = acquire(&state).await?;

    let containers = lease
        .list_containers(true)
        .await
        .map_err(|e| ApiError::runtime("Failed to list containers", e))?;
    let images = lease
        .list_images()
        .await
        .map_err(|e| ApiError::runtime("Failed to list images", e))?;

    let system = tokio::task::spawn_blocking(host_stats::collect)
        .await
        .map_err(|e| ApiError::Runtime {
            action: "Failed to collect host stats".to_string(),
            message: e.to_string(),
        })?;

    Ok(Json(StatsResponse {
        containers: count_containers(&containers),
        images: ImageCounts {
            total: images.len(),
        },
        system,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

#[derive(Serialize)]
pub struct CleanupResponse {
    pub message: String,
    pub output: String,
}

/// Prune stopped containers, dangling images and unused networks
///
/// POST /cleanup
pub async fn cleanup(State(state): State<AppState>) -> ApiResult<Json<CleanupResponse>> {
    info!("Running system cleanup");

    let output = state
        .docker_cli
        .system_prune()
        .await
        .map_err(|e| ApiError::Runtime {
            action: "Cleanup failed".to_string(),
            message: format!("{:#}", e),
        })?;

    Ok(Json(CleanupResponse {
        message: "Cleanup completed".to_string(),
        output: output.combined(),
    }))
}

/// GET /networks
pub async fn list_networks(State(state): State<AppState>) -> ApiResult<Json<Vec<NetworkSummary>>> {
    let lease = acquire(&state).await?;
    let networks = lease
        .list_networks()
        .await
        .map_err(|e| ApiError::runtime("Failed to list networks", e))?;

    Ok(Json(networks))
}

/// GET /volumes
pub async fn list_volumes(State(state): State<AppState>) -> ApiResult<Json<Vec<VolumeSummary>>> {
    let lease = acquire(&state).await?;
    let volumes = lease
        .list_volumes()
        .await
        .map_err(|e| ApiError::runtime("Failed to list volumes", e))?;

    Ok(Json(volumes))
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub daemon: &'static str,
    pub version: &'static str,
    /// Daemon server version, when the docker CLI can report it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_version: Option<String>,
    pub timestamp: i64,
}

/// Always 200; `daemon` reports whether a lease could be acquired
///
/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, daemon, docker_version) = match state.gateway.acquire().await {
        Ok(_) => ("healthy", "reachable", state.docker_cli.server_version().await),
        Err(e) => {
            warn!("Health check: daemon unreachable: {}", e);
            ("degraded", "unreachable", None)
        }
    };

    Json(HealthResponse {
        status,
        daemon,
        version: env!("CARGO_PKG_VERSION"),
        docker_version,
        timestamp: Utc::now().timestamp(),
    })
}
