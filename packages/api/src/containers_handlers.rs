// ABOUTME: HTTP request handlers for container lifecycle operations
// ABOUTME: Create, status, start/stop/remove, logs, exec and bulk actions

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use dockyard_config::defaults::DEFAULT_LOG_TAIL;
use dockyard_provisioning::{find_container, BulkReport, ProvisionOutcome, ProvisionRequest};
use dockyard_runtime::{run_to_completion, ContainerSummary, ErrorKind, RuntimeLease};

/// Reject a body that failed to parse
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text())))
}

pub(crate) async fn acquire(state: &AppState) -> ApiResult<RuntimeLease> {
    state
        .gateway
        .acquire()
        .await
        .map_err(|e| ApiError::runtime("Failed to connect to Docker", e))
}

/// Look the identifier up in a fresh container list
async fn resolve_container(lease: &RuntimeLease, ident: &str) -> ApiResult<ContainerSummary> {
    let containers = lease
        .list_containers(true)
        .await
        .map_err(|e| ApiError::runtime("Failed to list containers", e))?;

    find_container(&containers, ident)
        .cloned()
        .ok_or_else(|| ApiError::ContainerNotFound(ident.to_string()))
}

fn display_name(container: &ContainerSummary) -> String {
    container
        .primary_name()
        .unwrap_or_else(|| container.short_id())
        .to_string()
}

#[derive(Serialize)]
pub struct CreateContainerResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: ProvisionOutcome,
}

/// Provision and start a container
///
/// POST /create
pub async fn create_container(
    State(state): State<AppState>,
    payload: Result<Json<ProvisionRequest>, JsonRejection>,
) -> ApiResult<Json<CreateContainerResponse>> {
    let request = json_body(payload)?;
    info!("Create request: {:?}", request);

    let outcome = state.provisioner.provision(request).await?;

    Ok(Json(CreateContainerResponse {
        message: format!("Container {} created and started", outcome.name),
        outcome,
    }))
}

/// List every container, running or not
///
/// GET /status
pub async fn list_containers(State(state): State<AppState>) -> ApiResult<Json<Vec<ContainerSummary>>> {
    let lease = acquire(&state).await?;
    let containers = lease
        .list_containers(true)
        .await
        .map_err(|e| ApiError::runtime("Failed to list containers", e))?;

    Ok(Json(containers))
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /stop/{id}
pub async fn stop_container(
    State(state): State<AppState>,
    Path(ident): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let lease = acquire(&state).await?;
    let container = resolve_container(&lease, &ident).await?;

    info!("Stopping container {}", container.id);
    let handle = lease.handle();
    let id = container.id.clone();
    let timeout = state.stop_timeout_secs;
    run_to_completion("stop", async move { handle.stop_container(&id, timeout).await })
        .await
        .map_err(|e| ApiError::runtime("Failed to stop container", e))?;

    Ok(Json(MessageResponse {
        message: format!("Container {} stopped", display_name(&container)),
    }))
}

#[derive(Serialize)]
pub struct StartContainerResponse {
    pub message: String,
    pub container_id: String,
    pub container_name: String,
}

/// GET /start/{id}
pub async fn start_container(
    State(state): State<AppState>,
    Path(ident): Path<String>,
) -> ApiResult<Json<StartContainerResponse>> {
    let lease = acquire(&state).await?;
    let container = resolve_container(&lease, &ident).await?;
    let name = display_name(&container);

    let details = lease
        .inspect_container(&container.id)
        .await
        .map_err(|e| ApiError::runtime("Failed to inspect container", e))?;

    if details.running {
        return Err(ApiError::AlreadyRunning {
            container_id: container.short_id().to_string(),
            current_status: details.status,
        });
    }

    info!("Starting container {}", container.id);
    let handle = lease.handle();
    let id = container.id.clone();
    run_to_completion("start", async move { handle.start_container(&id).await })
        .await
        .map_err(|e| {
            let classified = state.provisioner.classifier().classify_runtime(&e);
            match classified.kind {
                ErrorKind::PortConflict => ApiError::StartPortConflict {
                    container_id: container.id.clone(),
                    error: classified,
                },
                _ => ApiError::runtime("Failed to start container", e),
            }
        })?;

    Ok(Json(StartContainerResponse {
        message: format!("Container {} started", name),
        container_id: container.short_id().to_string(),
        container_name: name,
    }))
}

/// Forced removal, running containers included
///
/// GET /remove/{id}
pub async fn remove_container(
    State(state): State<AppState>,
    Path(ident): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let lease = acquire(&state).await?;
    let container = resolve_container(&lease, &ident).await?;

    info!("Removing container {}", container.id);
    let handle = lease.handle();
    let id = container.id.clone();
    run_to_completion("remove", async move { handle.remove_container(&id, true).await })
        .await
        .map_err(|e| ApiError::runtime("Failed to remove container", e))?;

    Ok(Json(MessageResponse {
        message: format!("Container {} removed", display_name(&container)),
    }))
}

#[derive(Deserialize)]
pub struct LogsQuery {
    pub tail: Option<String>,
}

#[derive(Serialize)]
pub struct LogsResponse {
    pub logs: String,
    pub container: String,
}

/// GET /logs/{id}?tail=N
pub async fn container_logs(
    State(state): State<AppState>,
    Path(ident): Path<String>,
    Query(query): Query<LogsQuery>,
) -> ApiResult<Json<LogsResponse>> {
    let tail = query
        .tail
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_TAIL.to_string());

    let lease = acquire(&state).await?;
    let target = target_id(&lease, &ident).await?;

    let bytes = lease
        .logs(&target, &tail)
        .await
        .map_err(|e| ApiError::runtime("Failed to get logs", e))?;

    Ok(Json(LogsResponse {
        logs: String::from_utf8_lossy(&bytes).to_string(),
        container: ident,
    }))
}

#[derive(Deserialize)]
pub struct ExecRequest {
    #[serde(default)]
    pub command: String,
}

#[derive(Serialize)]
pub struct ExecResponse {
    pub output: String,
    pub command: String,
    pub container: String,
}

/// Run `sh -c <command>` in the container
///
/// POST /exec/{id}
pub async fn exec_in_container(
    State(state): State<AppState>,
    Path(ident): Path<String>,
    payload: Result<Json<ExecRequest>, JsonRejection>,
) -> ApiResult<Json<ExecResponse>> {
    let request = json_body(payload)?;
    let command = request.command.trim().to_string();
    if command.is_empty() {
        return Err(ApiError::BadRequest("Command is required".to_string()));
    }

    let lease = acquire(&state).await?;
    let target = target_id(&lease, &ident).await?;

    info!("Exec in {}: {}", target, command);
    let output = lease
        .exec(
            &target,
            vec!["sh".to_string(), "-c".to_string(), command.clone()],
        )
        .await
        .map_err(|e| ApiError::runtime("Failed to execute command", e))?;

    Ok(Json(ExecResponse {
        output: String::from_utf8_lossy(&output).to_string(),
        command,
        container: ident,
    }))
}

/// Known container id for the identifier, or the identifier itself for the daemon to resolve
async fn target_id(lease: &RuntimeLease, ident: &str) -> ApiResult<String> {
    match resolve_container(lease, ident).await {
        Ok(container) => Ok(container.id),
        Err(ApiError::ContainerNotFound(_)) => Ok(ident.to_string()),
        Err(e) => Err(e),
    }
}

#[derive(Deserialize)]
pub struct BulkRequest {
    pub containers: Vec<String>,
}

/// Apply one action to each listed container
///
/// POST /bulk/{action}
pub async fn bulk_action(
    State(state): State<AppState>,
    Path(action): Path<String>,
    payload: Result<Json<BulkRequest>, JsonRejection>,
) -> ApiResult<Json<BulkReport>> {
    let request = json_body(payload)?;

    info!("Bulk {} on {} containers", action, request.containers.len());
    let report = state
        .bulk
        .apply(&action, &request.containers)
        .await
        .map_err(|e| ApiError::runtime("Bulk operation failed", e))?;

    Ok(Json(report))
}
