// ABOUTME: HTTP error type for every Dockyard endpoint
// ABOUTME: Turns provisioning and runtime failures into structured JSON bodies with guidance fields

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use dockyard_provisioning::ProvisionError;
use dockyard_runtime::{ClassifiedError, ErrorKind, RuntimeError};

const DAEMON_HINT: &str = "Make sure Docker is running and the socket is accessible";
const LOGS_HINT: &str = "Check the container logs for more details";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// Unknown container, echoing the identifier that was searched for
    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    #[error("Image not found: {ident}")]
    ImageNotFound {
        ident: String,
        available: Vec<String>,
    },

    #[error("Container is already running")]
    AlreadyRunning {
        container_id: String,
        current_status: String,
    },

    /// Start of an existing container hit a host port conflict
    #[error("Port conflict starting container {container_id}")]
    StartPortConflict {
        container_id: String,
        error: ClassifiedError,
    },

    #[error("Cannot connect to Docker daemon")]
    DaemonUnreachable(String),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// Runtime failure with the action that was being attempted
    #[error("{action}: {message}")]
    Runtime { action: String, message: String },
}

impl ApiError {
    /// Wrap a runtime failure, splitting out an unreachable daemon
    pub fn runtime(action: impl Into<String>, error: RuntimeError) -> Self {
        match error {
            RuntimeError::Unreachable(message) => ApiError::DaemonUnreachable(message),
            other => ApiError::Runtime {
                action: action.into(),
                message: other.to_string(),
            },
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ContainerNotFound(_) | ApiError::ImageNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            ApiError::AlreadyRunning { .. } | ApiError::StartPortConflict { .. } => {
                StatusCode::CONFLICT
            }
            ApiError::DaemonUnreachable(_) | ApiError::Runtime { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Provision(err) => match err {
                ProvisionError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                ProvisionError::PortExhausted(_) => StatusCode::CONFLICT,
                ProvisionError::CreateFailed(c)
                    if matches!(c.kind, ErrorKind::PortConflict | ErrorKind::NameConflict) =>
                {
                    StatusCode::CONFLICT
                }
                ProvisionError::StartFailed { error, .. } if error.is(ErrorKind::PortConflict) => {
                    StatusCode::CONFLICT
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            ApiError::BadRequest(msg) => ErrorBody::new(msg),
            ApiError::ContainerNotFound(_) => ErrorBody::new(self.to_string()),
            ApiError::ImageNotFound { available, .. } => ErrorBody::new(self.to_string())
                .suggestion("Use one of the available image tags or ids")
                .available_images(available.clone()),
            ApiError::AlreadyRunning {
                container_id,
                current_status,
            } => ErrorBody::new(self.to_string())
                .container_id(container_id)
                .current_status(current_status),
            ApiError::StartPortConflict {
                container_id,
                error,
            } => port_conflict_at_start(container_id, error),
            ApiError::DaemonUnreachable(details) => daemon_unreachable(details),
            ApiError::Runtime { .. } => ErrorBody::new(self.to_string()),
            ApiError::Provision(err) => provision_body(err),
        }
    }
}

fn daemon_unreachable(details: &str) -> ErrorBody {
    ErrorBody::new("Cannot connect to Docker daemon. Is the docker daemon running?")
        .details(details)
        .suggestion(DAEMON_HINT)
}

fn port_conflict_at_start(container_id: &str, error: &ClassifiedError) -> ErrorBody {
    let port = error
        .conflicting_port
        .map(|p| p.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut body = ErrorBody::new("Container created but failed to start due to a port conflict")
        .details(&error.raw_message)
        .container_id(container_id)
        .conflict_type("port_conflict_at_start")
        .note("The container exists but is stopped. Free the port, then start it again or remove it.")
        .next_steps(vec![
            format!("Stop whatever is using port {}", port),
            format!("Start the container again with GET /start/{}", container_id),
            format!("Or remove it with GET /remove/{}", container_id),
        ]);
    body.port_in_conflict = error.conflicting_port;
    body
}

fn provision_body(err: &ProvisionError) -> ErrorBody {
    match err {
        ProvisionError::InvalidRequest(msg) => ErrorBody::new(msg),
        ProvisionError::DaemonUnreachable(details) => daemon_unreachable(details),
        ProvisionError::PortExhausted(exhausted) => {
            let mut body = ErrorBody::new(format!(
                "Port {} is not available",
                exhausted.requested
            ))
            .details(exhausted.to_string())
            .suggestion("Choose a different port or leave the port field empty")
            .conflict_type("port_unavailable")
            .next_steps(exhausted.next_steps.clone());
            body.requested_port = Some(exhausted.requested);
            body.scanned_ranges = Some(exhausted.scanned.clone());
            body
        }
        ProvisionError::ImageResolutionFailed { image, error } => {
            ErrorBody::new(format!("Failed to pull image {}", image))
                .details(&error.raw_message)
                .suggestion("Check the image name and tag, and that the registry is reachable")
        }
        ProvisionError::Runtime(error) => ErrorBody::new(&error.raw_message).suggestion(LOGS_HINT),
        ProvisionError::CreateFailed(error) => match error.kind {
            ErrorKind::PortConflict => {
                let mut body = ErrorBody::new("Port conflict detected while creating container")
                    .details(&error.raw_message)
                    .conflict_type("system_port_conflict")
                    .suggestion("The port is held by a process outside Docker's view")
                    .next_steps(vec![
                        "Find the process using the port (lsof -i :<port>) and stop it".to_string(),
                        "Choose a different host port".to_string(),
                        "Leave the port field empty to create without a binding".to_string(),
                    ]);
                body.port_in_conflict = error.conflicting_port;
                body
            }
            ErrorKind::NameConflict => ErrorBody::new("Container name already in use")
                .details(&error.raw_message)
                .conflict_type("name_conflict")
                .suggestion("Choose a different name or leave it empty"),
            _ => ErrorBody::new("Failed to create container")
                .details(&error.raw_message)
                .suggestion(LOGS_HINT),
        },
        ProvisionError::StartFailed {
            container_id,
            error,
        } => {
            if error.is(ErrorKind::PortConflict) {
                port_conflict_at_start(container_id, error)
            } else {
                ErrorBody::new("Container created but failed to start")
                    .details(&error.raw_message)
                    .container_id(container_id)
                    .suggestion(format!(
                        "Check the container logs with GET /logs/{}",
                        container_id
                    ))
            }
        }
    }
}

/// JSON error body; absent fields are omitted
#[derive(Debug, Default, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scanned_ranges: Option<Vec<(u16, u16)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_in_conflict: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_images: Option<Vec<String>>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Default::default()
        }
    }

    fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    fn next_steps(mut self, steps: Vec<String>) -> Self {
        self.next_steps = Some(steps);
        self
    }

    fn conflict_type(mut self, kind: &str) -> Self {
        self.conflict_type = Some(kind.to_string());
        self
    }

    fn container_id(mut self, id: &str) -> Self {
        self.container_id = Some(id.to_string());
        self
    }

    fn note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    fn current_status(mut self, status: &str) -> Self {
        self.current_status = Some(status.to_string());
        self
    }

    fn available_images(mut self, images: Vec<String>) -> Self {
        self.available_images = Some(images);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(status = %status, error = %self, "API request failed");
        } else {
            info!(status = %status, error = %self, "API error response");
        }

        (status, Json(self.body())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
