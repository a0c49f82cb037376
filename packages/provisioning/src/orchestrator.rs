// ABOUTME: End-to-end container provisioning: image, name, port, create, start
// ABOUTME: Re-queries the daemon at every stage and retries a name conflict once

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ProvisionError, Result};
use crate::names;
use crate::ports::{self, PortRequest};
use dockyard_config::defaults::DEFAULT_IMAGE;
use dockyard_runtime::{
    normalize_image_reference, run_to_completion, ContainerSpec, ErrorClassifier, ErrorKind,
    Gateway, PortBinding, RuntimeError, RuntimeLease,
};

/// Source of the current time for generated names
pub type Clock = fn() -> DateTime<Utc>;

/// Incoming creation request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// `hostPort:containerPort`
    #[serde(default)]
    pub port: Option<String>,
}

/// Result of a successful provision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionOutcome {
    pub id: String,
    pub name: String,
    pub image: String,
    /// Effective `host:container` mapping, `"none"` without a binding
    pub port: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_port: Option<String>,
}

impl ProvisionOutcome {
    pub fn port_changed(&self) -> bool {
        self.original_port.is_some()
    }
}

/// Workflow stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ImageResolving,
    NameResolving,
    PortResolving,
    Creating,
    Starting,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Idle => "idle",
            Stage::ImageResolving => "image_resolving",
            Stage::NameResolving => "name_resolving",
            Stage::PortResolving => "port_resolving",
            Stage::Creating => "creating",
            Stage::Starting => "starting",
            Stage::Done => "done",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct ProvisionSettings {
    pub default_image: String,
    /// Host ports never handed out, the service's own port included
    pub reserved_ports: HashSet<u16>,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            default_image: DEFAULT_IMAGE.to_string(),
            reserved_ports: HashSet::from([dockyard_config::defaults::DEFAULT_PORT]),
        }
    }
}

/// Runs the provisioning workflow against the runtime gateway
#[derive(Clone)]
pub struct Provisioner {
    gateway: Gateway,
    classifier: Arc<ErrorClassifier>,
    settings: ProvisionSettings,
    clock: Clock,
}

impl Provisioner {
    pub fn new(gateway: Gateway, settings: ProvisionSettings) -> Self {
        Self {
            gateway,
            classifier: Arc::new(ErrorClassifier::standard()),
            settings,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    pub fn settings(&self) -> &ProvisionSettings {
        &self.settings
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    /// Turn a request into a running container
    pub async fn provision(&self, request: ProvisionRequest) -> Result<ProvisionOutcome> {
        let mut stage = Stage::Idle;

        // Validation happens before any daemon call
        let port_request = match request.port.as_deref().map(str::trim) {
            Some(spec) if !spec.is_empty() => {
                Some(PortRequest::parse(spec).map_err(ProvisionError::InvalidRequest)?)
            }
            _ => None,
        };

        let runtime = self.gateway.acquire().await.map_err(|e| self.failure(e))?;

        let image = request
            .image
            .as_deref()
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .unwrap_or(self.settings.default_image.as_str())
            .to_string();

        stage = self.advance(stage, Stage::ImageResolving);
        self.ensure_image(&runtime, &image).await?;

        stage = self.advance(stage, Stage::NameResolving);
        let containers = runtime
            .list_containers(true)
            .await
            .map_err(|e| self.failure(e))?;
        let name = names::resolve(
            request.name.as_deref(),
            &names::existing_names(&containers),
            (self.clock)(),
        );
        debug!(stage = %stage, container = %name, "Resolved container name");

        let binding = match &port_request {
            Some(requested) => {
                stage = self.advance(stage, Stage::PortResolving);
                let containers = runtime
                    .list_containers(true)
                    .await
                    .map_err(|e| self.failure(e))?;
                let active: HashSet<u16> =
                    containers.iter().flat_map(|c| c.host_ports()).collect();
                let port =
                    ports::resolve(requested.host_port, &self.settings.reserved_ports, &active)?;
                if port != requested.host_port {
                    info!(
                        stage = %stage,
                        port,
                        requested = requested.host_port,
                        "Requested host port in use, reassigned"
                    );
                }
                Some(PortBinding::new(port, requested.container_port.clone()))
            }
            None => None,
        };

        let spec = ContainerSpec {
            image: image.clone(),
            name,
            tty: true,
            port_binding: binding.clone(),
        };

        stage = self.advance(stage, Stage::Creating);
        let (id, name) = self.create(&runtime, spec).await?;

        stage = self.advance(stage, Stage::Starting);
        self.start(&runtime, &id).await?;

        self.advance(stage, Stage::Done);
        info!(container = %name, id = %id, image = %image, "Container provisioned");

        let port = binding
            .as_ref()
            .map(PortBinding::to_string)
            .unwrap_or_else(|| "none".to_string());

        let (note, original_port) = match (&port_request, &binding) {
            (Some(requested), Some(effective)) if requested.host_port != effective.host_port => (
                Some(format!(
                    "Port {} was not available, container mapped to port {} instead",
                    requested.host_port, effective.host_port
                )),
                Some(requested.to_string()),
            ),
            _ => (None, None),
        };

        Ok(ProvisionOutcome {
            id,
            name,
            image,
            port,
            note,
            original_port,
        })
    }

    fn advance(&self, from: Stage, to: Stage) -> Stage {
        debug!(from = %from, stage = %to, "Provisioning stage");
        to
    }

    fn failure(&self, error: RuntimeError) -> ProvisionError {
        ProvisionError::from_classified(self.classifier.classify_runtime(&error))
    }

    async fn ensure_image(&self, runtime: &RuntimeLease, image: &str) -> Result<()> {
        let wanted = normalize_image_reference(image);

        match runtime.list_images().await {
            Ok(images) => {
                let present = images.iter().any(|i| {
                    i.repo_tags
                        .iter()
                        .any(|t| normalize_image_reference(t) == wanted)
                });
                if present {
                    debug!(stage = %Stage::ImageResolving, image = %wanted, "Image present locally, skipping pull");
                    return Ok(());
                }
            }
            Err(e) if e.is_unreachable() => return Err(self.failure(e)),
            Err(e) => warn!("Failed to list images, pulling {} anyway: {}", wanted, e),
        }

        info!(stage = %Stage::ImageResolving, image = %wanted, "Pulling image");
        runtime.pull_image(&wanted).await.map_err(|e| {
            let classified = self.classifier.classify_runtime(&e);
            if classified.is(ErrorKind::DaemonUnreachable) {
                ProvisionError::DaemonUnreachable(classified.raw_message)
            } else {
                ProvisionError::ImageResolutionFailed {
                    image: wanted.clone(),
                    error: classified.with_kind(ErrorKind::ImageResolutionFailed),
                }
            }
        })
    }

    /// Create the container, retrying once with a nanosecond suffix on a name conflict
    async fn create(&self, runtime: &RuntimeLease, spec: ContainerSpec) -> Result<(String, String)> {
        let first = Self::create_detached(runtime, spec.clone()).await;

        let error = match first {
            Ok(id) => return Ok((id, spec.name)),
            Err(e) => self.classifier.classify_runtime(&e),
        };

        match error.kind {
            ErrorKind::NameConflict => {
                let retry = ContainerSpec {
                    name: names::retry_name(&spec.name, (self.clock)()),
                    ..spec
                };
                warn!(
                    stage = %Stage::Creating,
                    container = %retry.name,
                    "Container name taken, retrying once"
                );

                match Self::create_detached(runtime, retry.clone()).await {
                    Ok(id) => Ok((id, retry.name)),
                    Err(e) => Err(self.create_failure(e)),
                }
            }
            ErrorKind::DaemonUnreachable => Err(ProvisionError::DaemonUnreachable(error.raw_message)),
            _ => {
                warn!(stage = %Stage::Creating, kind = ?error.kind, "Container create failed: {}", error);
                Err(ProvisionError::CreateFailed(error))
            }
        }
    }

    fn create_failure(&self, error: RuntimeError) -> ProvisionError {
        let classified = self.classifier.classify_runtime(&error);
        if classified.is(ErrorKind::DaemonUnreachable) {
            ProvisionError::DaemonUnreachable(classified.raw_message)
        } else {
            ProvisionError::CreateFailed(classified)
        }
    }

    async fn create_detached(
        runtime: &RuntimeLease,
        spec: ContainerSpec,
    ) -> std::result::Result<String, RuntimeError> {
        let handle = runtime.handle();
        run_to_completion("create", async move { handle.create_container(&spec).await }).await
    }

    async fn start(&self, runtime: &RuntimeLease, id: &str) -> Result<()> {
        let handle = runtime.handle();
        let target = id.to_string();
        let started =
            run_to_completion("start", async move { handle.start_container(&target).await }).await;

        started.map_err(|e| {
            let classified = self.classifier.classify_runtime(&e);
            warn!(stage = %Stage::Starting, id = %id, kind = ?classified.kind, "Container start failed: {}", classified);

            let error = if classified.is(ErrorKind::PortConflict) {
                classified
            } else {
                classified.with_kind(ErrorKind::StartFailed)
            };
            ProvisionError::StartFailed {
                container_id: id.to_string(),
                error,
            }
        })
    }
}
