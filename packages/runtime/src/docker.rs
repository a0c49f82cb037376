// ABOUTME: Docker implementation of the container runtime trait
// ABOUTME: Uses the bollard library to talk to the local Docker Engine API

use crate::error::{Result, RuntimeError};
use crate::provider::ContainerRuntime;
use crate::types::{
    normalize_image_reference, strip_name_separator, ContainerDetails, ContainerSpec,
    ContainerState, ContainerSummary, ImageSearchResult, ImageSummary, NetworkSummary,
    PublishedPort, VolumeSummary,
};
use async_trait::async_trait;
use bollard::{
    container::{
        Config, CreateContainerOptions, ListContainersOptions, LogOutput, LogsOptions,
        RemoveContainerOptions, RestartContainerOptions, StartContainerOptions,
        StopContainerOptions,
    },
    errors::Error as BollardError,
    exec::{CreateExecOptions, StartExecResults},
    image::{CreateImageOptions, ListImagesOptions, RemoveImageOptions, SearchImagesOptions},
    models::{HostConfig, PortBinding as BollardPortBinding},
    network::ListNetworksOptions,
    volume::ListVolumesOptions,
    Docker,
};
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

pub struct DockerRuntime {
    client: Docker,
    /// Timeout for image pull operations, stream drain included
    pull_timeout: Duration,
}

impl DockerRuntime {
    /// Connect using `DOCKER_HOST` or the platform default socket
    pub fn connect_with_defaults(pull_timeout: Duration) -> Result<Self> {
        let client = Docker::connect_with_defaults()
            .map_err(|e| RuntimeError::Unreachable(e.to_string()))?;

        Ok(Self::with_client(client, pull_timeout))
    }

    /// Wrap an existing bollard client
    pub fn with_client(client: Docker, pull_timeout: Duration) -> Self {
        Self {
            client,
            pull_timeout,
        }
    }

    fn to_bollard_config(spec: &ContainerSpec) -> Config<String> {
        let mut exposed_ports = HashMap::new();
        let mut port_bindings = HashMap::new();

        if let Some(binding) = &spec.port_binding {
            let container_port = binding.exposed_port();
            exposed_ports.insert(container_port.clone(), HashMap::new());
            port_bindings.insert(
                container_port,
                Some(vec![BollardPortBinding {
                    host_ip: Some("0.0.0.0".to_string()),
                    host_port: Some(binding.host_port.to_string()),
                }]),
            );
        }

        let host_config = HostConfig {
            port_bindings: if port_bindings.is_empty() {
                None
            } else {
                Some(port_bindings)
            },
            ..Default::default()
        };

        Config {
            image: Some(spec.image.clone()),
            tty: Some(spec.tty),
            exposed_ports: if exposed_ports.is_empty() {
                None
            } else {
                Some(exposed_ports)
            },
            host_config: Some(host_config),
            ..Default::default()
        }
    }

    fn collect_output(output: LogOutput, buffer: &mut Vec<u8>) {
        match output {
            LogOutput::StdOut { message }
            | LogOutput::StdErr { message }
            | LogOutput::Console { message } => buffer.extend_from_slice(&message),
            LogOutput::StdIn { .. } => {}
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn ping(&self) -> Result<()> {
        self.client
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| RuntimeError::Unreachable(e.to_string()))
    }

    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>> {
        let options = ListContainersOptions::<String> {
            all,
            ..Default::default()
        };

        let containers = self.client.list_containers(Some(options)).await?;

        Ok(containers
            .into_iter()
            .map(|c| ContainerSummary {
                id: c.id.unwrap_or_default(),
                names: c.names.unwrap_or_default(),
                image: c.image.unwrap_or_default(),
                state: c
                    .state
                    .as_deref()
                    .map(ContainerState::from_daemon)
                    .unwrap_or(ContainerState::Other),
                status: c.status.unwrap_or_default(),
                ports: c
                    .ports
                    .unwrap_or_default()
                    .into_iter()
                    .map(|p| PublishedPort {
                        private_port: p.private_port,
                        public_port: p.public_port,
                        ip: p.ip,
                        protocol: p.typ.map(|t| t.to_string()),
                    })
                    .collect(),
                created: c.created.unwrap_or(0),
            })
            .collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails> {
        let inspect = self.client.inspect_container(id, None).await?;

        let state = inspect.state.as_ref();
        let running = state.and_then(|s| s.running).unwrap_or(false);
        let status = state
            .and_then(|s| s.status.as_ref())
            .map(|s| s.as_ref().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(ContainerDetails {
            id: inspect.id.unwrap_or_else(|| id.to_string()),
            name: inspect
                .name
                .as_deref()
                .map(strip_name_separator)
                .unwrap_or(id)
                .to_string(),
            running,
            status,
        })
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        info!("Creating container {} from {}", spec.name, spec.image);

        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };

        let response = self
            .client
            .create_container(Some(options), Self::to_bollard_config(spec))
            .await?;

        for warning in &response.warnings {
            debug!("Create warning for {}: {}", spec.name, warning);
        }

        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        info!("Starting container: {}", id);

        match self
            .client
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
        {
            Ok(_) => Ok(()),
            // Already running is not an error
            Err(BollardError::DockerResponseServerError {
                status_code: 304, ..
            }) => {
                debug!("Container {} already running", id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn stop_container(&self, id: &str, timeout_secs: i64) -> Result<()> {
        info!("Stopping container: {} (timeout: {}s)", id, timeout_secs);

        let options = StopContainerOptions { t: timeout_secs };

        match self.client.stop_container(id, Some(options)).await {
            Ok(_) => Ok(()),
            // Container already stopped is not an error
            Err(BollardError::DockerResponseServerError {
                status_code: 304, ..
            }) => {
                debug!("Container {} already stopped", id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<()> {
        info!("Removing container: {} (force: {})", id, force);

        let options = RemoveContainerOptions {
            force,
            ..Default::default()
        };

        self.client.remove_container(id, Some(options)).await?;
        Ok(())
    }

    async fn restart_container(&self, id: &str, timeout_secs: i64) -> Result<()> {
        info!("Restarting container: {} (timeout: {}s)", id, timeout_secs);

        let options = RestartContainerOptions {
            t: timeout_secs as isize,
        };

        self.client.restart_container(id, Some(options)).await?;
        Ok(())
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>> {
        let options = ListImagesOptions::<String> {
            all: false,
            ..Default::default()
        };

        let images = self.client.list_images(Some(options)).await?;

        Ok(images
            .into_iter()
            .map(|i| ImageSummary {
                id: i.id,
                repo_tags: i.repo_tags,
                size: i.size,
                created: i.created,
                containers: i.containers,
            })
            .collect())
    }

    async fn pull_image(&self, reference: &str) -> Result<()> {
        // An untagged fromImage would pull every tag of the repository
        let reference = normalize_image_reference(reference);

        info!(
            "Pulling image: {} (timeout: {:?})",
            reference, self.pull_timeout
        );

        let options = CreateImageOptions {
            from_image: reference.clone(),
            ..Default::default()
        };

        let stream = self.client.create_image(Some(options), None, None);

        let result = tokio::time::timeout(self.pull_timeout, async {
            let mut stream = stream;
            let mut last_status = String::new();

            while let Some(item) = stream.next().await {
                let info = item?;
                if let Some(error) = info.error {
                    return Err(RuntimeError::Stream(format!(
                        "Failed to pull image {}: {}",
                        reference, error
                    )));
                }
                if let Some(status) = info.status {
                    if status != last_status {
                        debug!("Pull status: {}", status);
                        last_status = status;
                    }
                }
            }

            Ok(())
        })
        .await;

        match result {
            Ok(Ok(())) => {
                info!("Successfully pulled image: {}", reference);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(RuntimeError::Timeout {
                operation: format!("pull of {}", reference),
                seconds: self.pull_timeout.as_secs(),
            }),
        }
    }

    async fn remove_image(&self, reference: &str, force: bool) -> Result<()> {
        info!("Removing image: {} (force: {})", reference, force);

        let options = RemoveImageOptions {
            force,
            ..Default::default()
        };

        self.client
            .remove_image(reference, Some(options), None)
            .await?;
        Ok(())
    }

    async fn search_images(&self, term: &str, limit: u64) -> Result<Vec<ImageSearchResult>> {
        let options = SearchImagesOptions {
            term: term.to_string(),
            limit: Some(limit),
            filters: HashMap::new(),
        };

        let results = self.client.search_images(options).await?;

        Ok(results
            .into_iter()
            .map(|r| ImageSearchResult {
                name: r.name.unwrap_or_default(),
                description: r.description.unwrap_or_default(),
                star_count: r.star_count.unwrap_or(0),
                is_official: r.is_official.unwrap_or(false),
                is_automated: r.is_automated.unwrap_or(false),
            })
            .collect())
    }

    async fn exec(&self, id: &str, command: Vec<String>) -> Result<Vec<u8>> {
        info!("Executing command in container {}: {:?}", id, command);

        let exec_config = CreateExecOptions {
            cmd: Some(command),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let exec = self.client.create_exec(id, exec_config).await?;
        let started = self.client.start_exec(&exec.id, None).await?;

        let mut output = Vec::new();
        match started {
            StartExecResults::Attached { output: mut stream, .. } => {
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.map_err(|e| RuntimeError::Stream(e.to_string()))?;
                    Self::collect_output(chunk, &mut output);
                }
            }
            StartExecResults::Detached => {
                return Err(RuntimeError::Stream(
                    "Exec was detached unexpectedly".to_string(),
                ))
            }
        }

        Ok(output)
    }

    async fn logs(&self, id: &str, tail: &str) -> Result<Vec<u8>> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            timestamps: true,
            tail: tail.to_string(),
            ..Default::default()
        };

        let mut stream = self.client.logs(id, Some(options));
        let mut output = Vec::new();

        while let Some(chunk) = stream.next().await {
            Self::collect_output(chunk?, &mut output);
        }

        Ok(output)
    }

    async fn list_networks(&self) -> Result<Vec<NetworkSummary>> {
        let networks = self
            .client
            .list_networks(None::<ListNetworksOptions<String>>)
            .await?;

        Ok(networks
            .into_iter()
            .map(|n| NetworkSummary {
                id: n.id.unwrap_or_default(),
                name: n.name.unwrap_or_default(),
                driver: n.driver.unwrap_or_default(),
                scope: n.scope.unwrap_or_default(),
            })
            .collect())
    }

    async fn list_volumes(&self) -> Result<Vec<VolumeSummary>> {
        let response = self
            .client
            .list_volumes(None::<ListVolumesOptions<String>>)
            .await?;

        Ok(response
            .volumes
            .unwrap_or_default()
            .into_iter()
            .map(|v| VolumeSummary {
                name: v.name,
                driver: v.driver,
                mountpoint: v.mountpoint,
                created_at: v.created_at,
            })
            .collect())
    }
}
