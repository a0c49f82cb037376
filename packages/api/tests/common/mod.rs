// In-memory container runtime for driving the router without a daemon

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use dockyard_api::{create_router, AppState};
use dockyard_provisioning::ProvisionSettings;
use dockyard_runtime::{
    ContainerDetails, ContainerRuntime, ContainerSpec, ContainerState, ContainerSummary, DockerCli, Gateway,
    ImageSearchResult, ImageSummary, NetworkSummary, PublishedPort, Result, RuntimeError,
    VolumeSummary,
};

#[derive(Default)]
pub struct FakeRuntime {
    pub containers: Mutex<Vec<ContainerSummary>>,
    pub images: Mutex<Vec<ImageSummary>>,
    pub pulled: Mutex<Vec<String>>,
    pub down: AtomicBool,
    next_id: AtomicU64,
}

impl FakeRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_image(self: Arc<Self>, tag: &str) -> Arc<Self> {
        let n = self.images.lock().unwrap().len();
        self.images.lock().unwrap().push(ImageSummary {
            id: format!("sha256:{:064x}", 0xabc000 + n),
            repo_tags: vec![tag.to_string()],
            size: 1024,
            created: 0,
            containers: 0,
        });
        self
    }

    /// Add a container directly, returning its id
    pub fn seed(&self, name: &str, state: ContainerState, host_ports: &[u16]) -> String {
        let id = format!("{:064x}", 0xc0ffee00 + self.next_id.fetch_add(1, Ordering::SeqCst));
        self.containers.lock().unwrap().push(ContainerSummary {
            id: id.clone(),
            names: vec![format!("/{}", name)],
            image: "nginx:latest".to_string(),
            state,
            status: String::new(),
            ports: host_ports
                .iter()
                .map(|p| PublishedPort {
                    private_port: 80,
                    public_port: Some(*p),
                    ip: Some("0.0.0.0".to_string()),
                    protocol: Some("tcp".to_string()),
                })
                .collect(),
            created: 0,
        });
        id
    }

    pub fn state_of(&self, name: &str) -> Option<ContainerState> {
        let containers = self.containers.lock().unwrap();
        containers
            .iter()
            .find(|c| c.primary_name() == Some(name))
            .map(|c| c.state)
    }

    pub fn names(&self) -> Vec<String> {
        self.containers
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| c.primary_name().map(str::to_string))
            .collect()
    }

    fn position(containers: &[ContainerSummary], reference: &str) -> Result<usize> {
        containers
            .iter()
            .position(|c| {
                c.id == reference
                    || (reference.len() >= 12 && c.id.starts_with(reference))
                    || c.primary_name() == Some(reference)
            })
            .ok_or_else(|| RuntimeError::NotFound(format!("No such container: {}", reference)))
    }

    fn set_state(&self, reference: &str, state: ContainerState) -> Result<()> {
        let mut containers = self.containers.lock().unwrap();
        let index = Self::position(&containers, reference)?;
        containers[index].state = state;
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn ping(&self) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(RuntimeError::Unreachable(
                "dial unix /var/run/docker.sock: connect: no such file or directory".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>> {
        let containers = self.containers.lock().unwrap();
        Ok(containers
            .iter()
            .filter(|c| all || c.state == ContainerState::Running)
            .cloned()
            .collect())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails> {
        let containers = self.containers.lock().unwrap();
        let c = &containers[Self::position(&containers, id)?];
        Ok(ContainerDetails {
            id: c.id.clone(),
            name: c.primary_name().unwrap_or_default().to_string(),
            running: c.state == ContainerState::Running,
            status: format!("{:?}", c.state).to_lowercase(),
        })
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String> {
        let taken: HashSet<String> = self.names().into_iter().collect();
        if taken.contains(&spec.name) {
            return Err(RuntimeError::Conflict(format!(
                "Conflict. The container name \"/{}\" is already in use by container \"x\"",
                spec.name
            )));
        }

        let ports: Vec<u16> = spec.port_binding.iter().map(|b| b.host_port).collect();
        let id = self.seed(&spec.name, ContainerState::Created, &ports);
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.set_state(id, ContainerState::Running)
    }

    async fn stop_container(&self, id: &str, _timeout_secs: i64) -> Result<()> {
        self.set_state(id, ContainerState::Exited)
    }

    async fn remove_container(&self, id: &str, _force: bool) -> Result<()> {
        let mut containers = self.containers.lock().unwrap();
        let index = Self::position(&containers, id)?;
        containers.remove(index);
        Ok(())
    }

    async fn restart_container(&self, id: &str, _timeout_secs: i64) -> Result<()> {
        self.set_state(id, ContainerState::Running)
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>> {
        Ok(self.images.lock().unwrap().clone())
    }

    async fn pull_image(&self, reference: &str) -> Result<()> {
        if reference.starts_with("missing") {
            return Err(RuntimeError::NotFound(format!(
                "pull access denied for {}, repository does not exist",
                reference
            )));
        }
        self.pulled.lock().unwrap().push(reference.to_string());
        Ok(())
    }

    async fn remove_image(&self, reference: &str, _force: bool) -> Result<()> {
        let mut images = self.images.lock().unwrap();
        match images
            .iter()
            .position(|i| i.id == reference || i.repo_tags.iter().any(|t| t == reference))
        {
            Some(index) => {
                images.remove(index);
                Ok(())
            }
            None => Err(RuntimeError::NotFound(format!(
                "No such image: {}",
                reference
            ))),
        }
    }

    async fn search_images(&self, term: &str, limit: u64) -> Result<Vec<ImageSearchResult>> {
        let catalogue = ["nginx", "nginx-proxy", "redis"];
        Ok(catalogue
            .iter()
            .filter(|n| n.contains(term))
            .take(limit as usize)
            .map(|n| ImageSearchResult {
                name: n.to_string(),
                description: String::new(),
                star_count: 1,
                is_official: *n == "nginx",
                is_automated: false,
            })
            .collect())
    }

    async fn exec(&self, id: &str, command: Vec<String>) -> Result<Vec<u8>> {
        {
            let containers = self.containers.lock().unwrap();
            Self::position(&containers, id)?;
        }
        Ok(command.join(" ").into_bytes())
    }

    async fn logs(&self, id: &str, tail: &str) -> Result<Vec<u8>> {
        {
            let containers = self.containers.lock().unwrap();
            Self::position(&containers, id)?;
        }
        Ok(format!("2024-01-01T00:00:00Z tail={}\n", tail).into_bytes())
    }

    async fn list_networks(&self) -> Result<Vec<NetworkSummary>> {
        Ok(vec![NetworkSummary {
            id: "net1".to_string(),
            name: "bridge".to_string(),
            driver: "bridge".to_string(),
            scope: "local".to_string(),
        }])
    }

    async fn list_volumes(&self) -> Result<Vec<VolumeSummary>> {
        Ok(vec![])
    }
}

/// Router over a fake runtime, with 8080 as the service's own port
/// Router over the fake runtime; the docker CLI is `true`, which prints nothing
pub fn app(runtime: Arc<FakeRuntime>) -> Router {
    app_with_cli(runtime, DockerCli::new("true"))
}

pub fn app_with_cli(runtime: Arc<FakeRuntime>, docker_cli: DockerCli) -> Router {
    let settings = ProvisionSettings {
        default_image: "nginx:latest".to_string(),
        reserved_ports: HashSet::from([8080]),
    };
    create_router(AppState::new(Gateway::shared(runtime), settings).with_docker_cli(docker_cli))
}

pub async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
