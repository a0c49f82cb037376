// ABOUTME: Runtime trait every container backend implements
// ABOUTME: Defines the typed operations the orchestrator and HTTP layer issue against the daemon

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    ContainerDetails, ContainerSpec, ContainerSummary, ImageSearchResult, ImageSummary,
    NetworkSummary, VolumeSummary,
};

/// Operations exposed by a container runtime daemon
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Liveness probe. Any failure is reported as `RuntimeError::Unreachable`.
    async fn ping(&self) -> Result<()>;

    /// List containers; `all` includes stopped ones
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>>;

    async fn inspect_container(&self, id: &str) -> Result<ContainerDetails>;

    /// Create a container and return its id
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String>;

    async fn start_container(&self, id: &str) -> Result<()>;

    /// Stop a container, killing it after `timeout_secs`
    async fn stop_container(&self, id: &str, timeout_secs: i64) -> Result<()>;

    async fn remove_container(&self, id: &str, force: bool) -> Result<()>;

    async fn restart_container(&self, id: &str, timeout_secs: i64) -> Result<()>;

    async fn list_images(&self) -> Result<Vec<ImageSummary>>;

    /// Pull an image, consuming the progress stream to completion
    async fn pull_image(&self, reference: &str) -> Result<()>;

    async fn remove_image(&self, reference: &str, force: bool) -> Result<()>;

    async fn search_images(&self, term: &str, limit: u64) -> Result<Vec<ImageSearchResult>>;

    /// Run a command inside a container and return its combined output
    async fn exec(&self, id: &str, command: Vec<String>) -> Result<Vec<u8>>;

    /// Fetch the last `tail` log lines (stdout and stderr, timestamped)
    async fn logs(&self, id: &str, tail: &str) -> Result<Vec<u8>>;

    async fn list_networks(&self) -> Result<Vec<NetworkSummary>>;

    async fn list_volumes(&self) -> Result<Vec<VolumeSummary>>;
}
