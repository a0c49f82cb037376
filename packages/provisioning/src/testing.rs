// Shared mocks and fixtures for unit tests

use async_trait::async_trait;
use mockall::mock;

use dockyard_runtime::{
    ContainerDetails, ContainerRuntime, ContainerSpec, ContainerState, ContainerSummary,
    ImageSearchResult, ImageSummary, NetworkSummary, PublishedPort, Result, VolumeSummary,
};

mock! {
    pub Runtime {}

    #[async_trait]
    impl ContainerRuntime for Runtime {
        async fn ping(&self) -> Result<()>;
        async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>>;
        async fn inspect_container(&self, id: &str) -> Result<ContainerDetails>;
        async fn create_container(&self, spec: &ContainerSpec) -> Result<String>;
        async fn start_container(&self, id: &str) -> Result<()>;
        async fn stop_container(&self, id: &str, timeout_secs: i64) -> Result<()>;
        async fn remove_container(&self, id: &str, force: bool) -> Result<()>;
        async fn restart_container(&self, id: &str, timeout_secs: i64) -> Result<()>;
        async fn list_images(&self) -> Result<Vec<ImageSummary>>;
        async fn pull_image(&self, reference: &str) -> Result<()>;
        async fn remove_image(&self, reference: &str, force: bool) -> Result<()>;
        async fn search_images(&self, term: &str, limit: u64) -> Result<Vec<ImageSearchResult>>;
        async fn exec(&self, id: &str, command: Vec<String>) -> Result<Vec<u8>>;
        async fn logs(&self, id: &str, tail: &str) -> Result<Vec<u8>>;
        async fn list_networks(&self) -> Result<Vec<NetworkSummary>>;
        async fn list_volumes(&self) -> Result<Vec<VolumeSummary>>;
    }
}

pub fn image_tagged(tag: &str) -> ImageSummary {
    ImageSummary {
        id: format!("sha256:{:0>64}", tag.len()),
        repo_tags: vec![tag.to_string()],
        size: 0,
        created: 0,
        containers: 0,
    }
}

pub fn container_with(name: &str, host_ports: &[u16]) -> ContainerSummary {
    ContainerSummary {
        id: format!("{:0>64}", name),
        names: vec![format!("/{}", name)],
        image: "nginx:latest".to_string(),
        state: ContainerState::Running,
        status: "Up".to_string(),
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
    }
}
