// ABOUTME: Shared handler state, cloned into every request
// ABOUTME: Holds only handles and settings; no container data is cached here

use dockyard_config::defaults::DEFAULT_STOP_TIMEOUT_SECS;
use dockyard_provisioning::{BulkExecutor, ProvisionSettings, Provisioner};
use dockyard_runtime::{DockerCli, Gateway};

#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
    pub provisioner: Provisioner,
    pub bulk: BulkExecutor,
    pub docker_cli: DockerCli,
    /// Grace period for `GET /stop/{id}`
    pub stop_timeout_secs: i64,
}

impl AppState {
    pub fn new(gateway: Gateway, settings: ProvisionSettings) -> Self {
        Self {
            provisioner: Provisioner::new(gateway.clone(), settings),
            bulk: BulkExecutor::new(gateway.clone()),
            gateway,
            docker_cli: DockerCli::default(),
            stop_timeout_secs: DEFAULT_STOP_TIMEOUT_SECS,
        }
    }

    pub fn with_docker_cli(mut self, docker_cli: DockerCli) -> Self {
        self.docker_cli = docker_cli;
        self
    }

    pub fn with_stop_timeout(mut self, secs: i64) -> Self {
        self.stop_timeout_secs = secs;
        self
    }
}
