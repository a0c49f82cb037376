// ABOUTME: Docker CLI wrapper for operations the Engine API client does not cover in one call
// ABOUTME: Runs the docker binary asynchronously and captures its output

use anyhow::{bail, Context, Result};
use dockyard_config::defaults::DEFAULT_DOCKER_BIN;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info};

/// Captured result of a docker CLI invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CliOutput {
    /// stdout followed by stderr, as a terminal would show them
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) if self.stdout.ends_with('\n') => {
                format!("{}{}", self.stdout, self.stderr)
            }
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Remove stopped containers, dangling images, unused networks and build cache
    pub async fn system_prune(&self) -> Result<CliOutput> {
        info!("Running {} system prune -f", self.binary);
        self.run(&["system", "prune", "-f"]).await
    }

    /// Server version reported by the daemon, `None` when it cannot be queried
    pub async fn server_version(&self) -> Option<String> {
        match self
            .run(&["version", "--format", "{{.Server.Version}}"])
            .await
        {
            Ok(output) => {
                let version = output.stdout.trim().to_string();
                (!version.is_empty()).then_some(version)
            }
            Err(e) => {
                debug!("Could not read docker server version: {}", e);
                None
            }
        }
    }

    async fn run(&self, args: &[&str]) -> Result<CliOutput> {
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.binary))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            bail!(
                "{} {} failed: {}",
                self.binary,
                args.join(" "),
                if stderr.trim().is_empty() {
                    stdout.trim()
                } else {
                    stderr.trim()
                }
            );
        }

        Ok(CliOutput { stdout, stderr })
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new(DEFAULT_DOCKER_BIN)
    }
}
