// ABOUTME: Value types read from and sent to the container runtime
// ABOUTME: Request-scoped copies of daemon records, never cached between requests

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a container as reported by the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Running,
    Exited,
    Created,
    Paused,
    Other,
}

impl ContainerState {
    /// Convert the daemon's free-form state string
    pub fn from_daemon(state: &str) -> Self {
        match state.to_lowercase().as_str() {
            "running" => ContainerState::Running,
            "exited" => ContainerState::Exited,
            "created" => ContainerState::Created,
            "paused" => ContainerState::Paused,
            _ => ContainerState::Other,
        }
    }
}

/// A port published by a container. `public_port` is the host side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedPort {
    pub private_port: u16,
    pub public_port: Option<u16>,
    pub ip: Option<String>,
    pub protocol: Option<String>,
}

/// Container summary as returned by a list call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub id: String,
    /// Raw names as the daemon reports them, usually with a leading `/`
    pub names: Vec<String>,
    pub image: String,
    pub state: ContainerState,
    pub status: String,
    pub ports: Vec<PublishedPort>,
    pub created: i64,
}

impl ContainerSummary {
    /// First 12 characters of the id, the form `docker ps` prints
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }

    /// Names with the daemon's leading separator stripped
    pub fn display_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|n| strip_name_separator(n))
    }

    pub fn primary_name(&self) -> Option<&str> {
        self.display_names().next()
    }

    /// Host ports this container holds a binding record for
    pub fn host_ports(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports
            .iter()
            .filter_map(|p| p.public_port)
            .filter(|port| *port != 0)
    }
}

/// The subset of an inspect response the service needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDetails {
    pub id: String,
    pub name: String,
    pub running: bool,
    pub status: String,
}

/// Host-to-container port binding for a new container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    pub host_port: u16,
    /// Container side, kept as given ("80", "80/udp", ...)
    pub container_port: String,
}

impl PortBinding {
    pub fn new(host_port: u16, container_port: impl Into<String>) -> Self {
        Self {
            host_port,
            container_port: container_port.into(),
        }
    }

    /// Exposed-port key in the daemon's `port/protocol` form
    pub fn exposed_port(&self) -> String {
        if self.container_port.contains('/') {
            self.container_port.clone()
        } else {
            format!("{}/tcp", self.container_port)
        }
    }
}

impl fmt::Display for PortBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host_port, self.container_port)
    }
}

/// Everything needed to create a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub image: String,
    pub name: String,
    pub tty: bool,
    pub port_binding: Option<PortBinding>,
}

/// Local image record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub id: String,
    pub repo_tags: Vec<String>,
    pub size: i64,
    pub created: i64,
    pub containers: i64,
}

impl ImageSummary {
    /// Id without the `sha256:` digest prefix, truncated to 12 characters
    pub fn short_id(&self) -> &str {
        short_id(self.id.strip_prefix("sha256:").unwrap_or(&self.id))
    }
}

/// Registry search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSearchResult {
    pub name: String,
    pub description: String,
    pub star_count: i64,
    pub is_official: bool,
    pub is_automated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub id: String,
    pub name: String,
    pub driver: String,
    pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSummary {
    pub name: String,
    pub driver: String,
    pub mountpoint: String,
    pub created_at: Option<String>,
}

/// Strip the leading `/` the daemon puts in front of container names
pub fn strip_name_separator(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}

fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

/// Add the implicit `:latest` tag to an image reference.
///
/// References that already carry a tag or a digest are returned unchanged.
/// A registry port (`localhost:5000/app`) is not mistaken for a tag.
pub fn normalize_image_reference(reference: &str) -> String {
    let last_segment = reference.rsplit('/').next().unwrap_or(reference);
    if reference.contains('@') || last_segment.contains(':') {
        reference.to_string()
    } else {
        format!("{}:latest", reference)
    }
}
