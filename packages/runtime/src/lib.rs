// ABOUTME: Container runtime gateway for Dockyard
// ABOUTME: Typed daemon operations, scoped leases and failure classification

pub mod classify;
pub mod docker;
pub mod docker_cli;
pub mod error;
pub mod gateway;
pub mod provider;
pub mod types;

pub use classify::{ClassifiedError, ErrorClassifier, ErrorKind, ErrorMatcher};
pub use docker::DockerRuntime;
pub use docker_cli::{CliOutput, DockerCli};
pub use error::{Result, RuntimeError};
pub use gateway::{
    run_to_completion, DockerConnector, Gateway, RuntimeConnector, RuntimeLease, SharedRuntime,
};
pub use provider::ContainerRuntime;
pub use types::{
    normalize_image_reference, strip_name_separator, ContainerDetails, ContainerSpec,
    ContainerState, ContainerSummary, ImageSearchResult, ImageSummary, NetworkSummary,
    PortBinding, PublishedPort, VolumeSummary,
};
