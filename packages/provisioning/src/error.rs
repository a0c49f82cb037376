// ABOUTME: Failure taxonomy for the provisioning workflow
// ABOUTME: Every variant carries what the HTTP layer needs to build a structured response

use thiserror::Error;

use crate::ports::PortExhausted;
use dockyard_runtime::{ClassifiedError, ErrorKind};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    /// Malformed request, rejected before any daemon call
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    DaemonUnreachable(String),

    #[error(transparent)]
    PortExhausted(#[from] PortExhausted),

    #[error("Failed to pull image {image}: {error}")]
    ImageResolutionFailed {
        image: String,
        error: ClassifiedError,
    },

    /// A read the workflow depends on failed (container list, ...)
    #[error("{0}")]
    Runtime(ClassifiedError),

    /// Create rejected by the daemon, after the name-conflict retry if one applied
    #[error("Failed to create container: {0}")]
    CreateFailed(ClassifiedError),

    /// The container exists but could not be started
    #[error("Failed to start container: {error}")]
    StartFailed {
        container_id: String,
        error: ClassifiedError,
    },
}

impl ProvisionError {
    /// Wrap a classified failure, promoting unreachable daemons to their own variant
    pub fn from_classified(error: ClassifiedError) -> Self {
        if error.is(ErrorKind::DaemonUnreachable) {
            ProvisionError::DaemonUnreachable(error.raw_message)
        } else {
            ProvisionError::Runtime(error)
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ProvisionError::InvalidRequest(_) | ProvisionError::PortExhausted(_) => None,
            ProvisionError::DaemonUnreachable(_) => Some(ErrorKind::DaemonUnreachable),
            ProvisionError::ImageResolutionFailed { error, .. }
            | ProvisionError::Runtime(error)
            | ProvisionError::CreateFailed(error)
            | ProvisionError::StartFailed { error, .. } => Some(error.kind),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
