// ABOUTME: Error types for container runtime operations
// ABOUTME: Maps bollard failures onto a small typed taxonomy the orchestrator can reason about

use bollard::errors::Error as BollardError;
use thiserror::Error;

use crate::classify::is_daemon_unreachable;

/// Main error type for runtime gateway operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The daemon socket could not be reached or did not answer a ping
    #[error("Cannot connect to the Docker daemon. Is the docker daemon running? ({0})")]
    Unreachable(String),

    /// The daemon answered 404 for the requested container or image
    #[error("{0}")]
    NotFound(String),

    /// The daemon answered 409 (name already taken, image in use, ...)
    #[error("{0}")]
    Conflict(String),

    /// The daemon answered 304: the resource is already in the requested state
    #[error("{0}")]
    NotModified(String),

    /// Any other daemon response error, message passed through verbatim
    #[error("{message}")]
    Api { status: u16, message: String },

    /// A streamed response (pull, logs, exec) failed midway
    #[error("Stream error: {0}")]
    Stream(String),

    /// Operation exceeded its deadline
    #[error("{operation} timed out after {seconds} seconds")]
    Timeout { operation: String, seconds: u64 },

    /// A detached runtime call panicked or was aborted
    #[error("Runtime task aborted during {0}")]
    TaskAborted(String),
}

impl RuntimeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RuntimeError::NotFound(_))
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, RuntimeError::Unreachable(_))
    }
}

impl From<BollardError> for RuntimeError {
    fn from(err: BollardError) -> Self {
        match err {
            BollardError::DockerResponseServerError {
                status_code,
                message,
            } => match status_code {
                304 => RuntimeError::NotModified(message),
                404 => RuntimeError::NotFound(message),
                409 => RuntimeError::Conflict(message),
                _ => RuntimeError::Api {
                    status: status_code,
                    message,
                },
            },
            e @ BollardError::IOError { .. } => RuntimeError::Unreachable(e.to_string()),
            other => {
                let message = other.to_string();
                if is_daemon_unreachable(&message) {
                    RuntimeError::Unreachable(message)
                } else {
                    RuntimeError::Api {
                        status: 500,
                        message,
                    }
                }
            }
        }
    }
}

/// Type alias for Results that return RuntimeError
pub type Result<T> = std::result::Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error(status_code: u16, message: &str) -> BollardError {
        BollardError::DockerResponseServerError {
            status_code,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_status_codes_map_to_typed_variants() {
        assert_eq!(
            RuntimeError::from(server_error(404, "No such container: web")),
            RuntimeError::NotFound("No such container: web".to_string())
        );
        assert_eq!(
            RuntimeError::from(server_error(409, "name in use")),
            RuntimeError::Conflict("name in use".to_string())
        );
        assert_eq!(
            RuntimeError::from(server_error(304, "")),
            RuntimeError::NotModified(String::new())
        );
    }

    #[test]
    fn test_other_status_keeps_daemon_message() {
        let err = RuntimeError::from(server_error(500, "driver failed programming"));
        assert_eq!(err.to_string(), "driver failed programming");
        assert!(matches!(err, RuntimeError::Api { status: 500, .. }));
    }

    #[test]
    fn test_io_error_is_unreachable() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "docker.sock missing");
        let err = RuntimeError::from(BollardError::IOError { err: io });
        assert!(err.is_unreachable());
        assert!(err.to_string().contains("Is the docker daemon running"));
    }
}
