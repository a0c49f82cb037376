// ABOUTME: Default values for every Dockyard setting
// ABOUTME: Shared by the CLI config loader and the provisioning core

/// Port the HTTP service listens on when nothing else is configured.
pub const DEFAULT_PORT: u16 = 8080;

pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Image used by `POST /create` when the request names none.
pub const DEFAULT_IMAGE: &str = "nginx:latest";

/// Upper bound on a single image pull, including draining the progress stream.
pub const DEFAULT_PULL_TIMEOUT_SECS: u64 = 600;

/// Grace period for single-container stop requests.
pub const DEFAULT_STOP_TIMEOUT_SECS: i64 = 10;

/// Grace period used by bulk stop and restart before the daemon kills the container.
pub const BULK_GRACE_TIMEOUT_SECS: i64 = 30;

pub const DEFAULT_POOL_CONNECTIONS: bool = true;

pub const DEFAULT_DOCKER_BIN: &str = "docker";

/// Default number of log lines returned by `GET /logs/{id}`.
pub const DEFAULT_LOG_TAIL: &str = "100";

/// Maximum number of registry search results.
pub const IMAGE_SEARCH_LIMIT: u64 = 25;
