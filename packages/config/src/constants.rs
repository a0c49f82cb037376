// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across Dockyard

// Listener Configuration
pub const DOCKYARD_PORT: &str = "DOCKYARD_PORT";
pub const DOCKYARD_HOST: &str = "DOCKYARD_HOST";
pub const PORT: &str = "PORT"; // Legacy

// Provisioning Configuration
pub const DOCKYARD_DEFAULT_IMAGE: &str = "DOCKYARD_DEFAULT_IMAGE";
pub const DOCKYARD_RESERVED_PORTS: &str = "DOCKYARD_RESERVED_PORTS";

// Runtime Client Configuration
pub const DOCKYARD_PULL_TIMEOUT_SECS: &str = "DOCKYARD_PULL_TIMEOUT_SECS";
pub const DOCKYARD_STOP_TIMEOUT_SECS: &str = "DOCKYARD_STOP_TIMEOUT_SECS";
pub const DOCKYARD_POOL_CONNECTIONS: &str = "DOCKYARD_POOL_CONNECTIONS";
pub const DOCKYARD_DOCKER_BIN: &str = "DOCKYARD_DOCKER_BIN";

// Read by bollard itself when choosing the daemon endpoint
pub const DOCKER_HOST: &str = "DOCKER_HOST";

// Logging
pub const RUST_LOG: &str = "RUST_LOG";
