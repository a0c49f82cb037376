use std::collections::HashSet;
use std::num::ParseIntError;
use std::time::Duration;
use thiserror::Error;

use dockyard_config::constants::{
    DOCKYARD_DEFAULT_IMAGE, DOCKYARD_DOCKER_BIN, DOCKYARD_HOST, DOCKYARD_POOL_CONNECTIONS,
    DOCKYARD_PORT, DOCKYARD_PULL_TIMEOUT_SECS, DOCKYARD_RESERVED_PORTS,
    DOCKYARD_STOP_TIMEOUT_SECS, PORT,
};
use dockyard_config::defaults::{
    DEFAULT_DOCKER_BIN, DEFAULT_HOST, DEFAULT_IMAGE, DEFAULT_POOL_CONNECTIONS, DEFAULT_PORT,
    DEFAULT_PULL_TIMEOUT_SECS, DEFAULT_STOP_TIMEOUT_SECS,
};
use dockyard_config::{non_empty_var, var_with_legacy};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid reserved port '{0}' in DOCKYARD_RESERVED_PORTS")]
    InvalidReservedPort(String),
    #[error("Invalid number '{value}' for {name}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("Invalid boolean '{value}' for {name} (expected true/false)")]
    InvalidBool { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub default_image: String,
    /// Extra reserved host ports; the listen port is added by [`Config::reserved_ports`]
    pub extra_reserved_ports: Vec<u16>,
    pub pull_timeout: Duration,
    pub stop_timeout_secs: i64,
    pub pool_connections: bool,
    pub docker_bin: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match var_with_legacy(DOCKYARD_PORT, PORT) {
            Some(value) => parse_port(&value)?,
            None => DEFAULT_PORT,
        };

        let host = non_empty_var(DOCKYARD_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string());

        let default_image =
            non_empty_var(DOCKYARD_DEFAULT_IMAGE).unwrap_or_else(|| DEFAULT_IMAGE.to_string());

        let extra_reserved_ports = match non_empty_var(DOCKYARD_RESERVED_PORTS) {
            Some(list) => parse_port_list(&list)?,
            None => Vec::new(),
        };

        let pull_timeout_secs = match non_empty_var(DOCKYARD_PULL_TIMEOUT_SECS) {
            Some(value) => value.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                name: DOCKYARD_PULL_TIMEOUT_SECS,
                value,
            })?,
            None => DEFAULT_PULL_TIMEOUT_SECS,
        };

        let stop_timeout_secs = match non_empty_var(DOCKYARD_STOP_TIMEOUT_SECS) {
            Some(value) => value
                .parse::<i64>()
                .ok()
                .filter(|secs| *secs >= 0)
                .ok_or(ConfigError::InvalidNumber {
                    name: DOCKYARD_STOP_TIMEOUT_SECS,
                    value,
                })?,
            None => DEFAULT_STOP_TIMEOUT_SECS,
        };

        let pool_connections = match non_empty_var(DOCKYARD_POOL_CONNECTIONS) {
            Some(value) => parse_bool(DOCKYARD_POOL_CONNECTIONS, value)?,
            None => DEFAULT_POOL_CONNECTIONS,
        };

        let docker_bin =
            non_empty_var(DOCKYARD_DOCKER_BIN).unwrap_or_else(|| DEFAULT_DOCKER_BIN.to_string());

        Ok(Config {
            host,
            port,
            default_image,
            extra_reserved_ports,
            pull_timeout: Duration::from_secs(pull_timeout_secs),
            stop_timeout_secs,
            pool_connections,
            docker_bin,
        })
    }

    /// Host ports the allocator never hands out, the listen port included
    pub fn reserved_ports(&self) -> HashSet<u16> {
        self.extra_reserved_ports
            .iter()
            .copied()
            .chain(std::iter::once(self.port))
            .collect()
    }
}

pub fn parse_port(value: &str) -> Result<u16, ConfigError> {
    let port = value.trim().parse::<u16>()?;
    if port == 0 {
        return Err(ConfigError::PortOutOfRange(port));
    }
    Ok(port)
}

pub(crate) fn parse_port_list(list: &str) -> Result<Vec<u16>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u16>()
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| ConfigError::InvalidReservedPort(s.to_string()))
        })
        .collect()
}

pub(crate) fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBool { name, value }),
    }
}
