use crate::config::Config;
use crate::{build_state, provision_settings};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::time::Duration;

fn config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 9000,
        default_image: "redis:7".to_string(),
        extra_reserved_ports: vec![5432],
        pull_timeout: Duration::from_secs(30),
        stop_timeout_secs: 3,
        pool_connections: false,
        docker_bin: "podman".to_string(),
    }
}

#[test]
fn test_provision_settings_reserve_listen_port() {
    let settings = provision_settings(&config());

    assert_eq!(settings.default_image, "redis:7");
    assert_eq!(settings.reserved_ports, HashSet::from([9000, 5432]));
}

// Non-pooled mode defers connecting to the first lease, so no daemon is needed here
#[test]
fn test_build_state_without_daemon() {
    let state = build_state(&config()).unwrap();

    assert_eq!(state.stop_timeout_secs, 3);
    assert_eq!(state.docker_cli.binary(), "podman");
    assert_eq!(state.provisioner.settings().default_image, "redis:7");
}
