// ABOUTME: Host port parsing and allocation against reserved and published ports
// ABOUTME: Check-then-act: nothing is reserved, a lost race is classified after the fact

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Upper bound of both search ranges
pub const SEARCH_CEILING: u16 = 9999;

/// Start of the fallback search range
pub const FALLBACK_FLOOR: u16 = 8081;

/// A parsed `hostPort:containerPort` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRequest {
    pub host_port: u16,
    pub container_port: String,
}

impl PortRequest {
    /// Parse `"8080:80"`. Exactly two non-empty parts; the host side must be
    /// an integer in 1..=65535.
    pub fn parse(spec: &str) -> Result<Self, String> {
        let parts: Vec<&str> = spec.split(':').collect();
        if parts.len() != 2 || parts.iter().any(|p| p.trim().is_empty()) {
            return Err(format!(
                "Invalid port format '{}'. Use 'hostPort:containerPort' (e.g. 8080:80)",
                spec
            ));
        }

        let host = parts[0].trim();
        let host_port = host
            .parse::<u32>()
            .ok()
            .filter(|p| (1..=65535).contains(p))
            .ok_or_else(|| {
                format!(
                    "Invalid host port '{}'. Must be a number between 1 and 65535",
                    host
                )
            })?;

        Ok(Self {
            host_port: host_port as u16,
            container_port: parts[1].trim().to_string(),
        })
    }
}

impl fmt::Display for PortRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host_port, self.container_port)
    }
}

/// No free port in any searched range
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("Port {requested} is in use and no free port was found in the searched ranges")]
pub struct PortExhausted {
    pub requested: u16,
    /// Inclusive `(from, to)` bounds, in search order
    pub scanned: Vec<(u16, u16)>,
    pub next_steps: Vec<String>,
}

/// Whether `port` is taken by the service itself or a container binding
pub fn in_use(port: u16, reserved: &HashSet<u16>, active: &HashSet<u16>) -> bool {
    reserved.contains(&port) || active.contains(&port)
}

/// Return `requested` when free, else the first free port searching
/// `requested+1..=9999` then `8081..=9999`.
pub fn resolve(
    requested: u16,
    reserved: &HashSet<u16>,
    active: &HashSet<u16>,
) -> Result<u16, PortExhausted> {
    if !in_use(requested, reserved, active) {
        return Ok(requested);
    }

    let first_from = u32::from(requested) + 1;
    let first_to = u32::from(SEARCH_CEILING);

    let free = |p: &u32| !in_use(*p as u16, reserved, active);

    if let Some(port) = (first_from..=first_to).find(free) {
        return Ok(port as u16);
    }

    // Ports at or above first_from were just scanned
    let fallback_to = first_to.min(first_from - 1);
    if let Some(port) = (u32::from(FALLBACK_FLOOR)..=fallback_to).find(free) {
        return Ok(port as u16);
    }

    Err(PortExhausted {
        requested,
        scanned: vec![
            (
                requested.saturating_add(1).min(SEARCH_CEILING),
                SEARCH_CEILING,
            ),
            (FALLBACK_FLOOR, SEARCH_CEILING),
        ],
        next_steps: vec![
            format!("Stop the process or container using port {}", requested),
            "Choose a different host port".to_string(),
            "Leave the port field empty to create the container without a port binding"
                .to_string(),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn set(ports: &[u16]) -> HashSet<u16> {
        ports.iter().copied().collect()
    }

    #[rstest]
    #[case(3000)]
    #[case(8081)]
    #[case(65535)]
    fn test_free_port_returned_unchanged(#[case] port: u16) {
        assert_eq!(resolve(port, &set(&[8080]), &set(&[9000])), Ok(port));
    }

    #[test]
    fn test_reserved_port_moves_up() {
        let reserved = set(&[8080]);
        let active = set(&[8081, 8082]);

        let port = resolve(8080, &reserved, &active).unwrap();
        assert_eq!(port, 8083);
        assert!(!in_use(port, &reserved, &active));
    }

    #[test]
    fn test_published_port_counts_as_in_use() {
        assert_eq!(resolve(3000, &set(&[]), &set(&[3000])), Ok(3001));
    }

    #[test]
    fn test_fallback_range_used_above_ceiling() {
        // 9999 taken, first range is empty, fallback starts at 8081
        assert_eq!(resolve(9999, &set(&[8080]), &set(&[9999, 8081])), Ok(8082));
        assert_eq!(resolve(20000, &set(&[]), &set(&[20000])), Ok(8081));
    }

    #[test]
    fn test_exhausted_when_both_ranges_full() {
        let active: HashSet<u16> = (8081..=9999).collect();
        let err = resolve(8080, &set(&[8080]), &active).unwrap_err();

        assert_eq!(err.requested, 8080);
        assert_eq!(err.scanned, vec![(8081, 9999), (8081, 9999)]);
        assert_eq!(err.next_steps.len(), 3);
    }

    #[test]
    fn test_exhausted_high_request() {
        let active: HashSet<u16> = (8081..=9999).chain([12000]).collect();
        let err = resolve(12000, &set(&[]), &active).unwrap_err();
        assert_eq!(err.scanned[0], (9999, 9999));
    }

    #[rstest]
    #[case("8080:80", 8080, "80")]
    #[case("1:53/udp", 1, "53/udp")]
    #[case(" 9000 : 9000 ", 9000, "9000")]
    fn test_parse_valid(#[case] spec: &str, #[case] host: u16, #[case] container: &str) {
        let parsed = PortRequest::parse(spec).unwrap();
        assert_eq!(parsed.host_port, host);
        assert_eq!(parsed.container_port, container);
    }

    #[rstest]
    #[case("8080")]
    #[case("8080:")]
    #[case(":80")]
    #[case("a:b:c")]
    #[case("web:80")]
    #[case("0:80")]
    #[case("70000:80")]
    fn test_parse_invalid(#[case] spec: &str) {
        assert!(PortRequest::parse(spec).is_err());
    }
}
