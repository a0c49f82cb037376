// ABOUTME: Container name resolution against the names the daemon currently knows
// ABOUTME: Advisory only, the daemon stays the source of truth for uniqueness

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use dockyard_runtime::{strip_name_separator, ContainerSummary};

/// Names of every known container, leading `/` stripped
pub fn existing_names(containers: &[ContainerSummary]) -> HashSet<String> {
    containers
        .iter()
        .flat_map(|c| c.display_names())
        .map(str::to_string)
        .collect()
}

/// Pick a name that is not in `existing`.
///
/// Absent or blank requests get `container-<unix seconds>`. A colliding
/// request gets `-<unix seconds>` appended, bumped until it is unused.
pub fn resolve(requested: Option<&str>, existing: &HashSet<String>, now: DateTime<Utc>) -> String {
    let requested = requested
        .map(str::trim)
        .map(strip_name_separator)
        .filter(|n| !n.is_empty());

    let base = match requested {
        Some(name) if !existing.contains(name) => return name.to_string(),
        Some(name) => name.to_string(),
        None => "container".to_string(),
    };

    let mut suffix = now.timestamp();
    loop {
        let candidate = format!("{}-{}", base, suffix);
        if !existing.contains(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Name used for the single retry after the daemon reports a name conflict
pub fn retry_name(name: &str, now: DateTime<Utc>) -> String {
    let nanos = now
        .timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp().saturating_mul(1_000_000_000));
    format!("{}-{}", name, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    fn names(list: &[&str]) -> HashSet<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_free_name_is_kept() {
        assert_eq!(resolve(Some("web"), &names(&["db"]), at(100)), "web");
    }

    #[test]
    fn test_absent_name_is_synthesised() {
        assert_eq!(resolve(None, &names(&[]), at(1700000000)), "container-1700000000");
        assert_eq!(resolve(Some("  "), &names(&[]), at(5)), "container-5");
    }

    #[test]
    fn test_colliding_name_gets_timestamp_suffix() {
        let existing = names(&["web"]);
        let resolved = resolve(Some("web"), &existing, at(1700000000));

        assert_eq!(resolved, "web-1700000000");
        assert!(!existing.contains(&resolved));
    }

    #[test]
    fn test_suffix_bumped_until_unused() {
        let existing = names(&["web", "web-100", "web-101"]);
        assert_eq!(resolve(Some("web"), &existing, at(100)), "web-102");
    }

    #[test]
    fn test_leading_separator_ignored() {
        let existing = names(&["web"]);
        assert_eq!(resolve(Some("/web"), &existing, at(7)), "web-7");
    }

    #[test]
    fn test_retry_name_uses_nanoseconds() {
        let now = Utc.timestamp_opt(2, 5).single().unwrap();
        assert_eq!(retry_name("web", now), "web-2000000005");
    }
}
