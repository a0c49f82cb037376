// ABOUTME: Configuration constants and environment helpers for Dockyard
// ABOUTME: Keeps variable names and defaults in one place for every package

pub mod constants;
pub mod defaults;

use std::env;
use tracing::warn;

/// Read an environment variable, falling back to a legacy name.
///
/// Empty values are treated as unset. Reading the legacy name logs a
/// deprecation warning so operators can migrate.
pub fn var_with_legacy(primary: &str, legacy: &str) -> Option<String> {
    if let Some(value) = non_empty_var(primary) {
        return Some(value);
    }

    let value = non_empty_var(legacy)?;
    warn!(
        "Environment variable {} is deprecated, use {} instead",
        legacy, primary
    );
    Some(value)
}

/// Read an environment variable, ignoring empty values.
pub fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_wins_over_legacy() {
        env::set_var("DOCKYARD_TEST_PRIMARY_A", "9000");
        env::set_var("DOCKYARD_TEST_LEGACY_A", "7000");

        let value = var_with_legacy("DOCKYARD_TEST_PRIMARY_A", "DOCKYARD_TEST_LEGACY_A");
        assert_eq!(value.as_deref(), Some("9000"));

        env::remove_var("DOCKYARD_TEST_PRIMARY_A");
        env::remove_var("DOCKYARD_TEST_LEGACY_A");
    }

    #[test]
    fn test_legacy_used_when_primary_missing() {
        env::remove_var("DOCKYARD_TEST_PRIMARY_B");
        env::set_var("DOCKYARD_TEST_LEGACY_B", "7000");

        let value = var_with_legacy("DOCKYARD_TEST_PRIMARY_B", "DOCKYARD_TEST_LEGACY_B");
        assert_eq!(value.as_deref(), Some("7000"));

        env::remove_var("DOCKYARD_TEST_LEGACY_B");
    }

    #[test]
    fn test_blank_values_are_ignored() {
        env::set_var("DOCKYARD_TEST_BLANK", "   ");
        assert_eq!(non_empty_var("DOCKYARD_TEST_BLANK"), None);
        env::remove_var("DOCKYARD_TEST_BLANK");
    }
}
