// ABOUTME: Classifies daemon failure messages into a typed conflict taxonomy
// ABOUTME: A chain of substring matchers, replaceable once the daemon exposes structured codes

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RuntimeError;

/// Category of a runtime failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    DaemonUnreachable,
    ImageResolutionFailed,
    NameConflict,
    PortConflict,
    StartFailed,
    Generic,
}

/// A failure message paired with its classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    /// Host port named in the message, when one could be extracted
    pub conflicting_port: Option<u16>,
    pub raw_message: String,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, raw_message: impl Into<String>) -> Self {
        Self {
            kind,
            conflicting_port: None,
            raw_message: raw_message.into(),
        }
    }

    /// Same message, different category
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_message)
    }
}

impl std::error::Error for ClassifiedError {}

/// A single rule in the classification chain
pub trait ErrorMatcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Return a classification if this rule recognises the message.
    /// `lowered` is the message in lowercase, `raw` as received.
    fn matches(&self, lowered: &str, raw: &str) -> Option<ClassifiedError>;

    /// Rules that only make sense when the daemon may not have answered
    fn detects_unreachable(&self) -> bool {
        false
    }
}

/// Daemon socket missing, refused or not answering
pub struct DaemonConnectivityMatcher;

impl ErrorMatcher for DaemonConnectivityMatcher {
    fn name(&self) -> &'static str {
        "daemon_connectivity"
    }

    fn matches(&self, lowered: &str, raw: &str) -> Option<ClassifiedError> {
        lowered_unreachable(lowered)
            .then(|| ClassifiedError::new(ErrorKind::DaemonUnreachable, raw))
    }

    fn detects_unreachable(&self) -> bool {
        true
    }
}

/// Container name already taken by another container
pub struct NameConflictMatcher;

impl ErrorMatcher for NameConflictMatcher {
    fn name(&self) -> &'static str {
        "name_conflict"
    }

    fn matches(&self, lowered: &str, raw: &str) -> Option<ClassifiedError> {
        (lowered.contains("already in use") && lowered.contains("container name"))
            .then(|| ClassifiedError::new(ErrorKind::NameConflict, raw))
    }
}

/// Host port bind failure, recognised by any of its markers
pub struct PortBindMatcher {
    name: &'static str,
    markers: &'static [&'static str],
}

impl PortBindMatcher {
    /// "bind host port" from the daemon's port mapper
    pub fn bind_host_port() -> Self {
        Self {
            name: "bind_host_port",
            markers: &["bind host port"],
        }
    }

    /// Socket level "address already in use" and the daemon's allocator wording
    pub fn address_in_use() -> Self {
        Self {
            name: "address_in_use",
            markers: &["address already in use", "port is already allocated"],
        }
    }
}

impl ErrorMatcher for PortBindMatcher {
    fn name(&self) -> &'static str {
        self.name
    }

    fn matches(&self, lowered: &str, raw: &str) -> Option<ClassifiedError> {
        if !self.markers.iter().any(|m| lowered.contains(m)) {
            return None;
        }

        Some(ClassifiedError {
            kind: ErrorKind::PortConflict,
            conflicting_port: extract_bound_port(raw),
            raw_message: raw.to_string(),
        })
    }
}

/// Ordered matcher chain; first match wins, no match is `Generic`
pub struct ErrorClassifier {
    matchers: Vec<Box<dyn ErrorMatcher>>,
}

impl ErrorClassifier {
    pub fn new(matchers: Vec<Box<dyn ErrorMatcher>>) -> Self {
        Self { matchers }
    }

    /// Connectivity, name conflict, bind host port, address in use
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(DaemonConnectivityMatcher),
            Box::new(NameConflictMatcher),
            Box::new(PortBindMatcher::bind_host_port()),
            Box::new(PortBindMatcher::address_in_use()),
        ])
    }

    pub fn classify(&self, raw_message: &str) -> ClassifiedError {
        self.run_chain(raw_message, false)
    }

    fn run_chain(&self, raw_message: &str, daemon_answered: bool) -> ClassifiedError {
        let lowered = raw_message.to_lowercase();

        let matchers = self
            .matchers
            .iter()
            .filter(|m| !(daemon_answered && m.detects_unreachable()));

        for matcher in matchers {
            if let Some(classified) = matcher.matches(&lowered, raw_message) {
                tracing::debug!(matcher = matcher.name(), kind = ?classified.kind, "Classified runtime error");
                return classified;
            }
        }

        ClassifiedError::new(ErrorKind::Generic, raw_message)
    }

    /// Classify a typed runtime error, trusting the type before the text.
    ///
    /// A daemon response (any status) is never `DaemonUnreachable`, even when
    /// the message relays a refused connection to a registry.
    pub fn classify_runtime(&self, error: &RuntimeError) -> ClassifiedError {
        match error {
            RuntimeError::Unreachable(_) => {
                ClassifiedError::new(ErrorKind::DaemonUnreachable, error.to_string())
            }
            RuntimeError::Api { .. }
            | RuntimeError::NotFound(_)
            | RuntimeError::Conflict(_)
            | RuntimeError::NotModified(_) => self.run_chain(&error.to_string(), true),
            other => self.classify(&other.to_string()),
        }
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::standard()
    }
}

/// Port number following the first `0.0.0.0:` in a message
pub fn extract_bound_port(message: &str) -> Option<u16> {
    const MARKER: &str = "0.0.0.0:";

    let start = message.find(MARKER)? + MARKER.len();
    let digits: String = message[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits.parse().ok()
}

/// Whether a message describes a daemon that cannot be reached
pub(crate) fn is_daemon_unreachable(message: &str) -> bool {
    lowered_unreachable(&message.to_lowercase())
}

fn lowered_unreachable(lowered: &str) -> bool {
    const MARKERS: &[&str] = &[
        "cannot connect to the docker daemon",
        "is the docker daemon running",
        "connection refused",
        "error trying to connect",
    ];

    MARKERS.iter().any(|m| lowered.contains(m))
        || (lowered.contains("docker.sock")
            && (lowered.contains("no such file or directory") || lowered.contains("not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        "Cannot connect to the Docker daemon at unix:///var/run/docker.sock. Is the docker daemon running?",
        ErrorKind::DaemonUnreachable
    )]
    #[case("error trying to connect: Connection refused (os error 111)", ErrorKind::DaemonUnreachable)]
    #[case(
        "Conflict. The container name \"/web\" is already in use by container \"abc\"",
        ErrorKind::NameConflict
    )]
    #[case(
        "driver failed programming external connectivity: Error starting userland proxy: listen tcp4 0.0.0.0:8081: bind: address already in use",
        ErrorKind::PortConflict
    )]
    #[case("Bind for 0.0.0.0:8080 failed: port is already allocated", ErrorKind::PortConflict)]
    #[case("No such image: nginx:nope", ErrorKind::Generic)]
    fn test_classify_kind(#[case] message: &str, #[case] expected: ErrorKind) {
        let classifier = ErrorClassifier::standard();
        assert_eq!(classifier.classify(message).kind, expected);
    }

    #[test]
    fn test_bind_host_port_extracts_conflicting_port() {
        let message = "failed to set up container networking: Error response: bind host port 0.0.0.0:9001:tcp failed";
        let classified = ErrorClassifier::standard().classify(message);

        assert_eq!(classified.kind, ErrorKind::PortConflict);
        assert_eq!(classified.conflicting_port, Some(9001));
        assert_eq!(classified.raw_message, message);
    }

    #[test]
    fn test_port_left_unset_when_not_extractable() {
        let classified =
            ErrorClassifier::standard().classify("listen tcp [::]:80: bind: address already in use");

        assert_eq!(classified.kind, ErrorKind::PortConflict);
        assert_eq!(classified.conflicting_port, None);
    }

    #[test]
    fn test_connectivity_wins_over_later_rules() {
        // Both rule 1 and rule 4 markers present
        let message = "Cannot connect to the Docker daemon: address already in use";
        assert_eq!(
            ErrorClassifier::standard().classify(message).kind,
            ErrorKind::DaemonUnreachable
        );
    }

    #[test]
    fn test_generic_passes_message_through() {
        let classified = ErrorClassifier::standard().classify("something odd happened");
        assert_eq!(classified.kind, ErrorKind::Generic);
        assert_eq!(classified.to_string(), "something odd happened");
    }

    #[test]
    fn test_typed_unreachable_short_circuits() {
        let err = RuntimeError::Unreachable("ping failed".to_string());
        let classified = ErrorClassifier::standard().classify_runtime(&err);
        assert_eq!(classified.kind, ErrorKind::DaemonUnreachable);
    }

    #[rstest]
    #[case(RuntimeError::Api {
        status: 500,
        message: "Get \"https://registry-1.docker.io/v2/\": dial tcp 10.0.0.1:443: connect: connection refused".to_string(),
    })]
    #[case(RuntimeError::NotFound(
        "pull access denied: error trying to connect to registry.example.com".to_string()
    ))]
    #[case(RuntimeError::Conflict("Cannot connect to the Docker daemon (relayed)".to_string()))]
    fn test_daemon_response_never_unreachable(#[case] err: RuntimeError) {
        let classified = ErrorClassifier::standard().classify_runtime(&err);
        assert_eq!(classified.kind, ErrorKind::Generic);
        assert_eq!(classified.raw_message, err.to_string());
    }

    #[test]
    fn test_daemon_response_still_matches_port_rules() {
        let err = RuntimeError::Api {
            status: 500,
            message: "connection refused by proxy; Bind for 0.0.0.0:8080 failed: port is already allocated"
                .to_string(),
        };
        let classified = ErrorClassifier::standard().classify_runtime(&err);
        assert_eq!(classified.kind, ErrorKind::PortConflict);
        assert_eq!(classified.conflicting_port, Some(8080));
    }

    #[test]
    fn test_stream_error_text_can_still_be_unreachable() {
        let err = RuntimeError::Stream("error trying to connect: Connection refused (os error 111)".to_string());
        assert_eq!(
            ErrorClassifier::standard().classify_runtime(&err).kind,
            ErrorKind::DaemonUnreachable
        );
    }

    #[test]
    fn test_custom_chain_without_name_rule() {
        let classifier = ErrorClassifier::new(vec![Box::new(DaemonConnectivityMatcher)]);
        let classified = classifier
            .classify("Conflict. The container name \"/web\" is already in use by container \"abc\"");
        assert_eq!(classified.kind, ErrorKind::Generic);
    }

    #[rstest]
    #[case("bind host port 0.0.0.0:9001:tcp", Some(9001))]
    #[case("Bind for 0.0.0.0:8080 failed", Some(8080))]
    #[case("0.0.0.0:99999:", None)]
    #[case("no address here", None)]
    fn test_extract_bound_port(#[case] message: &str, #[case] expected: Option<u16>) {
        assert_eq!(extract_bound_port(message), expected);
    }
}
