// ABOUTME: Applies one lifecycle action to many containers independently
// ABOUTME: Targets run in input order and a failing target never stops the batch

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use dockyard_config::defaults::BULK_GRACE_TIMEOUT_SECS;
use dockyard_runtime::{run_to_completion, ContainerRuntime, Gateway, RuntimeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Start,
    Stop,
    Remove,
    Restart,
}

impl FromStr for BulkAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(BulkAction::Start),
            "stop" => Ok(BulkAction::Stop),
            "remove" => Ok(BulkAction::Remove),
            "restart" => Ok(BulkAction::Restart),
            other => Err(format!("unknown action: {}", other)),
        }
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BulkAction::Start => "start",
            BulkAction::Stop => "stop",
            BulkAction::Remove => "remove",
            BulkAction::Restart => "restart",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    pub target_id: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BulkOutcome {
    fn success(target_id: &str) -> Self {
        Self {
            target_id: target_id.to_string(),
            status: OutcomeStatus::Success,
            message: None,
        }
    }

    fn error(target_id: &str, message: impl Into<String>) -> Self {
        Self {
            target_id: target_id.to_string(),
            status: OutcomeStatus::Error,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkSummary {
    pub total: usize,
    pub success: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    pub action: String,
    pub results: BTreeMap<String, BulkOutcome>,
    pub summary: BulkSummary,
}

impl BulkReport {
    fn from_outcomes(action: &str, outcomes: Vec<BulkOutcome>) -> Self {
        let summary = outcomes
            .iter()
            .fold(BulkSummary::default(), |s, o| match o.status {
                OutcomeStatus::Success => BulkSummary {
                    total: s.total + 1,
                    success: s.success + 1,
                    ..s
                },
                OutcomeStatus::Error => BulkSummary {
                    total: s.total + 1,
                    errors: s.errors + 1,
                    ..s
                },
            });

        let results = outcomes
            .into_iter()
            .map(|o| (o.target_id.clone(), o))
            .collect();

        Self {
            action: action.to_string(),
            results,
            summary,
        }
    }
}

#[derive(Clone)]
pub struct BulkExecutor {
    gateway: Gateway,
    grace_timeout_secs: i64,
}

impl BulkExecutor {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            grace_timeout_secs: BULK_GRACE_TIMEOUT_SECS,
        }
    }

    /// Apply `action` to every target. Only an unreachable daemon fails the
    /// whole call; everything else is reported per target.
    pub async fn apply(
        &self,
        action: &str,
        targets: &[String],
    ) -> Result<BulkReport, RuntimeError> {
        let parsed = match action.parse::<BulkAction>() {
            Ok(parsed) => parsed,
            Err(message) => {
                warn!("Bulk request with {}", message);
                let outcomes = targets
                    .iter()
                    .map(|t| BulkOutcome::error(t, message.clone()))
                    .collect();
                return Ok(BulkReport::from_outcomes(action, outcomes));
            }
        };

        if targets.is_empty() {
            return Ok(BulkReport::from_outcomes(action, Vec::new()));
        }

        let lease = self.gateway.acquire().await?;
        let runtime = lease.handle();

        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            let outcome = match self.apply_one(&runtime, parsed, target).await {
                Ok(()) => BulkOutcome::success(target),
                Err(e) => {
                    warn!("Bulk {} failed for {}: {}", parsed, target, e);
                    BulkOutcome::error(target, e.to_string())
                }
            };
            outcomes.push(outcome);
        }

        let report = BulkReport::from_outcomes(action, outcomes);
        info!(
            "Bulk {}: {} succeeded, {} failed",
            parsed, report.summary.success, report.summary.errors
        );
        Ok(report)
    }

    async fn apply_one(
        &self,
        runtime: &Arc<dyn ContainerRuntime>,
        action: BulkAction,
        target: &str,
    ) -> Result<(), RuntimeError> {
        let runtime = runtime.clone();
        let id = target.to_string();
        let grace = self.grace_timeout_secs;

        match action {
            BulkAction::Start => {
                run_to_completion("start", async move { runtime.start_container(&id).await }).await
            }
            BulkAction::Stop => {
                run_to_completion("stop", async move { runtime.stop_container(&id, grace).await })
                    .await
            }
            BulkAction::Remove => {
                run_to_completion("remove", async move {
                    runtime.remove_container(&id, true).await
                })
                .await
            }
            BulkAction::Restart => {
                run_to_completion("restart", async move {
                    runtime.restart_container(&id, grace).await
                })
                .await
            }
        }
    }
}
