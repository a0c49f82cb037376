// ABOUTME: Container state counts folded from a container list
use serde::Serialize;

use dockyard_runtime::{ContainerState, ContainerSummary};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContainerCounts {
    pub total: usize,
    pub running: usize,
    /// Exited and created containers
    pub stopped: usize,
    pub paused: usize,
}

impl ContainerCounts {
    fn with(self, state: ContainerState) -> Self {
        let mut next = Self {
            total: self.total + 1,
            ..self
        };
        match state {
            ContainerState::Running => next.running += 1,
            ContainerState::Exited | ContainerState::Created => next.stopped += 1,
            ContainerState::Paused => next.paused += 1,
            ContainerState::Other => {}
        }
        next
    }
}

pub fn count_containers(containers: &[ContainerSummary]) -> ContainerCounts {
    containers
        .iter()
        .fold(ContainerCounts::default(), |counts, c| counts.with(c.state))
}
