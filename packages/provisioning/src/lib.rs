// ABOUTME: Container provisioning core for Dockyard
// ABOUTME: Port allocation, name resolution, provisioning workflow and bulk lifecycle actions

pub mod bulk;
pub mod error;
pub mod lookup;
pub mod names;
pub mod orchestrator;
pub mod ports;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use bulk::{BulkAction, BulkExecutor, BulkOutcome, BulkReport, BulkSummary, OutcomeStatus};
pub use error::{ProvisionError, Result};
pub use lookup::{available_images, find_container, find_image};
pub use orchestrator::{
    Clock, ProvisionOutcome, ProvisionRequest, ProvisionSettings, Provisioner, Stage,
};
pub use ports::{PortExhausted, PortRequest};
pub use stats::{count_containers, ContainerCounts};
