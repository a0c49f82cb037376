// ABOUTME: Scoped access to the container runtime, one liveness-checked lease per operation
// ABOUTME: Supports a pooled shared client or a fresh client per lease

use async_trait::async_trait;
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::docker::DockerRuntime;
use crate::error::{Result, RuntimeError};
use crate::provider::ContainerRuntime;

/// Produces runtime clients for the gateway
#[async_trait]
pub trait RuntimeConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn ContainerRuntime>>;
}

/// Connects to the local Docker daemon
pub struct DockerConnector {
    pull_timeout: Duration,
    /// Shared client cloned into every lease when pooling is on
    pooled: Option<bollard::Docker>,
}

impl DockerConnector {
    pub fn new(pull_timeout: Duration, pool_connections: bool) -> Result<Self> {
        let pooled = if pool_connections {
            let client = bollard::Docker::connect_with_defaults()
                .map_err(|e| RuntimeError::Unreachable(e.to_string()))?;
            Some(client)
        } else {
            None
        };

        Ok(Self {
            pull_timeout,
            pooled,
        })
    }
}

#[async_trait]
impl RuntimeConnector for DockerConnector {
    async fn connect(&self) -> Result<Arc<dyn ContainerRuntime>> {
        let runtime = match &self.pooled {
            Some(client) => DockerRuntime::with_client(client.clone(), self.pull_timeout),
            None => DockerRuntime::connect_with_defaults(self.pull_timeout)?,
        };

        Ok(Arc::new(runtime))
    }
}

/// Hands out one already-built runtime to every lease
pub struct SharedRuntime(pub Arc<dyn ContainerRuntime>);

#[async_trait]
impl RuntimeConnector for SharedRuntime {
    async fn connect(&self) -> Result<Arc<dyn ContainerRuntime>> {
        Ok(self.0.clone())
    }
}

/// Entry point for every runtime operation
#[derive(Clone)]
pub struct Gateway {
    connector: Arc<dyn RuntimeConnector>,
}

impl Gateway {
    pub fn new(connector: Arc<dyn RuntimeConnector>) -> Self {
        Self { connector }
    }

    /// Gateway over a single runtime instance
    pub fn shared(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self::new(Arc::new(SharedRuntime(runtime)))
    }

    /// Connect and ping. The returned lease is released when dropped.
    pub async fn acquire(&self) -> Result<RuntimeLease> {
        let runtime = self.connector.connect().await.map_err(|e| match e {
            RuntimeError::Unreachable(_) => e,
            other => RuntimeError::Unreachable(other.to_string()),
        })?;

        if let Err(e) = runtime.ping().await {
            warn!("Runtime liveness check failed: {}", e);
            return Err(match e {
                RuntimeError::Unreachable(_) => e,
                other => RuntimeError::Unreachable(other.to_string()),
            });
        }

        debug!("Runtime lease acquired");
        Ok(RuntimeLease { runtime })
    }
}

/// A liveness-checked runtime client scoped to one operation
pub struct RuntimeLease {
    runtime: Arc<dyn ContainerRuntime>,
}

impl RuntimeLease {
    /// Owned handle for work that must outlive the borrow, see [`run_to_completion`]
    pub fn handle(&self) -> Arc<dyn ContainerRuntime> {
        self.runtime.clone()
    }
}

impl Deref for RuntimeLease {
    type Target = dyn ContainerRuntime;

    fn deref(&self) -> &Self::Target {
        self.runtime.as_ref()
    }
}

impl Drop for RuntimeLease {
    fn drop(&mut self) {
        debug!("Runtime lease released");
    }
}

/// Run a mutating runtime call on its own task and wait for it.
///
/// If the caller is dropped mid-await the spawned task still finishes, so
/// an issued create/start/stop/remove is never abandoned halfway.
pub async fn run_to_completion<T, F>(operation: &'static str, fut: F) -> Result<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    tokio::spawn(fut)
        .await
        .map_err(|e| {
            warn!("Runtime task for {} did not complete: {}", operation, e);
            RuntimeError::TaskAborted(operation.to_string())
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ContainerDetails, ContainerSpec, ContainerSummary, ImageSearchResult, ImageSummary,
        NetworkSummary, VolumeSummary,
    };
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Runtime whose ping result is switchable and whose stop calls are counted
    #[derive(Default)]
    struct StubRuntime {
        down: AtomicBool,
        stops: AtomicUsize,
    }

    #[async_trait]
    impl ContainerRuntime for StubRuntime {
        async fn ping(&self) -> Result<()> {
            if self.down.load(Ordering::SeqCst) {
                Err(RuntimeError::Api {
                    status: 500,
                    message: "daemon hung".to_string(),
                })
            } else {
                Ok(())
            }
        }
        async fn list_containers(&self, _all: bool) -> Result<Vec<ContainerSummary>> {
            Ok(vec![])
        }
        async fn inspect_container(&self, id: &str) -> Result<ContainerDetails> {
            Err(RuntimeError::NotFound(id.to_string()))
        }
        async fn create_container(&self, _spec: &ContainerSpec) -> Result<String> {
            Ok("new".to_string())
        }
        async fn start_container(&self, _id: &str) -> Result<()> {
            Ok(())
        }
        async fn stop_container(&self, _id: &str, _timeout_secs: i64) -> Result<()> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn remove_container(&self, _id: &str, _force: bool) -> Result<()> {
            Ok(())
        }
        async fn restart_container(&self, _id: &str, _timeout_secs: i64) -> Result<()> {
            Ok(())
        }
        async fn list_images(&self) -> Result<Vec<ImageSummary>> {
            Ok(vec![])
        }
        async fn pull_image(&self, _reference: &str) -> Result<()> {
            Ok(())
        }
        async fn remove_image(&self, _reference: &str, _force: bool) -> Result<()> {
            Ok(())
        }
        async fn search_images(&self, _term: &str, _limit: u64) -> Result<Vec<ImageSearchResult>> {
            Ok(vec![])
        }
        async fn exec(&self, _id: &str, _command: Vec<String>) -> Result<Vec<u8>> {
            Ok(vec![])
        }
        async fn logs(&self, _id: &str, _tail: &str) -> Result<Vec<u8>> {
            Ok(vec![])
        }
        async fn list_networks(&self) -> Result<Vec<NetworkSummary>> {
            Ok(vec![])
        }
        async fn list_volumes(&self) -> Result<Vec<VolumeSummary>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_acquire_pings_every_time() {
        let stub = Arc::new(StubRuntime::default());
        let gateway = Gateway::shared(stub.clone());

        assert!(gateway.acquire().await.is_ok());

        stub.down.store(true, Ordering::SeqCst);
        let err = gateway.acquire().await.err();
        assert!(matches!(err, Some(RuntimeError::Unreachable(_))));
    }

    #[tokio::test]
    async fn test_lease_derefs_to_runtime() {
        let gateway = Gateway::shared(Arc::new(StubRuntime::default()));
        let lease = gateway.acquire().await.unwrap();

        let err = lease.inspect_container("ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_detached_call_finishes_after_caller_dropped() {
        let stub = Arc::new(StubRuntime::default());
        let runtime: Arc<dyn ContainerRuntime> = stub.clone();

        let call = run_to_completion("stop", async move { runtime.stop_container("web", 10).await });
        // Poll once so the task is spawned, then abandon the caller
        let _ = tokio::time::timeout(Duration::from_millis(1), call).await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(stub.stops.load(Ordering::SeqCst), 1);
    }
}
