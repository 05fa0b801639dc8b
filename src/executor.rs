//! Executor lifecycle: the async boundary between the scheduler and a
//! concrete execution platform (a worker pool, a remote cluster, an
//! in-process engine — the core is agnostic).
//!
//! Executors are expensive to create and are shared by every stage in
//! their [`crate::plan::PlatformExecution`] group; the scheduler creates
//! one lazily on first use and disposes of it once the group's last
//! stage has run (§4.4).

use crate::error::Result;
use crate::plan::{ExecutionStage, GroupId, PlatformExecution};
use crate::state::ExecutionState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Opaque job context threaded through to executor factories. Hosts
/// attach whatever identifies a run (credentials, a cluster address,
/// tracing context) via `metadata`.
#[derive(Debug, Clone, Default)]
pub struct Job {
    pub id: uuid::Uuid,
    pub metadata: HashMap<String, String>,
}

impl Job {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            metadata: HashMap::new(),
        }
    }
}

/// Runs the stages of one platform-execution group.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, stage: &ExecutionStage, in_state: &ExecutionState) -> Result<ExecutionState>;

    /// Releases whatever resources the executor holds. Called exactly
    /// once, after the group's last stage has run, or during
    /// [`crate::driver::CrossPlatformDriver::shutdown`] for groups that
    /// never finished.
    async fn dispose(&self);
}

/// Creates the [`Executor`] for a platform-execution group. Construction
/// is async because it may involve connecting to a remote platform.
#[async_trait]
pub trait ExecutorFactory: Send + Sync {
    async fn create(&self, job: &Job) -> Result<Arc<dyn Executor>>;
}

/// A named execution platform and the factory that builds executors for
/// it. Plan groups reference this by `Arc` so the factory is shared
/// across every group that targets the same platform.
pub struct PlatformHandle {
    pub name: String,
    pub executor_factory: Arc<dyn ExecutorFactory>,
}

impl PlatformHandle {
    pub fn new(name: impl Into<String>, executor_factory: Arc<dyn ExecutorFactory>) -> Self {
        Self {
            name: name.into(),
            executor_factory,
        }
    }
}

/// Lazy, at-most-one-per-group executor table owned by the driver.
#[derive(Default)]
pub struct ExecutorTable {
    executors: HashMap<GroupId, Arc<dyn Executor>>,
}

impl ExecutorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_create(&mut self, group: &PlatformExecution, job: &Job) -> Result<Arc<dyn Executor>> {
        if let Some(executor) = self.executors.get(&group.id) {
            return Ok(executor.clone());
        }
        let executor = group.platform.executor_factory.create(job).await?;
        self.executors.insert(group.id, executor.clone());
        Ok(executor)
    }

    /// Disposes and forgets the executor for `group_id`, if one exists.
    pub async fn dispose_group(&mut self, group_id: GroupId) {
        if let Some(executor) = self.executors.remove(&group_id) {
            executor.dispose().await;
        }
    }

    /// Disposes every executor still live. Used when a run is abandoned
    /// mid-plan.
    pub async fn shutdown(&mut self) {
        for (_, executor) in self.executors.drain() {
            executor.dispose().await;
        }
    }

    pub fn live_count(&self) -> usize {
        self.executors.len()
    }
}
