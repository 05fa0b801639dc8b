//! Execution plan model: a DAG of execution stages grouped into platform
//! executions.
//!
//! Stages and groups are never owned by one another directly. Per the
//! back-reference design note, both live in arenas keyed by a stable
//! integer id; predecessor/successor/group-membership relations are id
//! sets, which severs the cyclic stage↔group object graph the source
//! models with back-pointers.

use crate::executor::PlatformHandle;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageId(pub u32);

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// Identity-bearing node of the plan DAG.
#[derive(Debug, Clone)]
pub struct ExecutionStage {
    pub id: StageId,
    pub description: String,
    pub predecessors: Vec<StageId>,
    pub successors: Vec<StageId>,
    pub group: GroupId,
}

impl ExecutionStage {
    /// Diagnostic rendering; never parsed.
    pub fn to_extensive_string(&self) -> String {
        format!(
            "{} (\"{}\") preds={:?} succs={:?}",
            self.id, self.description, self.predecessors, self.successors
        )
    }
}

/// A maximal subgroup of stages that must be served by one executor
/// instance of a given platform.
#[derive(Clone)]
pub struct PlatformExecution {
    pub id: GroupId,
    pub platform: Arc<PlatformHandle>,
    pub members: Vec<StageId>,
}

/// DAG of execution stages produced by an upstream optimizer, consumed
/// by the scheduler.
#[derive(Default)]
pub struct ExecutionPlan {
    stages: HashMap<StageId, ExecutionStage>,
    groups: HashMap<GroupId, PlatformExecution>,
}

impl ExecutionPlan {
    pub fn builder() -> ExecutionPlanBuilder {
        ExecutionPlanBuilder::new()
    }

    pub fn stage(&self, id: StageId) -> Option<&ExecutionStage> {
        self.stages.get(&id)
    }

    pub fn group(&self, id: GroupId) -> Option<&PlatformExecution> {
        self.groups.get(&id)
    }

    pub fn predecessors(&self, id: StageId) -> &[StageId] {
        self.stages
            .get(&id)
            .map(|s| s.predecessors.as_slice())
            .unwrap_or(&[])
    }

    pub fn successors(&self, id: StageId) -> &[StageId] {
        self.stages
            .get(&id)
            .map(|s| s.successors.as_slice())
            .unwrap_or(&[])
    }

    /// Stages with no predecessors.
    pub fn starting_stages(&self) -> Vec<StageId> {
        let mut ids: Vec<StageId> = self
            .stages
            .values()
            .filter(|s| s.predecessors.is_empty())
            .map(|s| s.id)
            .collect();
        ids.sort();
        ids
    }

    pub fn stage_ids(&self) -> impl Iterator<Item = StageId> + '_ {
        let mut ids: Vec<StageId> = self.stages.keys().copied().collect();
        ids.sort();
        ids.into_iter()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Ergonomic construction of an [`ExecutionPlan`]. Successor edges are
/// derived automatically from the predecessor edges supplied for each
/// stage — the builder never asks for both directions.
#[derive(Default)]
pub struct ExecutionPlanBuilder {
    next_stage_id: u32,
    next_group_id: u32,
    stages: HashMap<StageId, ExecutionStage>,
    groups: HashMap<GroupId, (Arc<PlatformHandle>, Vec<StageId>)>,
}

impl ExecutionPlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(&mut self, platform: Arc<PlatformHandle>) -> GroupId {
        let id = GroupId(self.next_group_id);
        self.next_group_id += 1;
        self.groups.insert(id, (platform, Vec::new()));
        id
    }

    pub fn add_stage(
        &mut self,
        description: impl Into<String>,
        group: GroupId,
        predecessors: Vec<StageId>,
    ) -> StageId {
        let id = StageId(self.next_stage_id);
        self.next_stage_id += 1;

        for &pred in &predecessors {
            if let Some(pred_stage) = self.stages.get_mut(&pred) {
                pred_stage.successors.push(id);
            }
        }

        self.stages.insert(
            id,
            ExecutionStage {
                id,
                description: description.into(),
                predecessors,
                successors: Vec::new(),
                group,
            },
        );

        if let Some((_, members)) = self.groups.get_mut(&group) {
            members.push(id);
        }

        id
    }

    pub fn build(self) -> ExecutionPlan {
        let groups = self
            .groups
            .into_iter()
            .map(|(id, (platform, members))| (id, PlatformExecution { id, platform, members }))
            .collect();

        ExecutionPlan {
            stages: self.stages,
            groups,
        }
    }
}
