//! The cross-platform driver: a single-threaded, cooperative scheduler
//! that walks an [`ExecutionPlan`] stage by stage, honoring breakpoints
//! and accumulating [`ExecutionState`] as it goes (§4.4–§4.6).
//!
//! The driver never spawns or parallelizes stages itself; only an
//! [`Executor::execute`] implementation may fan out internally. One
//! driver instance is bound to one [`Job`] for its whole lifetime —
//! `execute_until_breakpoint` may be called repeatedly against
//! structurally-equivalent plans to resume past a breakpoint.

use crate::breakpoint::{BreakpointClause, ConjunctiveBreakpoint};
use crate::error::{PlanError, ProgrammerError, Result};
use crate::executor::{ExecutorTable, Job};
use crate::instrumentation::InstrumentationStrategy;
use crate::plan::{ExecutionPlan, ExecutionStage, GroupId, StageId};
use crate::state::ExecutionState;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Immutable snapshot returned by [`CrossPlatformDriver::capture_state`].
#[derive(Debug, Clone)]
pub struct CapturedState {
    pub state: ExecutionState,
    pub completed: HashSet<StageId>,
    pub suspended: HashSet<StageId>,
}

impl CapturedState {
    /// A plan is complete once nothing remains suspended — every stage
    /// that was ever blocked has since executed or the whole plan ran.
    pub fn is_complete(&self) -> bool {
        self.suspended.is_empty()
    }
}

/// Drives one [`ExecutionPlan`] to completion across however many calls
/// to `execute_until_breakpoint` it takes to clear every breakpoint.
pub struct CrossPlatformDriver {
    job: Job,
    instrumentation: Arc<dyn InstrumentationStrategy>,
    executors: ExecutorTable,
    breakpoint: ConjunctiveBreakpoint,

    /// `true` once a stage has executed or been fast-forwarded, keyed by
    /// stage id. Persists across calls so a later call can fast-forward
    /// over work a previous call already did.
    status: HashMap<StageId, bool>,
    /// Stages blocked by the breakpoint as of the most recent call.
    suspended: HashSet<StageId>,
    /// Count of stages submitted (executed or fast-forwarded) so far
    /// per group, used to detect "last stage of group" for disposal.
    execution_stage_counter: HashMap<GroupId, usize>,

    activated: VecDeque<StageId>,
    predecessor_counter: HashMap<StageId, usize>,
    state: ExecutionState,
}

impl CrossPlatformDriver {
    pub fn new(job: Job, instrumentation: Arc<dyn InstrumentationStrategy>) -> Self {
        Self {
            job,
            instrumentation,
            executors: ExecutorTable::new(),
            breakpoint: ConjunctiveBreakpoint::new(),
            status: HashMap::new(),
            suspended: HashSet::new(),
            execution_stage_counter: HashMap::new(),
            activated: VecDeque::new(),
            predecessor_counter: HashMap::new(),
            state: ExecutionState::new(),
        }
    }

    /// Adds a clause to the breakpoint that gates the *next* call to
    /// `execute_until_breakpoint`. Clauses accumulate conjunctively
    /// until that call consumes and resets the breakpoint.
    pub fn extend_breakpoint(&mut self, clause: Arc<dyn BreakpointClause>) {
        self.breakpoint.extend(clause);
    }

    /// Runs `plan` forward from wherever this driver last stopped,
    /// submitting every ready stage not blocked by the current
    /// breakpoint, until the activated queue drains. Stages already
    /// marked executed from a prior call are fast-forwarded: their
    /// successors are activated but no executor is invoked.
    ///
    /// Returns `Err` wrapping [`PlanError::NoStageExecuted`] if the call
    /// submits nothing at all — an empty plan, or a breakpoint that
    /// blocks every starting stage with no recovery possible.
    pub async fn execute_until_breakpoint(&mut self, plan: &ExecutionPlan) -> Result<ExecutionState> {
        self.prepare(plan);
        let started_at = Instant::now();

        let mut breakpoints_disabled = false;
        let mut any_submitted = false;

        loop {
            if self.activated.is_empty() {
                break;
            }

            let mut newly_activated = Vec::new();
            let mut progressed = false;

            while let Some(stage_id) = self.activated.pop_front() {
                let stage = plan
                    .stage(stage_id)
                    .ok_or_else(|| PlanError::StageNotFound(stage_id.to_string()))?;
                let was_executed = self.status.get(&stage_id).copied().unwrap_or(false);

                if !was_executed && !breakpoints_disabled && !self.breakpoint.permits(stage) {
                    debug!(stage = %stage_id, "stage suspended by breakpoint");
                    self.suspended.insert(stage_id);
                    continue;
                }

                self.suspended.remove(&stage_id);
                progressed = true;
                any_submitted = true;

                if was_executed {
                    debug!(stage = %stage_id, "stage fast-forwarded, already executed");
                } else {
                    self.submit_stage(plan, stage).await?;
                }

                self.activate_successors(plan, stage, &mut newly_activated)?;
            }

            if !progressed {
                if self.suspended.is_empty() {
                    break;
                }
                if any_submitted {
                    // Partial progress already happened this call; the
                    // remaining block is a deliberate breakpoint pause,
                    // not a live-lock. Leave it suspended and stop.
                    break;
                }

                warn!(
                    suspended = self.suspended.len(),
                    "breakpoint live-lock detected before any stage ran this call; disabling breakpoints for the rest of the call"
                );
                breakpoints_disabled = true;
                for stage_id in self.suspended.drain().collect::<Vec<_>>() {
                    self.activated.push_back(stage_id);
                }
            } else {
                for stage_id in newly_activated {
                    self.activated.push_back(stage_id);
                }
            }
        }

        info!(
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            submitted = any_submitted,
            suspended = self.suspended.len(),
            "execute_until_breakpoint finished"
        );

        if !any_submitted {
            return Err(PlanError::NoStageExecuted.into());
        }

        // One-shot breakpoint: every call starts from a clean slate.
        self.breakpoint = ConjunctiveBreakpoint::new();

        Ok(self.state.clone())
    }

    async fn submit_stage(&mut self, plan: &ExecutionPlan, stage: &ExecutionStage) -> Result<()> {
        self.instrumentation.apply_to(stage).await;

        let group = plan
            .group(stage.group)
            .ok_or_else(|| PlanError::GroupNotFound(stage.group.to_string()))?;
        let executor = self.executors.get_or_create(group, &self.job).await?;

        let start = Instant::now();
        let produced = executor.execute(stage, &self.state).await?;
        let elapsed = start.elapsed();

        self.state.merge(produced);
        self.state.record_timing(stage.id, elapsed);
        self.status.insert(stage.id, true);
        debug!(stage = %stage.id, elapsed_ms = elapsed.as_millis() as u64, "stage executed");

        let counter = self.execution_stage_counter.entry(stage.group).or_insert(0);
        *counter += 1;
        if *counter == group.members.len() {
            self.executors.dispose_group(stage.group).await;
            debug!(group = %stage.group, "executor disposed, group complete");
        }

        Ok(())
    }

    fn activate_successors(
        &mut self,
        plan: &ExecutionPlan,
        stage: &ExecutionStage,
        newly_activated: &mut Vec<StageId>,
    ) -> Result<()> {
        for &succ_id in &stage.successors {
            let total_preds = plan.predecessors(succ_id).len();
            let counter = self.predecessor_counter.entry(succ_id).or_insert(0);
            *counter += 1;

            if *counter > total_preds {
                return Err(ProgrammerError::PredecessorCounterOverflow {
                    stage: succ_id.to_string(),
                    actual: *counter,
                    expected: total_preds,
                }
                .into());
            }

            if *counter == total_preds {
                newly_activated.push(succ_id);
                self.predecessor_counter.remove(&succ_id);
            }
        }
        Ok(())
    }

    /// Resets the per-call transient state (activated queue, suspended
    /// set, predecessor counters) without touching `status` or
    /// `execution_stage_counter`, both of which must survive across
    /// calls for fast-forwarding and group disposal to work correctly.
    fn prepare(&mut self, plan: &ExecutionPlan) {
        self.activated.clear();
        self.suspended.clear();
        self.predecessor_counter.clear();
        for stage_id in plan.starting_stages() {
            self.activated.push_back(stage_id);
        }
    }

    /// A read-only copy of the driver's current progress.
    pub fn capture_state(&self) -> CapturedState {
        let completed = self
            .status
            .iter()
            .filter(|(_, &executed)| executed)
            .map(|(&id, _)| id)
            .collect();

        CapturedState {
            state: self.state.clone(),
            completed,
            suspended: self.suspended.clone(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.suspended.is_empty()
    }

    /// Disposes every executor still live. Call once the driver will not
    /// be used again, whether the plan finished or was abandoned.
    pub async fn shutdown(&mut self) {
        self.executors.shutdown().await;
    }
}
