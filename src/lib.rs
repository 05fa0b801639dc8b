/*
 * Cross-Platform Execution Core
 *
 * A stage-scheduling engine for polyglot dataflow plans, plus the
 * probabilistic interval estimate algebra cost-based planners use to
 * compare candidate plans before handing one to the scheduler.
 *
 * Architecture:
 * - Execution plan model (arena-backed DAG of stages/groups)
 * - Cross-platform driver (breakpoint-gated, resumable scheduler)
 * - Executor lifecycle (lazy create, dispose-on-group-completion)
 * - Estimate algebra (PIEs, time/cardinality specializations)
 * - Selectivity specifications and the estimator substrate operators use
 */

pub mod breakpoint;
pub mod config;
pub mod driver;
pub mod error;
pub mod estimate;
pub mod estimator;
pub mod executor;
pub mod instrumentation;
pub mod plan;
pub mod selectivity;
pub mod state;

pub use breakpoint::{BreakpointClause, ConjunctiveBreakpoint};
pub use config::{Configuration, MapConfiguration, NoUdfSelectivityProvider, UdfSelectivityProvider};
pub use driver::{CapturedState, CrossPlatformDriver};
pub use error::{CoreError, PlanError, ProgrammerError, Result, SpecificationError};
pub use estimate::{CardinalityEstimate, Pie, PieBuilder, TimeEstimate};
pub use estimator::{
    CardinalityEstimatorFactory, CoefficientAwareEstimator, DefaultSelectivityEstimator,
    EstimationContext, Estimator, EstimatorKind, EstimatorRegistry,
};
pub use executor::{Executor, ExecutorFactory, ExecutorTable, Job, PlatformHandle};
pub use instrumentation::{InstrumentationStrategy, NoopInstrumentation};
pub use plan::{ExecutionPlan, ExecutionPlanBuilder, ExecutionStage, GroupId, PlatformExecution, StageId};
pub use selectivity::{load_selectivity, NoCache, SelectivityCache};
pub use state::ExecutionState;
