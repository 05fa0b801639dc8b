use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Top-level error type for the execution core.
///
/// Propagation policy: the driver catches nothing from `Executor::execute`
/// — an executor error unwinds out of `execute_until_breakpoint` unchanged.
/// The live-lock recovery path in the scheduler is a controlled policy, not
/// an error, and never surfaces here.
#[derive(Error, Debug)]
pub enum CoreError {
    /// No stage executed during a call to `execute_until_breakpoint`.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// A selectivity specification was malformed or of unknown type.
    #[error(transparent)]
    Specification(#[from] SpecificationError),

    /// An internal assertion failed; indicates a corrupt plan or a bug.
    #[error(transparent)]
    Programmer(#[from] ProgrammerError),

    /// A platform executor raised an error while executing a stage.
    #[error("executor error: {0}")]
    Executor(#[source] anyhow::Error),
}

impl CoreError {
    pub fn executor<E: Into<anyhow::Error>>(e: E) -> Self {
        Self::Executor(e.into())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("could not execute a single stage")]
    NoStageExecuted,

    #[error("stage not found: {0}")]
    StageNotFound(String),

    #[error("platform execution group not found: {0}")]
    GroupNotFound(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecificationError {
    #[error("unknown specification type: {0}")]
    UnknownType(String),

    #[error("could not initialize from specification: {0}")]
    Malformed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgrammerError {
    #[error("predecessor counter {actual} exceeds predecessor count {expected} for stage {stage}")]
    PredecessorCounterOverflow {
        stage: String,
        actual: usize,
        expected: usize,
    },

    #[error("expected {expected} input estimates, got {actual}")]
    InputEstimateCountMismatch { expected: usize, actual: usize },

    #[error("output index {index} out of range for {num_outputs} outputs")]
    OutputIndexOutOfRange { index: usize, num_outputs: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_error_renders_message() {
        let e = CoreError::from(PlanError::NoStageExecuted);
        assert_eq!(e.to_string(), "could not execute a single stage");
    }

    #[test]
    fn executor_error_wraps_anyhow() {
        let e = CoreError::executor(anyhow::anyhow!("boom"));
        assert!(e.to_string().contains("boom"));
    }
}
