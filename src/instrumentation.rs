//! Instrumentation hook invoked once immediately before each actual
//! (non-fast-forwarded) stage execution (§4.5, §6). Kept separate from
//! [`crate::executor::Executor`] so a driver can attach tracing/metrics
//! without every platform implementation having to know about it.

use crate::plan::ExecutionStage;
use async_trait::async_trait;

#[async_trait]
pub trait InstrumentationStrategy: Send + Sync {
    async fn apply_to(&self, stage: &ExecutionStage);
}

/// Default strategy: does nothing. Hosts that want tracing spans,
/// metrics, or logging around stage execution provide their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInstrumentation;

#[async_trait]
impl InstrumentationStrategy for NoopInstrumentation {
    async fn apply_to(&self, _stage: &ExecutionStage) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::ExecutionPlan;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingInstrumentation(Arc<AtomicUsize>);

    #[async_trait]
    impl InstrumentationStrategy for CountingInstrumentation {
        async fn apply_to(&self, _stage: &ExecutionStage) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn strategy_is_invoked_per_call() {
        let mut builder = ExecutionPlan::builder();
        let group = builder.add_group(crate::executor::test_support::noop_platform());
        let a = builder.add_stage("A", group, vec![]);
        let plan = builder.build();

        let counter = Arc::new(AtomicUsize::new(0));
        let strategy = CountingInstrumentation(counter.clone());
        strategy.apply_to(plan.stage(a).unwrap()).await;
        strategy.apply_to(plan.stage(a).unwrap()).await;

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
