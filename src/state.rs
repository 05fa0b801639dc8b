//! Rolling execution state threaded through a run: per-channel
//! cardinalities observed so far and per-stage timings, merged after
//! every stage execution.

use crate::estimate::CardinalityEstimate;
use crate::plan::StageId;
use std::collections::HashMap;
use std::time::Duration;

/// A mergeable bag of measurements collected while running a plan.
/// Executors return a fresh `ExecutionState` from each `execute` call;
/// the driver folds it into the rolling state with
/// [`ExecutionState::merge`].
#[derive(Debug, Clone, Default)]
pub struct ExecutionState {
    pub channel_cardinalities: HashMap<String, CardinalityEstimate>,
    pub stage_timings: HashMap<StageId, Duration>,
    pub measurements: HashMap<String, f64>,
}

impl ExecutionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds `other` into `self`. Keys present in both sides take
    /// `other`'s value — the incoming measurement is assumed newer.
    pub fn merge(&mut self, other: ExecutionState) {
        self.channel_cardinalities.extend(other.channel_cardinalities);
        self.stage_timings.extend(other.stage_timings);
        self.measurements.extend(other.measurements);
    }

    pub fn record_cardinality(&mut self, channel: impl Into<String>, estimate: CardinalityEstimate) {
        self.channel_cardinalities.insert(channel.into(), estimate);
    }

    pub fn record_timing(&mut self, stage: StageId, elapsed: Duration) {
        self.stage_timings.insert(stage, elapsed);
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.stage_timings.values().map(|d| d.as_millis() as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_last_writer_wins_per_key() {
        let mut state = ExecutionState::new();
        state.record_timing(StageId(0), Duration::from_millis(10));
        state.measurements.insert("rows".into(), 1.0);

        let mut incoming = ExecutionState::new();
        incoming.record_timing(StageId(0), Duration::from_millis(30));
        incoming.measurements.insert("rows".into(), 2.0);
        incoming.record_timing(StageId(1), Duration::from_millis(5));

        state.merge(incoming);

        assert_eq!(state.stage_timings[&StageId(0)], Duration::from_millis(30));
        assert_eq!(state.stage_timings[&StageId(1)], Duration::from_millis(5));
        assert_eq!(state.measurements["rows"], 2.0);
    }

    #[test]
    fn elapsed_ms_sums_all_stage_timings() {
        let mut state = ExecutionState::new();
        state.record_timing(StageId(0), Duration::from_millis(10));
        state.record_timing(StageId(1), Duration::from_millis(15));
        assert_eq!(state.elapsed_ms(), 25);
    }
}
