//! Operator cardinality estimators and the registry that locates them.
//!
//! The operator library itself is out of scope (§1); this module
//! implements the estimator contract operators expose (§4.2) plus a
//! small registry that stands in for "every operator exposes
//! `createCardinalityEstimator`" without requiring a real operator
//! library to exercise it.

use crate::config::Configuration;
use crate::error::{ProgrammerError, Result};
use crate::estimate::CardinalityEstimate;
use std::collections::HashMap;
use std::sync::Arc;

/// Context handed to an estimator when it is invoked. Reserved for the
/// configuration/UDF-selectivity surface estimators may need; kept
/// separate from the input estimates themselves.
pub struct EstimationContext<'a> {
    pub configuration: &'a dyn Configuration,
}

/// Tags estimator variants so an optimizer can introspect without
/// dynamic downcasting (§9, Polymorphism).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorKind {
    DefaultSelectivity,
    CoefficientAware,
    Custom,
}

/// `(context, inputEstimates[]) -> CardinalityEstimate`.
pub trait Estimator: Send + Sync {
    fn kind(&self) -> EstimatorKind;

    fn num_inputs(&self) -> usize;

    fn estimate_unchecked(
        &self,
        ctx: &EstimationContext,
        input_estimates: &[CardinalityEstimate],
    ) -> CardinalityEstimate;
}

/// Validates `inputEstimates.len() == operator.numInputs` before
/// delegating — failure is a programmer error (§4.2, §7), never a soft
/// fallback.
pub fn estimate(
    estimator: &dyn Estimator,
    ctx: &EstimationContext,
    input_estimates: &[CardinalityEstimate],
) -> Result<CardinalityEstimate> {
    if input_estimates.len() != estimator.num_inputs() {
        return Err(ProgrammerError::InputEstimateCountMismatch {
            expected: estimator.num_inputs(),
            actual: input_estimates.len(),
        }
        .into());
    }
    Ok(estimator.estimate_unchecked(ctx, input_estimates))
}

/// Fixed selectivity `s` and confidence `c`: output cardinality is
/// `(floor(lo*s), floor(hi*s), c*inputP)`. The deduplication baseline is
/// `s = 0.7, c = 0.7`.
#[derive(Debug, Clone, Copy)]
pub struct DefaultSelectivityEstimator {
    pub selectivity: f64,
    pub confidence: f64,
}

impl DefaultSelectivityEstimator {
    pub fn new(selectivity: f64, confidence: f64) -> Self {
        Self {
            selectivity,
            confidence,
        }
    }

    /// The deduplication baseline named in §4.2.
    pub fn deduplication_baseline() -> Self {
        Self::new(0.7, 0.7)
    }
}

impl Estimator for DefaultSelectivityEstimator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::DefaultSelectivity
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn estimate_unchecked(
        &self,
        _ctx: &EstimationContext,
        input_estimates: &[CardinalityEstimate],
    ) -> CardinalityEstimate {
        let input = &input_estimates[0];
        CardinalityEstimate::new(
            (input.lower() as f64 * self.selectivity).floor() as u64,
            (input.upper() as f64 * self.selectivity).floor() as u64,
            self.confidence * input.p(),
        )
    }
}

/// Driven by a selectivity [`crate::estimate::Pie`] with an optional
/// `coeff`. When `coeff == 0` this is plain multiplicative selectivity;
/// when `coeff != 0` the upper bound grows quadratically with the input
/// (the input cardinality applied twice with the coefficient), modeling
/// operators whose cost scales with the square of input size (e.g. hash
/// collisions in deduplication). The lower bound stays multiplicative in
/// both branches — resolved this way from the worked example in §8 (S5),
/// since the prose description is ambiguous about the lower bound.
#[derive(Debug, Clone)]
pub struct CoefficientAwareEstimator {
    pub selectivity: crate::estimate::Pie,
}

impl CoefficientAwareEstimator {
    pub fn new(selectivity: crate::estimate::Pie) -> Self {
        Self { selectivity }
    }
}

impl Estimator for CoefficientAwareEstimator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::CoefficientAware
    }

    fn num_inputs(&self) -> usize {
        1
    }

    fn estimate_unchecked(
        &self,
        _ctx: &EstimationContext,
        input_estimates: &[CardinalityEstimate],
    ) -> CardinalityEstimate {
        let input = &input_estimates[0];
        let sel = &self.selectivity;

        let lower = input.lower() as f64 * sel.lower;
        let upper = if sel.coeff != 0.0 {
            input.upper() as f64 * sel.coeff * input.upper() as f64
        } else {
            input.upper() as f64 * sel.upper
        };

        CardinalityEstimate::new(
            lower.floor() as u64,
            upper.floor() as u64,
            input.p() * sel.p,
        )
    }
}

/// Factory an operator exposes: `createCardinalityEstimator(outputIndex,
/// configuration) -> Option<Estimator>` (§4.2, §6).
pub trait CardinalityEstimatorFactory: Send + Sync {
    fn num_outputs(&self) -> usize;

    fn create_cardinality_estimator(
        &self,
        output_index: usize,
        configuration: &dyn Configuration,
    ) -> Result<Option<Arc<dyn Estimator>>>;
}

/// Validates `outputIndex ∈ [0, numOutputs)` before delegating to the
/// operator's factory — out-of-range is a programmer error.
pub fn create_cardinality_estimator(
    factory: &dyn CardinalityEstimatorFactory,
    output_index: usize,
    configuration: &dyn Configuration,
) -> Result<Option<Arc<dyn Estimator>>> {
    if output_index >= factory.num_outputs() {
        return Err(ProgrammerError::OutputIndexOutOfRange {
            index: output_index,
            num_outputs: factory.num_outputs(),
        }
        .into());
    }
    factory.create_cardinality_estimator(output_index, configuration)
}

/// Per-operator factory table. Operators are out of scope for this core
/// (§1); this registry is the extension point other collaborators plug
/// their operator libraries into.
#[derive(Default)]
pub struct EstimatorRegistry {
    factories: HashMap<String, Arc<dyn CardinalityEstimatorFactory>>,
}

impl EstimatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, operator_name: impl Into<String>, factory: Arc<dyn CardinalityEstimatorFactory>) {
        self.factories.insert(operator_name.into(), factory);
    }

    pub fn get(&self, operator_name: &str) -> Option<&Arc<dyn CardinalityEstimatorFactory>> {
        self.factories.get(operator_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfiguration;
    use crate::estimate::Pie;

    fn ctx(config: &MapConfiguration) -> EstimationContext<'_> {
        EstimationContext {
            configuration: config,
        }
    }

    #[test]
    fn default_selectivity_estimator_floors_endpoints() {
        let config = MapConfiguration::new();
        let estimator = DefaultSelectivityEstimator::deduplication_baseline();
        let input = CardinalityEstimate::new(1000, 2001, 0.8);

        let out = estimate(&estimator, &ctx(&config), &[input]).unwrap();
        assert_eq!(out.lower(), 700);
        assert_eq!(out.upper(), 1400); // floor(2001*0.7) = 1400
        assert!((out.p() - 0.56).abs() < 1e-9);
    }

    #[test]
    fn estimate_rejects_wrong_input_count() {
        let config = MapConfiguration::new();
        let estimator = DefaultSelectivityEstimator::deduplication_baseline();
        let err = estimate(&estimator, &ctx(&config), &[]).unwrap_err();
        assert!(err.to_string().contains("input estimates"));
    }

    // S5
    #[test]
    fn coefficient_aware_estimator_multiplicative_branch() {
        let config = MapConfiguration::new();
        let sel = Pie::builder(0.3, 0.5, 0.9).coeff(0.0).build();
        let estimator = CoefficientAwareEstimator::new(sel);
        let input = CardinalityEstimate::new(1000, 2000, 0.8);

        let out = estimate(&estimator, &ctx(&config), &[input]).unwrap();
        assert_eq!(out.lower(), 300);
        assert_eq!(out.upper(), 1000);
        assert!((out.p() - 0.72).abs() < 1e-9);
    }

    #[test]
    fn coefficient_aware_estimator_quadratic_branch() {
        let config = MapConfiguration::new();
        let sel = Pie::builder(0.3, 0.5, 0.9).coeff(0.001).build();
        let estimator = CoefficientAwareEstimator::new(sel);
        let input = CardinalityEstimate::new(1000, 2000, 0.8);

        let out = estimate(&estimator, &ctx(&config), &[input]).unwrap();
        assert_eq!(out.lower(), 300);
        assert_eq!(out.upper(), 4000);
        assert!((out.p() - 0.72).abs() < 1e-9);
    }

    #[test]
    fn registry_is_keyed_by_operator_name() {
        struct Factory;
        impl CardinalityEstimatorFactory for Factory {
            fn num_outputs(&self) -> usize {
                1
            }
            fn create_cardinality_estimator(
                &self,
                _output_index: usize,
                _configuration: &dyn Configuration,
            ) -> Result<Option<Arc<dyn Estimator>>> {
                Ok(Some(Arc::new(DefaultSelectivityEstimator::deduplication_baseline())))
            }
        }

        let mut registry = EstimatorRegistry::new();
        registry.register("dedup", Arc::new(Factory));

        assert!(registry.get("dedup").is_some());
        assert!(registry.get("join").is_none());
    }

    #[test]
    fn output_index_out_of_range_is_a_programmer_error() {
        struct Factory;
        impl CardinalityEstimatorFactory for Factory {
            fn num_outputs(&self) -> usize {
                1
            }
            fn create_cardinality_estimator(
                &self,
                _output_index: usize,
                _configuration: &dyn Configuration,
            ) -> Result<Option<Arc<dyn Estimator>>> {
                Ok(None)
            }
        }

        let config = MapConfiguration::new();
        let err = create_cardinality_estimator(&Factory, 5, &config).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
